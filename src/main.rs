//! ieeepaper - IEEE paper composition and export
//!
//! Command-line front end: validate and repair editor JSON, export it as
//! DOCX, PDF or LaTeX, or look at it in the terminal.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ieeepaper::ansi::{AnsiOptions, ColorDepth, render_layout};
use ieeepaper::document::{Document, load_document};
use ieeepaper::export::SofficeConverter;
use ieeepaper::format::outline;
use ieeepaper::{ExportFormat, Exporter, StyleSheet, sanitize_document, validate_document};

#[derive(Parser)]
#[command(
    name = "ieeepaper",
    version,
    about = "Compose academic papers and export them in IEEE conference format",
    after_help = "EXAMPLES:\n  \
                  ieeepaper validate paper.json\n  \
                  ieeepaper export paper.json --format docx -o paper.docx\n  \
                  ieeepaper export paper.json --format latex\n  \
                  ieeepaper preview paper.json\n  \
                  ieeepaper init-style"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Style sheet to use instead of the configured one
    #[arg(long, global = true)]
    style: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check tables and block ids; prints the report as JSON
    Validate { input: PathBuf },

    /// Repair table shapes and encodings
    Sanitize {
        input: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the paper to a file
    Export {
        input: PathBuf,
        /// Output path (defaults to a name derived from the title)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format (defaults to the paper's own setting)
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,
        /// Export tables exactly as given
        #[arg(long)]
        no_sanitize: bool,
    },

    /// Show the laid-out paper in the terminal
    Preview {
        input: PathBuf,
        /// Color depth for headings and captions
        #[arg(long, value_enum, default_value_t = ColorDepth::Auto)]
        color: ColorDepth,
        /// Wrap width (defaults to the terminal width)
        #[arg(long)]
        width: Option<usize>,
    },

    /// Print the HTML mirror of the DOCX rendering
    Html {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List section and subsection labels
    Outline {
        input: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default IEEE style sheet to the config directory
    InitStyle,
}

fn load_style(path: Option<&Path>) -> Result<StyleSheet> {
    match path {
        Some(path) => StyleSheet::load_from(path),
        None => StyleSheet::load(),
    }
}

async fn read_input(path: &Path) -> Result<Document> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }
    load_document(path).await
}

fn write_or_print(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Validate { input } => {
            let document = read_input(&input).await?;
            let report = validate_document(&document);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Sanitize { input, output } => {
            let document = read_input(&input).await?;
            let repaired = sanitize_document(&document);
            write_or_print(output.as_deref(), &serde_json::to_string_pretty(&repaired)?)?;
        }
        Commands::Export {
            input,
            output,
            format,
            no_sanitize,
        } => {
            let document = read_input(&input).await?;
            let document = if no_sanitize { document } else { sanitize_document(&document) };
            let format = format.unwrap_or(document.settings.export_format);

            let mut exporter = Exporter::new(load_style(cli.style.as_deref())?);
            if format == ExportFormat::Pdf {
                let Some(converter) = SofficeConverter::detect() else {
                    bail!("PDF export needs LibreOffice (soffice) on PATH");
                };
                exporter = exporter.with_pdf_converter(std::sync::Arc::new(converter));
            }

            let exported = tokio::task::spawn_blocking(move || exporter.export(&document, format))
                .await
                .context("Export task failed")??;

            let path = output.unwrap_or_else(|| PathBuf::from(&exported.filename));
            tokio::fs::write(&path, &exported.bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            let dir = path.parent().unwrap_or_else(|| Path::new(""));
            for asset in &exported.assets {
                let asset_path = dir.join(&asset.name);
                tokio::fs::write(&asset_path, &asset.bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", asset_path.display()))?;
            }
            println!(
                "Wrote {} ({} bytes, {})",
                path.display(),
                exported.len(),
                exported.media_type()
            );
        }
        Commands::Preview { input, color, width } => {
            let document = sanitize_document(&read_input(&input).await?);
            let exporter = Exporter::new(load_style(cli.style.as_deref())?);
            let paper = exporter.layout(&document)?;
            let mut options = AnsiOptions {
                color_depth: color,
                ..AnsiOptions::default()
            };
            if let Some(width) = width {
                options.terminal_width = width;
            }
            print!("{}", render_layout(&paper, &options));
        }
        Commands::Html { input, output } => {
            let document = sanitize_document(&read_input(&input).await?);
            let exporter = Exporter::new(load_style(cli.style.as_deref())?);
            write_or_print(output.as_deref(), &exporter.html(&document)?)?;
        }
        Commands::Outline { input, json } => {
            let document = read_input(&input).await?;
            let entries = outline(&document);
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in entries {
                    println!("{}{}", "  ".repeat(entry.level.saturating_sub(1) as usize), entry.label);
                }
            }
        }
        Commands::InitStyle => match StyleSheet::init_default()? {
            Some(path) => println!("Wrote default style sheet to {}", path.display()),
            None => bail!("No configuration directory is available on this system"),
        },
    }

    Ok(ExitCode::SUCCESS)
}
