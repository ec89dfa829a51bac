//! Page-by-page rendering of PDF output

use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::PreviewError;
use crate::export::pdf::find_on_path;

/// Rendering resolution at zoom 1.0.
pub const BASE_DPI: f32 = 150.0;

/// One rasterized page.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// 1-based
    pub number: usize,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Turns individual PDF pages into images.
pub trait PageRasterizer: Send + Sync + 'static {
    fn page_count(&self, pdf: &[u8]) -> Result<usize, PreviewError>;

    fn render_page(&self, pdf: &[u8], page: usize, dpi: u32) -> Result<RenderedPage, PreviewError>;
}

/// Poppler command-line tools (`pdfinfo`, `pdftoppm`).
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    pdfinfo: PathBuf,
    pdftoppm: PathBuf,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self {
            pdfinfo: find_on_path("pdfinfo").unwrap_or_else(|| PathBuf::from("pdfinfo")),
            pdftoppm: find_on_path("pdftoppm").unwrap_or_else(|| PathBuf::from("pdftoppm")),
        }
    }
}

fn write_temp_pdf(pdf: &[u8]) -> Result<tempfile::NamedTempFile, PreviewError> {
    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile()?;
    std::io::Write::write_all(&mut file, pdf)?;
    Ok(file)
}

impl PageRasterizer for PdftoppmRasterizer {
    fn page_count(&self, pdf: &[u8]) -> Result<usize, PreviewError> {
        let file = write_temp_pdf(pdf)?;
        let output = Command::new(&self.pdfinfo).arg(file.path()).output()?;
        if !output.status.success() {
            return Err(PreviewError::Pdf(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        let info = String::from_utf8_lossy(&output.stdout);
        info.lines()
            .find_map(|line| line.strip_prefix("Pages:"))
            .and_then(|count| count.trim().parse().ok())
            .ok_or_else(|| PreviewError::Pdf("pdfinfo reported no page count".to_string()))
    }

    fn render_page(&self, pdf: &[u8], page: usize, dpi: u32) -> Result<RenderedPage, PreviewError> {
        let file = write_temp_pdf(pdf)?;
        let outdir = tempfile::tempdir()?;
        let prefix = outdir.path().join("page");
        let output = Command::new(&self.pdftoppm)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg("-singlefile")
            .arg(file.path())
            .arg(&prefix)
            .output()?;
        if !output.status.success() {
            return Err(PreviewError::Page {
                page,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let png = std::fs::read(prefix.with_extension("png"))?;
        let decoded = image::load_from_memory(&png).map_err(|err| PreviewError::Page {
            page,
            reason: err.to_string(),
        })?;
        Ok(RenderedPage {
            number: page,
            width: decoded.width(),
            height: decoded.height(),
            png,
        })
    }
}

/// Render every page concurrently at `zoom` and return them in page order.
///
/// All page tasks are awaited; the first failure fails the whole render.
pub async fn render_pages(
    rasterizer: Arc<dyn PageRasterizer>,
    pdf: Arc<[u8]>,
    zoom: f32,
) -> Result<Vec<RenderedPage>, PreviewError> {
    let count = {
        let rasterizer = Arc::clone(&rasterizer);
        let pdf = Arc::clone(&pdf);
        tokio::task::spawn_blocking(move || rasterizer.page_count(&pdf))
            .await
            .map_err(|err| PreviewError::Task(err.to_string()))??
    };
    let dpi = (BASE_DPI * zoom).round().max(1.0) as u32;
    tracing::debug!(pages = count, dpi, "rendering pdf pages");

    let mut tasks = JoinSet::new();
    for page in 1..=count {
        let rasterizer = Arc::clone(&rasterizer);
        let pdf = Arc::clone(&pdf);
        tasks.spawn_blocking(move || rasterizer.render_page(&pdf, page, dpi));
    }

    let mut pages = Vec::with_capacity(count);
    while let Some(joined) = tasks.join_next().await {
        let page = joined.map_err(|err| PreviewError::Task(err.to_string()))??;
        pages.push(page);
    }
    pages.sort_by_key(|page| page.number);
    Ok(pages)
}
