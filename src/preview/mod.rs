//! Preview pipeline
//!
//! Turns an exported binary back into something viewable. Paginated output
//! (PDF) is rasterized page by page; flow output (DOCX) is converted into an
//! HTML fragment once and zoomed with a CSS transform.
//!
//! Every load or re-render takes a new generation number. Results are only
//! published while their generation is still the latest, so a superseded
//! render can never show its pages for a newer document.

pub mod flow;
pub mod paged;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use quick_xml::escape::escape;
use tokio::sync::watch;

use crate::ExportFormat;
use crate::error::PreviewError;
use crate::export::ExportedDocument;

pub use paged::{PageRasterizer, PdftoppmRasterizer, RenderedPage};

pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 4.0;

/// How a binary is previewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Paged,
    Flow,
    Source,
}

impl From<ExportFormat> for PreviewKind {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Pdf => PreviewKind::Paged,
            ExportFormat::Docx => PreviewKind::Flow,
            ExportFormat::Latex => PreviewKind::Source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewContent {
    Pages { zoom: f32, pages: Vec<RenderedPage> },
    Flow { zoom: f32, fragment: Arc<str> },
}

impl PreviewContent {
    pub fn zoom(&self) -> f32 {
        match self {
            PreviewContent::Pages { zoom, .. } | PreviewContent::Flow { zoom, .. } => *zoom,
        }
    }

    /// Flow content wrapped at its zoom factor; `None` for pages.
    pub fn html(&self) -> Option<String> {
        match self {
            PreviewContent::Flow { zoom, fragment } => Some(flow::zoomed(fragment, *zoom)),
            PreviewContent::Pages { .. } => None,
        }
    }
}

/// Observable preview state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PreviewState {
    #[default]
    Idle,
    Loading,
    Error(String),
    Ready(Arc<PreviewContent>),
}

impl PreviewState {
    pub fn is_ready(&self) -> bool {
        matches!(self, PreviewState::Ready(_))
    }
}

#[derive(Clone)]
struct Source {
    bytes: Arc<[u8]>,
    kind: PreviewKind,
}

pub struct Previewer {
    rasterizer: Arc<dyn PageRasterizer>,
    state: watch::Sender<PreviewState>,
    generation: AtomicU64,
    zoom: Mutex<f32>,
    source: Mutex<Option<Source>>,
}

impl Previewer {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>) -> Self {
        let (state, _) = watch::channel(PreviewState::Idle);
        Self {
            rasterizer,
            state,
            generation: AtomicU64::new(0),
            zoom: Mutex::new(1.0),
            source: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PreviewState {
        self.state.borrow().clone()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom.lock().map(|zoom| *zoom).unwrap_or(1.0)
    }

    /// Preview an export result.
    pub async fn load_exported(&self, exported: &ExportedDocument) -> PreviewState {
        self.load(exported.bytes.clone(), exported.format.into()).await
    }

    /// Load a new binary, replacing whatever was shown before.
    ///
    /// Returns the state as of this call's completion. When a newer load or
    /// zoom started meanwhile, that is the newer request's state.
    pub async fn load(&self, bytes: Vec<u8>, kind: PreviewKind) -> PreviewState {
        let source = Source {
            bytes: Arc::from(bytes),
            kind,
        };
        match self.claim(Some(source)) {
            Some((generation, source, zoom)) => self.render(generation, source, zoom).await,
            None => self.state(),
        }
    }

    /// Change the zoom factor, clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    ///
    /// Flow content is only re-wrapped; paged content is rendered again.
    pub async fn set_zoom(&self, zoom: f32) -> PreviewState {
        let zoom = if zoom.is_finite() { zoom.clamp(MIN_ZOOM, MAX_ZOOM) } else { 1.0 };
        if let Ok(mut current) = self.zoom.lock() {
            *current = zoom;
        }

        // Ready is only ever the latest generation's content, and every new
        // generation leaves Ready under this same lock.
        let rewrapped = self.state.send_if_modified(|current| {
            let PreviewState::Ready(content) = current else {
                return false;
            };
            let PreviewContent::Flow { fragment, .. } = content.as_ref() else {
                return false;
            };
            let content = PreviewContent::Flow {
                zoom,
                fragment: Arc::clone(fragment),
            };
            self.generation.fetch_add(1, Ordering::SeqCst);
            *current = PreviewState::Ready(Arc::new(content));
            true
        });
        if rewrapped {
            return self.state();
        }

        match self.claim(None) {
            Some((generation, source, zoom)) => self.render(generation, source, zoom).await,
            None => self.state(),
        }
    }

    /// Install `replacement` (or keep the current source) and take a new
    /// generation for it while holding the source lock, so generations are
    /// ordered the same way as the sources they render.
    fn claim(&self, replacement: Option<Source>) -> Option<(u64, Source, f32)> {
        let mut current = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(source) = replacement {
            *current = Some(source);
        }
        let source = current.clone()?;
        let generation = self.begin();
        Some((generation, source, self.zoom()))
    }

    /// Take a new generation and show the loading state.
    fn begin(&self) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = PreviewState::Loading;
        });
        generation
    }

    /// Publish `state` only if `generation` is still the latest.
    fn publish(&self, generation: u64, state: PreviewState) -> bool {
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) == generation {
                *current = state;
                true
            } else {
                false
            }
        })
    }

    async fn render(&self, generation: u64, source: Source, zoom: f32) -> PreviewState {
        let result = match source.kind {
            PreviewKind::Paged => paged::render_pages(Arc::clone(&self.rasterizer), Arc::clone(&source.bytes), zoom)
                .await
                .map(|pages| PreviewContent::Pages { zoom, pages }),
            PreviewKind::Flow => {
                let bytes = Arc::clone(&source.bytes);
                tokio::task::spawn_blocking(move || flow::docx_to_html(&bytes))
                    .await
                    .map_err(|err| PreviewError::Task(err.to_string()))
                    .and_then(|converted| converted)
                    .map(|html| PreviewContent::Flow {
                        zoom,
                        fragment: Arc::from(html),
                    })
            }
            PreviewKind::Source => source_fragment(&source.bytes).map(|html| PreviewContent::Flow {
                zoom,
                fragment: Arc::from(html),
            }),
        };

        let state = match result {
            Ok(content) => PreviewState::Ready(Arc::new(content)),
            Err(err) => {
                tracing::warn!(error = %err, "preview failed");
                PreviewState::Error(err.to_string())
            }
        };
        if !self.publish(generation, state) {
            tracing::debug!(generation, "discarded superseded preview render");
        }
        self.state()
    }
}

fn source_fragment(bytes: &[u8]) -> Result<String, PreviewError> {
    if bytes.is_empty() {
        return Err(PreviewError::Empty);
    }
    let text = String::from_utf8_lossy(bytes);
    Ok(format!("<pre class=\"source\">{}</pre>\n", escape(text.as_ref())))
}
