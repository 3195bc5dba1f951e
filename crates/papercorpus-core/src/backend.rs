use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("failed to render page: {0}")]
    RenderError(String),
    #[error("OCR failed: {0}")]
    OcrError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text-layer extraction backends.
///
/// Implementors return the embedded text of every page in document order;
/// choosing between this and OCR is left to the ingestion orchestrator.
pub trait PdfBackend: Send + Sync {
    /// Extract the full text content of a PDF file.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;

    /// Number of pages in the PDF.
    fn page_count(&self, path: &Path) -> Result<usize, BackendError>;
}

/// Renders PDF pages to bitmap images.
pub trait PageRasterizer: Send + Sync {
    /// Render every page of `path` at `dpi` into `out_dir`.
    ///
    /// Returns the image paths in page order. The caller owns `out_dir` and
    /// its cleanup.
    fn rasterize(&self, path: &Path, dpi: u32, out_dir: &Path)
    -> Result<Vec<PathBuf>, BackendError>;
}

/// Recognizes text in a single page image.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &Path) -> Result<String, BackendError>;
}
