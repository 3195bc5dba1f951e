use std::path::{Path, PathBuf};
use std::str::FromStr;

use tempfile::TempDir;

use papercorpus_core::{BackendError, OcrEngine, PageRasterizer};

use crate::text_processing::{repair_line_hyphenation, repair_line_hyphenation_keeping_compounds};

/// Default rasterization resolution.
pub const DEFAULT_DPI: u32 = 300;

/// What to do when recognition fails on a single page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageFailurePolicy {
    /// Use an empty string for the page and record it in [`OcrOutput::failed_pages`].
    #[default]
    Substitute,
    /// Fail the whole document on the first page failure.
    Abort,
}

impl FromStr for PageFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "substitute" => Ok(PageFailurePolicy::Substitute),
            "abort" => Ok(PageFailurePolicy::Abort),
            other => Err(format!(
                "unknown page failure policy '{}' (expected substitute or abort)",
                other
            )),
        }
    }
}

/// A page whose recognition failed under [`PageFailurePolicy::Substitute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    /// 1-based page number.
    pub page: usize,
    pub message: String,
}

/// Result of OCR on one document.
#[derive(Debug, Clone)]
pub struct OcrOutput {
    pub text: String,
    pub page_count: usize,
    pub failed_pages: Vec<PageFailure>,
}

/// Rasterize-then-recognize text extraction for PDFs without a usable text layer.
///
/// Per document: open and rasterize every page into a private temporary
/// directory, recognize each page image in order, concatenate, then repair
/// line-break hyphenation. The temporary directory is owned by a
/// [`TempDir`] and removed when the call returns, whether it succeeds or not.
pub struct OcrTextExtractor {
    rasterizer: Box<dyn PageRasterizer>,
    engine: Box<dyn OcrEngine>,
    dpi: u32,
    page_failure: PageFailurePolicy,
    keep_compound_hyphens: bool,
    /// Parent for per-document scratch directories; system temp dir if `None`.
    work_root: Option<PathBuf>,
}

impl OcrTextExtractor {
    pub fn new(rasterizer: Box<dyn PageRasterizer>, engine: Box<dyn OcrEngine>) -> Self {
        Self {
            rasterizer,
            engine,
            dpi: DEFAULT_DPI,
            page_failure: PageFailurePolicy::default(),
            keep_compound_hyphens: false,
            work_root: None,
        }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.max(1);
        self
    }

    pub fn with_page_failure_policy(mut self, policy: PageFailurePolicy) -> Self {
        self.page_failure = policy;
        self
    }

    /// Keep the hyphen in line-broken compounds (`data-\ndriven`) and after
    /// digits (`Qwen2-\nVL`). Off by default: every break is joined.
    pub fn with_compound_hyphens(mut self, keep: bool) -> Self {
        self.keep_compound_hyphens = keep;
        self
    }

    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    fn scratch_dir(&self) -> Result<TempDir, BackendError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("papercorpus-ocr-");
        let dir = match &self.work_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    /// Run OCR over every page of the PDF at `path`.
    pub fn extract_via_ocr(&self, path: &Path) -> Result<OcrOutput, BackendError> {
        let scratch = self.scratch_dir()?;

        let images = self.rasterizer.rasterize(path, self.dpi, scratch.path())?;
        if images.is_empty() {
            return Err(BackendError::OcrError("document has no pages to OCR".into()));
        }

        let mut pages_text = Vec::with_capacity(images.len());
        let mut failed_pages = Vec::new();
        for (i, image) in images.iter().enumerate() {
            let page = i + 1;
            match self.engine.recognize(image) {
                Ok(text) => pages_text.push(text),
                Err(e) => {
                    tracing::warn!(path = %path.display(), page, error = %e, "page OCR failed");
                    if self.page_failure == PageFailurePolicy::Abort {
                        return Err(BackendError::OcrError(format!("page {}: {}", page, e)));
                    }
                    failed_pages.push(PageFailure {
                        page,
                        message: e.to_string(),
                    });
                    pages_text.push(String::new());
                }
            }
        }

        if failed_pages.len() == images.len() {
            return Err(BackendError::OcrError(format!(
                "all {} pages failed, first error: {}",
                images.len(),
                failed_pages[0].message
            )));
        }

        let joined = pages_text.concat();
        let text = if self.keep_compound_hyphens {
            repair_line_hyphenation_keeping_compounds(&joined)
        } else {
            repair_line_hyphenation(&joined)
        };
        tracing::info!(
            path = %path.display(),
            pages = images.len(),
            failed = failed_pages.len(),
            chars = text.len(),
            "OCR complete"
        );

        Ok(OcrOutput {
            text,
            page_count: images.len(),
            failed_pages,
        })
    }
}
