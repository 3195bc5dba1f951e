//! Hand-rolled capability mocks shared by the ingest integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use papercorpus_core::{BackendError, OcrEngine, PageRasterizer, PdfBackend, display_name};
use papercorpus_ocr::OcrTextExtractor;

/// A text layer long enough to pass the default escalation threshold.
pub fn body(word: &str) -> String {
    format!("{} ", word).repeat(40)
}

/// Native backend answering from an in-memory table keyed by file name.
#[derive(Default, Clone)]
pub struct MockPdf {
    texts: HashMap<String, Result<String, String>>,
    pages: HashMap<String, usize>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockPdf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, text: impl Into<String>) -> Self {
        self.texts.insert(name.to_string(), Ok(text.into()));
        self
    }

    pub fn broken(mut self, name: &str, message: &str) -> Self {
        self.texts.insert(name.to_string(), Err(message.to_string()));
        self
    }

    pub fn pages(mut self, name: &str, pages: usize) -> Self {
        self.pages.insert(name.to_string(), pages);
        self
    }

    pub fn called(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl PdfBackend for MockPdf {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let name = display_name(path);
        self.calls.lock().unwrap().push(name.clone());
        match self.texts.get(&name) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(message)) => Err(BackendError::OpenError(message.clone())),
            None => Err(BackendError::OpenError(format!("{}: no such file", name))),
        }
    }

    fn page_count(&self, path: &Path) -> Result<usize, BackendError> {
        let name = display_name(path);
        self.pages
            .get(&name)
            .copied()
            .ok_or_else(|| BackendError::OpenError(format!("{}: no such file", name)))
    }
}

/// Rasterizer that "renders" each page by writing its intended OCR text into
/// the image file. Documents without an entry fail to render.
#[derive(Default, Clone)]
pub struct MockScanner {
    pages: HashMap<String, Vec<String>>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan(mut self, name: &str, pages: &[&str]) -> Self {
        self.pages.insert(
            name.to_string(),
            pages.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    pub fn called(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// An OCR extractor over this scanner and [`EchoEngine`].
    pub fn extractor(&self) -> OcrTextExtractor {
        OcrTextExtractor::new(Box::new(self.clone()), Box::new(EchoEngine))
    }
}

impl PageRasterizer for MockScanner {
    fn rasterize(
        &self,
        path: &Path,
        _dpi: u32,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, BackendError> {
        let name = display_name(path);
        self.calls.lock().unwrap().push(name.clone());
        let pages = self
            .pages
            .get(&name)
            .ok_or_else(|| BackendError::RenderError(format!("{}: cannot render", name)))?;
        let mut images = Vec::new();
        for (i, content) in pages.iter().enumerate() {
            let image = out_dir.join(format!("page-{:04}.png", i + 1));
            std::fs::write(&image, content)?;
            images.push(image);
        }
        Ok(images)
    }
}

/// Page contents starting with this marker make [`EchoEngine`] fail.
pub const UNREADABLE: &str = "!UNREADABLE";

/// "Recognizes" a page by reading back what [`MockScanner`] wrote.
pub struct EchoEngine;

impl OcrEngine for EchoEngine {
    fn recognize(&self, image: &Path) -> Result<String, BackendError> {
        let content = std::fs::read_to_string(image)?;
        if content.starts_with(UNREADABLE) {
            return Err(BackendError::OcrError("unreadable page".into()));
        }
        Ok(content)
    }
}
