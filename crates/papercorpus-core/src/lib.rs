use std::path::{Path, PathBuf};

pub mod backend;
pub mod config_file;
pub mod error;
pub mod metadata;
pub mod text_utils;

// Re-export for convenience
pub use backend::{BackendError, OcrEngine, PageRasterizer, PdfBackend};
pub use error::{CorpusError, FailureKind, MetadataFormatError};
pub use metadata::{FilenameMetadata, refid_of, year_of, years_of};
pub use text_utils::{expand_ligatures, non_whitespace_chars};

/// How a document's text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOrigin {
    /// Read from the PDF's embedded text layer.
    Native,
    /// Recognized from rasterized page images.
    Ocr,
    /// Reloaded from a persisted `.txt` file.
    Persisted,
}

impl TextOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextOrigin::Native => "native",
            TextOrigin::Ocr => "ocr",
            TextOrigin::Persisted => "persisted",
        }
    }
}

/// A single ingested article.
///
/// Built once per ingestion or load run and never mutated afterwards; `text`
/// is the artifact downstream analysis consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub source_filename: PathBuf,
    pub year: u16,
    pub ref_id: String,
    pub origin: TextOrigin,
}

impl Document {
    /// Build a document, deriving `year` and `ref_id` from `source_filename`.
    pub fn from_source(
        text: String,
        source_filename: impl Into<PathBuf>,
        origin: TextOrigin,
    ) -> Result<Self, MetadataFormatError> {
        let source_filename = source_filename.into();
        let meta = FilenameMetadata::parse(&source_filename)?;
        Ok(Self {
            text,
            source_filename,
            year: meta.year,
            ref_id: meta.ref_id,
            origin,
        })
    }

    /// Number of non-whitespace characters in the text.
    pub fn char_count(&self) -> usize {
        non_whitespace_chars(&self.text)
    }
}

/// A per-document failure recorded in a batch manifest.
#[derive(Debug)]
pub struct DocumentFailure {
    /// Position of the document in the batch input (or directory listing).
    pub index: usize,
    pub filename: PathBuf,
    pub error: CorpusError,
}

impl DocumentFailure {
    pub fn new(index: usize, filename: impl Into<PathBuf>, error: impl Into<CorpusError>) -> Self {
        Self {
            index,
            filename: filename.into(),
            error: error.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.error.kind()
    }

    /// The base name of the failed file, for display.
    pub fn display_name(&self) -> String {
        display_name(&self.filename)
    }
}

/// Outcome of extracting a single document.
pub type ExtractionResult = Result<Document, DocumentFailure>;

/// File name of `path` (lossy), falling back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Sort documents by publication year, keeping listing order among equal years.
pub fn sort_by_year(documents: &mut [Document]) {
    documents.sort_by_key(|d| d.year);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_from_source_parses_metadata() {
        let doc = Document::from_source(
            "body".to_string(),
            "pdfs/A1-title-1999.pdf",
            TextOrigin::Native,
        )
        .unwrap();
        assert_eq!(doc.year, 1999);
        assert_eq!(doc.ref_id, "A1");
        assert_eq!(doc.source_filename, PathBuf::from("pdfs/A1-title-1999.pdf"));
    }

    #[test]
    fn document_from_source_rejects_bad_name() {
        let err = Document::from_source("x".into(), "notes.pdf", TextOrigin::Native).unwrap_err();
        assert_eq!(err.filename, "notes.pdf");
    }

    #[test]
    fn sort_by_year_is_stable() {
        let mut docs: Vec<Document> = ["C3-c-2005.txt", "A1-a-1999.txt", "B2-b-2005.txt"]
            .iter()
            .map(|n| Document::from_source(String::new(), *n, TextOrigin::Persisted).unwrap())
            .collect();
        sort_by_year(&mut docs);
        let ids: Vec<&str> = docs.iter().map(|d| d.ref_id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "C3", "B2"]);
    }
}
