//! Batch extraction: native text layer first, OCR when the policy says so,
//! optional persistence to `<output_dir>/<stem>.txt`.
//!
//! One document's failure never stops the batch. Every failure lands in the
//! [`BatchReport`] manifest and is also emitted as an [`IngestEvent`] as soon
//! as it happens.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use papercorpus_core::{
    BackendError, CorpusError, Document, DocumentFailure, ExtractionResult, FailureKind,
    FilenameMetadata, PdfBackend, TextOrigin, display_name, non_whitespace_chars,
};
use papercorpus_ocr::OcrTextExtractor;
use rayon::prelude::*;

use crate::policy::{EscalationReason, ExtractionPolicy, OcrMode};

/// Progress notifications emitted while a batch runs.
///
/// With more than one worker, events from different documents interleave.
#[derive(Debug, Clone)]
pub enum IngestEvent {
    Started {
        index: usize,
        total: usize,
        filename: String,
    },
    Escalated {
        index: usize,
        filename: String,
        native_chars: usize,
        reason: EscalationReason,
    },
    OcrPageFailed {
        index: usize,
        filename: String,
        page: usize,
        message: String,
    },
    Persisted {
        index: usize,
        filename: String,
        path: PathBuf,
    },
    Finished {
        index: usize,
        filename: String,
        origin: TextOrigin,
        chars: usize,
    },
    Failed {
        index: usize,
        filename: String,
        kind: FailureKind,
        message: String,
    },
}

/// Outcome of a batch: extracted documents plus the failure manifest, both
/// in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub documents: Vec<Document>,
    pub failures: Vec<DocumentFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.text.as_str()).collect()
    }

    pub fn years(&self) -> Vec<u16> {
        self.documents.iter().map(|d| d.year).collect()
    }

    pub fn ref_ids(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.ref_id.as_str()).collect()
    }
}

/// Per-document result before it is folded into the report.
struct Processed {
    result: ExtractionResult,
    /// Set when the document was extracted but writing its `.txt` failed.
    persist_failure: Option<DocumentFailure>,
}

pub struct ExtractionOrchestrator {
    native: Box<dyn PdfBackend>,
    ocr: Option<OcrTextExtractor>,
    policy: ExtractionPolicy,
    workers: usize,
}

impl ExtractionOrchestrator {
    /// An orchestrator with native extraction only. Add OCR with [`with_ocr`](Self::with_ocr).
    pub fn new(native: Box<dyn PdfBackend>) -> Self {
        Self {
            native,
            ocr: None,
            policy: ExtractionPolicy::default(),
            workers: 1,
        }
    }

    pub fn with_ocr(mut self, ocr: OcrTextExtractor) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_policy(mut self, policy: ExtractionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Number of documents processed concurrently. `1` (the default) is strictly sequential.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract every PDF in `pdf_paths`, optionally persisting each text to
    /// `output_dir/<stem>.txt`.
    pub fn process<P: AsRef<Path> + Sync>(
        &self,
        pdf_paths: &[P],
        output_dir: &Path,
        persist: bool,
    ) -> BatchReport {
        self.process_with_progress(pdf_paths, output_dir, persist, &|_| {})
    }

    /// [`process`](Self::process) with a progress observer.
    pub fn process_with_progress<P: AsRef<Path> + Sync>(
        &self,
        pdf_paths: &[P],
        output_dir: &Path,
        persist: bool,
        progress: &(dyn Fn(IngestEvent) + Send + Sync),
    ) -> BatchReport {
        if persist && let Err(e) = std::fs::create_dir_all(output_dir) {
            // Each write below fails and is reported per document.
            tracing::warn!(dir = %output_dir.display(), error = %e, "cannot create output directory");
        }

        let processed = self.run(pdf_paths, output_dir, persist, progress);

        let mut report = BatchReport::default();
        for p in processed {
            match p.result {
                Ok(doc) => report.documents.push(doc),
                Err(failure) => report.failures.push(failure),
            }
            if let Some(failure) = p.persist_failure {
                report.failures.push(failure);
            }
        }

        tracing::info!(
            total = pdf_paths.len(),
            extracted = report.documents.len(),
            failures = report.failures.len(),
            "batch complete"
        );
        report
    }

    fn run<P: AsRef<Path> + Sync>(
        &self,
        pdf_paths: &[P],
        output_dir: &Path,
        persist: bool,
        progress: &(dyn Fn(IngestEvent) + Send + Sync),
    ) -> Vec<Processed> {
        let total = pdf_paths.len();
        let workers = self.workers.min(total).max(1);
        let process = |(i, p): (usize, &P)| {
            self.process_one(i, total, p.as_ref(), output_dir, persist, progress)
        };

        if workers == 1 {
            return pdf_paths.iter().enumerate().map(process).collect();
        }

        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            // Indexed par_iter keeps input order in the collected Vec
            Ok(pool) => pool.install(|| pdf_paths.par_iter().enumerate().map(process).collect()),
            Err(e) => {
                tracing::warn!(workers, error = %e, "cannot start worker pool, running sequentially");
                pdf_paths.iter().enumerate().map(process).collect()
            }
        }
    }

    fn process_one(
        &self,
        index: usize,
        total: usize,
        path: &Path,
        output_dir: &Path,
        persist: bool,
        progress: &(dyn Fn(IngestEvent) + Send + Sync),
    ) -> Processed {
        let filename = display_name(path);
        tracing::debug!(index, total, path = %path.display(), "processing");
        progress(IngestEvent::Started {
            index,
            total,
            filename: filename.clone(),
        });

        let result = self
            .extract_one(index, path, &filename, progress)
            .map_err(|error| {
                report_failure(index, &filename, &error, progress);
                DocumentFailure::new(index, path, error)
            });

        let mut persist_failure = None;
        if let Ok(doc) = &result {
            if persist {
                match persist_text(doc, output_dir) {
                    Ok(target) => progress(IngestEvent::Persisted {
                        index,
                        filename: filename.clone(),
                        path: target,
                    }),
                    Err(error) => {
                        report_failure(index, &filename, &error, progress);
                        persist_failure = Some(DocumentFailure::new(index, path, error));
                    }
                }
            }
            progress(IngestEvent::Finished {
                index,
                filename,
                origin: doc.origin,
                chars: doc.char_count(),
            });
        }

        Processed {
            result,
            persist_failure,
        }
    }

    fn extract_one(
        &self,
        index: usize,
        path: &Path,
        filename: &str,
        progress: &(dyn Fn(IngestEvent) + Send + Sync),
    ) -> Result<Document, CorpusError> {
        // Metadata first: a file that cannot be catalogued is not worth an OCR pass
        let meta = FilenameMetadata::parse(path)?;
        let (text, origin) = self.select_text(index, path, filename, progress)?;
        Ok(Document {
            text,
            source_filename: path.to_path_buf(),
            year: meta.year,
            ref_id: meta.ref_id,
            origin,
        })
    }

    fn select_text(
        &self,
        index: usize,
        path: &Path,
        filename: &str,
        progress: &(dyn Fn(IngestEvent) + Send + Sync),
    ) -> Result<(String, TextOrigin), CorpusError> {
        let native = match self.policy.mode {
            OcrMode::Force => None,
            OcrMode::Auto | OcrMode::Never => Some(self.native.extract_text(path)),
        };

        let escalation = self.escalation(path, native.as_ref());
        let (Some(reason), Some(ocr)) = (escalation, self.ocr.as_ref()) else {
            return match native {
                Some(Ok(text)) => {
                    if escalation.is_some() {
                        tracing::warn!(path = %path.display(), "text layer looks insufficient but OCR is not configured");
                    }
                    Ok((text, TextOrigin::Native))
                }
                Some(Err(e)) => Err(CorpusError::extraction(path, e)),
                None => Err(CorpusError::extraction(
                    path,
                    BackendError::OcrError("OCR forced but no OCR engine is configured".into()),
                )),
            };
        };

        let native_chars = match &native {
            Some(Ok(text)) => non_whitespace_chars(text),
            _ => 0,
        };
        tracing::info!(path = %path.display(), native_chars, reason = reason.as_str(), "escalating to OCR");
        progress(IngestEvent::Escalated {
            index,
            filename: filename.to_string(),
            native_chars,
            reason,
        });

        match ocr.extract_via_ocr(path) {
            Ok(output) => {
                for failed in output.failed_pages {
                    progress(IngestEvent::OcrPageFailed {
                        index,
                        filename: filename.to_string(),
                        page: failed.page,
                        message: failed.message,
                    });
                }
                match native {
                    Some(Ok(text)) if !self.policy.prefer_ocr(&text, &output.text) => {
                        Ok((text, TextOrigin::Native))
                    }
                    _ => Ok((output.text, TextOrigin::Ocr)),
                }
            }
            Err(ocr_err) => match native {
                Some(Ok(text)) if native_chars > 0 => {
                    tracing::warn!(path = %path.display(), error = %ocr_err, "OCR failed, keeping thin text layer");
                    Ok((text, TextOrigin::Native))
                }
                Some(Err(native_err)) => {
                    tracing::debug!(path = %path.display(), error = %ocr_err, "OCR fallback failed too");
                    Err(CorpusError::extraction(path, native_err))
                }
                _ => Err(CorpusError::extraction(path, ocr_err)),
            },
        }
    }

    fn escalation(
        &self,
        path: &Path,
        native: Option<&Result<String, BackendError>>,
    ) -> Option<EscalationReason> {
        match (self.policy.mode, native) {
            (OcrMode::Force, _) | (_, None) => Some(EscalationReason::Forced),
            (OcrMode::Never, _) => None,
            (OcrMode::Auto, Some(Err(_))) => self
                .policy
                .fallback_on_error
                .then_some(EscalationReason::NativeError),
            (OcrMode::Auto, Some(Ok(text))) => {
                let pages = match self.policy.min_chars_per_page {
                    Some(_) => self.native.page_count(path).ok(),
                    None => None,
                };
                self.policy
                    .is_insufficient(text, pages)
                    .then_some(EscalationReason::InsufficientText)
            }
        }
    }
}

fn report_failure(
    index: usize,
    filename: &str,
    error: &CorpusError,
    progress: &(dyn Fn(IngestEvent) + Send + Sync),
) {
    tracing::warn!(index, filename, kind = %error.kind(), error = %error, "document failed");
    progress(IngestEvent::Failed {
        index,
        filename: filename.to_string(),
        kind: error.kind(),
        message: error.to_string(),
    });
}

/// Write `doc.text` to `<output_dir>/<source stem>.txt`, replacing any existing file.
pub fn persist_text(doc: &Document, output_dir: &Path) -> Result<PathBuf, CorpusError> {
    let stem = doc.source_filename.file_stem().ok_or_else(|| {
        CorpusError::io(
            &doc.source_filename,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "source has no file name"),
        )
    })?;
    // Push rather than with_extension: stems may contain dots
    let mut name = OsString::from(stem);
    name.push(".txt");
    let target = output_dir.join(name);

    std::fs::write(&target, &doc.text).map_err(|e| CorpusError::io(&target, e))?;
    tracing::debug!(path = %target.display(), bytes = doc.text.len(), "persisted text");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, text: &str) -> Document {
        Document::from_source(text.to_string(), name, TextOrigin::Native).unwrap()
    }

    #[test]
    fn persist_uses_stem_and_txt_extension() {
        let dir = tempfile::tempdir().unwrap();
        let target = persist_text(&doc("pdfs/A1-title-1999.pdf", "hello"), dir.path()).unwrap();
        assert_eq!(target, dir.path().join("A1-title-1999.txt"));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello");
    }

    #[test]
    fn persist_keeps_dots_in_stem() {
        let dir = tempfile::tempdir().unwrap();
        let target = persist_text(&doc("A1-v1.2-1999.pdf", "x"), dir.path()).unwrap();
        assert_eq!(target, dir.path().join("A1-v1.2-1999.txt"));
    }

    #[test]
    fn persist_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("A1-t-1999.txt"), "stale contents").unwrap();
        persist_text(&doc("A1-t-1999.pdf", "fresh"), dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("A1-t-1999.txt")).unwrap(),
            "fresh"
        );
    }

    #[test]
    fn persist_into_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = persist_text(&doc("A1-t-1999.pdf", "x"), &dir.path().join("a/b")).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Io);
    }
}
