//! Tests for [`OcrTextExtractor`] using hand-rolled rasterizer/engine mocks.
//!
//! The fake rasterizer writes each page's intended OCR text into the "image"
//! file, and the fake engine reads it back, so no real rendering or
//! recognition is involved.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use papercorpus_core::{BackendError, OcrEngine, PageRasterizer};
use papercorpus_ocr::{OcrTextExtractor, PageFailurePolicy};

/// Page contents starting with this marker make the fake engine fail.
const FAIL: &str = "!FAIL";

struct FakeRasterizer {
    pages: Vec<&'static str>,
    /// Scratch directory the extractor handed us, for cleanup assertions.
    seen_dir: Arc<Mutex<Option<PathBuf>>>,
    seen_dpi: Arc<Mutex<Option<u32>>>,
}

impl PageRasterizer for FakeRasterizer {
    fn rasterize(
        &self,
        _path: &Path,
        dpi: u32,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, BackendError> {
        *self.seen_dir.lock().unwrap() = Some(out_dir.to_path_buf());
        *self.seen_dpi.lock().unwrap() = Some(dpi);
        let mut images = Vec::new();
        for (i, content) in self.pages.iter().enumerate() {
            let image = out_dir.join(format!("page-{:04}.png", i + 1));
            std::fs::write(&image, content)?;
            images.push(image);
        }
        Ok(images)
    }
}

struct BrokenRasterizer {
    seen_dir: Arc<Mutex<Option<PathBuf>>>,
}

impl PageRasterizer for BrokenRasterizer {
    fn rasterize(
        &self,
        _path: &Path,
        _dpi: u32,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, BackendError> {
        *self.seen_dir.lock().unwrap() = Some(out_dir.to_path_buf());
        std::fs::write(out_dir.join("page-0001.png"), "partial")?;
        Err(BackendError::RenderError("page 2: broken stream".into()))
    }
}

struct FileContentEngine;

impl OcrEngine for FileContentEngine {
    fn recognize(&self, image: &Path) -> Result<String, BackendError> {
        let content = std::fs::read_to_string(image)?;
        if content.starts_with(FAIL) {
            Err(BackendError::OcrError(format!("cannot read {}", image.display())))
        } else {
            Ok(content)
        }
    }
}

struct Harness {
    extractor: OcrTextExtractor,
    seen_dir: Arc<Mutex<Option<PathBuf>>>,
    seen_dpi: Arc<Mutex<Option<u32>>>,
}

fn harness(pages: Vec<&'static str>) -> Harness {
    let seen_dir = Arc::new(Mutex::new(None));
    let seen_dpi = Arc::new(Mutex::new(None));
    let rasterizer = FakeRasterizer {
        pages,
        seen_dir: Arc::clone(&seen_dir),
        seen_dpi: Arc::clone(&seen_dpi),
    };
    Harness {
        extractor: OcrTextExtractor::new(Box::new(rasterizer), Box::new(FileContentEngine)),
        seen_dir,
        seen_dpi,
    }
}

fn scratch_of(h: &Harness) -> PathBuf {
    h.seen_dir.lock().unwrap().clone().expect("rasterizer not called")
}

#[test]
fn concatenates_pages_and_repairs_hyphenation() {
    let h = harness(vec!["An exam-\nple of ", "scanned text.\n"]);
    let out = h.extractor.extract_via_ocr(Path::new("A1-scan-1999.pdf")).unwrap();

    assert_eq!(out.text, "An example of scanned text.\n");
    assert_eq!(out.page_count, 2);
    assert!(out.failed_pages.is_empty());
}

#[test]
fn hyphen_split_across_pages_is_repaired() {
    let h = harness(vec!["conti-\n", "nued"]);
    let out = h.extractor.extract_via_ocr(Path::new("x.pdf")).unwrap();
    assert_eq!(out.text, "continued");
}

#[test]
fn compound_breaks_are_joined_unless_requested() {
    let pages = vec!["a data-\n", "driven Qwen2-\nVL study"];

    let h = harness(pages.clone());
    let out = h.extractor.extract_via_ocr(Path::new("x.pdf")).unwrap();
    assert_eq!(out.text, "a datadriven Qwen2VL study");

    let mut h = harness(pages);
    h.extractor = h.extractor.with_compound_hyphens(true);
    let out = h.extractor.extract_via_ocr(Path::new("x.pdf")).unwrap();
    assert_eq!(out.text, "a data-driven Qwen2-VL study");
}

#[test]
fn scratch_directory_removed_after_success() {
    let root = tempfile::tempdir().unwrap();
    let mut h = harness(vec!["page one\n"]);
    h.extractor = h.extractor.with_work_root(root.path());

    h.extractor.extract_via_ocr(Path::new("x.pdf")).unwrap();

    let scratch = scratch_of(&h);
    assert!(scratch.starts_with(root.path()));
    assert!(!scratch.exists(), "scratch dir {} left behind", scratch.display());
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn scratch_directory_removed_after_rasterize_failure() {
    let root = tempfile::tempdir().unwrap();
    let seen_dir = Arc::new(Mutex::new(None));
    let extractor = OcrTextExtractor::new(
        Box::new(BrokenRasterizer {
            seen_dir: Arc::clone(&seen_dir),
        }),
        Box::new(FileContentEngine),
    )
    .with_work_root(root.path());

    let err = extractor.extract_via_ocr(Path::new("x.pdf")).unwrap_err();
    assert!(matches!(err, BackendError::RenderError(_)));

    let scratch = seen_dir.lock().unwrap().clone().unwrap();
    assert!(!scratch.exists());
}

#[test]
fn substitute_policy_keeps_going_and_records_failed_page() {
    let h = harness(vec!["first ", "!FAIL unreadable", "third"]);
    let out = h.extractor.extract_via_ocr(Path::new("x.pdf")).unwrap();

    assert_eq!(out.text, "first third");
    assert_eq!(out.page_count, 3);
    assert_eq!(out.failed_pages.len(), 1);
    assert_eq!(out.failed_pages[0].page, 2);
}

#[test]
fn abort_policy_fails_document_and_cleans_up() {
    let root = tempfile::tempdir().unwrap();
    let mut h = harness(vec!["first ", "!FAIL unreadable", "third"]);
    h.extractor = h
        .extractor
        .with_page_failure_policy(PageFailurePolicy::Abort)
        .with_work_root(root.path());

    let err = h.extractor.extract_via_ocr(Path::new("x.pdf")).unwrap_err();
    match err {
        BackendError::OcrError(msg) => assert!(msg.starts_with("page 2:"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!scratch_of(&h).exists());
}

#[test]
fn all_pages_failing_is_an_error_even_when_substituting() {
    let h = harness(vec!["!FAIL a", "!FAIL b"]);
    let err = h.extractor.extract_via_ocr(Path::new("x.pdf")).unwrap_err();
    assert!(matches!(err, BackendError::OcrError(_)));
    assert!(!scratch_of(&h).exists());
}

#[test]
fn zero_pages_is_an_error() {
    let h = harness(vec![]);
    assert!(h.extractor.extract_via_ocr(Path::new("x.pdf")).is_err());
}

#[test]
fn dpi_is_passed_to_rasterizer() {
    let mut h = harness(vec!["text"]);
    h.extractor = h.extractor.with_dpi(150);
    h.extractor.extract_via_ocr(Path::new("x.pdf")).unwrap();
    assert_eq!(*h.seen_dpi.lock().unwrap(), Some(150));
}

#[test]
fn page_failure_policy_parses() {
    assert_eq!(
        "Substitute".parse::<PageFailurePolicy>().unwrap(),
        PageFailurePolicy::Substitute
    );
    assert_eq!(
        "abort".parse::<PageFailurePolicy>().unwrap(),
        PageFailurePolicy::Abort
    );
    assert!("skip-it".parse::<PageFailurePolicy>().is_err());
}
