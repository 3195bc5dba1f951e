use std::path::{Path, PathBuf};
use std::process::Command;

use papercorpus_core::{BackendError, OcrEngine};

/// [`OcrEngine`] backed by the `tesseract` executable.
///
/// Each page image is recognized with `tesseract <image> stdout -l <lang> --psm <n>`.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
    /// Page segmentation mode. 3 = fully automatic, no orientation detection.
    psm: u32,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            psm: 3,
        }
    }
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_psm(mut self, psm: u32) -> Self {
        self.psm = psm;
        self
    }

    /// Whether the configured binary can be executed.
    pub fn is_available(&self) -> bool {
        let available = Command::new(&self.binary)
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success());
        if !available {
            tracing::debug!(binary = %self.binary.display(), "tesseract not found");
        }
        available
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &Path) -> Result<String, BackendError> {
        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string())
            .output()
            .map_err(|e| {
                BackendError::OcrError(format!("failed to run {}: {}", self.binary.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::OcrError(format!(
                "tesseract exited with {} on {}: {}",
                output.status,
                image.display(),
                stderr.trim()
            )));
        }

        // Tesseract terminates each page with a form feed
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text.trim_end_matches('\u{c}').to_string())
    }
}
