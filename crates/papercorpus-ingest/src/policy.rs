use std::str::FromStr;

use papercorpus_core::non_whitespace_chars;

/// Default minimum number of non-whitespace characters a text layer needs
/// before it is trusted without OCR.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 100;

/// When the orchestrator runs OCR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OcrMode {
    /// Native extraction first; OCR only when the text layer is judged insufficient.
    #[default]
    Auto,
    /// Native extraction only.
    Never,
    /// Skip the text layer and OCR every document.
    Force,
}

impl OcrMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrMode::Auto => "auto",
            OcrMode::Never => "never",
            OcrMode::Force => "force",
        }
    }
}

impl FromStr for OcrMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(OcrMode::Auto),
            "never" | "off" => Ok(OcrMode::Never),
            "force" | "always" => Ok(OcrMode::Force),
            other => Err(format!(
                "unknown OCR mode '{}' (expected auto, never or force)",
                other
            )),
        }
    }
}

/// Why a document was routed to OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationReason {
    /// [`OcrMode::Force`].
    Forced,
    /// The text layer was below the configured threshold.
    InsufficientText,
    /// Native extraction failed and `fallback_on_error` is set.
    NativeError,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::Forced => "forced",
            EscalationReason::InsufficientText => "insufficient text layer",
            EscalationReason::NativeError => "native extraction failed",
        }
    }
}

/// The "is this a scanned PDF" decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPolicy {
    pub mode: OcrMode,
    /// Text layers with fewer non-whitespace characters are escalated.
    pub min_text_chars: usize,
    /// If set, text layers averaging fewer non-whitespace characters per page
    /// are escalated too.
    pub min_chars_per_page: Option<usize>,
    /// Try OCR when native extraction errors out (in `Auto` mode).
    pub fallback_on_error: bool,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            mode: OcrMode::Auto,
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
            min_chars_per_page: None,
            fallback_on_error: true,
        }
    }
}

impl ExtractionPolicy {
    /// Whether `text` is too thin to be a real text layer.
    ///
    /// `page_count` is only consulted when `min_chars_per_page` is set.
    pub fn is_insufficient(&self, text: &str, page_count: Option<usize>) -> bool {
        let chars = non_whitespace_chars(text);
        if chars < self.min_text_chars {
            return true;
        }
        if let (Some(per_page), Some(pages)) = (self.min_chars_per_page, page_count)
            && pages > 0
        {
            return chars < per_page.saturating_mul(pages);
        }
        false
    }

    /// After escalation, keep OCR output unless it recovered less text than
    /// the text layer did.
    pub fn prefer_ocr(&self, native: &str, ocr: &str) -> bool {
        non_whitespace_chars(ocr) >= non_whitespace_chars(native)
    }
}
