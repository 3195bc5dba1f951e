//! OCR fallback for scanned PDFs: rasterize pages, recognize each image,
//! repair line-break hyphenation.

pub mod extractor;
pub mod tesseract;
pub mod text_processing;

pub use extractor::{DEFAULT_DPI, OcrOutput, OcrTextExtractor, PageFailure, PageFailurePolicy};
pub use tesseract::TesseractEngine;
pub use text_processing::{repair_line_hyphenation, repair_line_hyphenation_keeping_compounds};
