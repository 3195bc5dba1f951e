//! PDF corpus ingestion: batch extraction with OCR escalation, and reload of
//! the persisted text corpus.

pub mod config;
pub mod loader;
pub mod orchestrator;
pub mod policy;

// Re-export domain types for convenience
pub use papercorpus_core::{Document, DocumentFailure, ExtractionResult, FailureKind, TextOrigin};

pub use config::{ConfigError, IngestConfig};
pub use loader::{CorpusLoader, LoadedCorpus};
pub use orchestrator::{BatchReport, ExtractionOrchestrator, IngestEvent, persist_text};
pub use policy::{DEFAULT_MIN_TEXT_CHARS, EscalationReason, ExtractionPolicy, OcrMode};

