use std::path::PathBuf;

use thiserror::Error;

use crate::backend::BackendError;

/// A filename that does not follow `<refid>-...-<YYYY>.<ext>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("filename {filename:?} does not match <refid>-...-<YYYY>.<ext>: {reason}")]
pub struct MetadataFormatError {
    pub filename: String,
    pub reason: &'static str,
}

impl MetadataFormatError {
    pub(crate) fn new(filename: impl Into<String>, reason: &'static str) -> Self {
        Self {
            filename: filename.into(),
            reason,
        }
    }
}

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error(transparent)]
    Metadata(#[from] MetadataFormatError),
    #[error("extraction failed for {}: {source}", path.display())]
    Extraction {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CorpusError {
    pub fn extraction(path: impl Into<PathBuf>, source: BackendError) -> Self {
        CorpusError::Extraction {
            path: path.into(),
            source,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CorpusError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            CorpusError::Metadata(_) => FailureKind::Metadata,
            CorpusError::Extraction { .. } => FailureKind::Extraction,
            CorpusError::Io { .. } => FailureKind::Io,
        }
    }
}

/// Coarse classification of a per-document failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Metadata,
    Extraction,
    Io,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Metadata => "metadata",
            FailureKind::Extraction => "extraction",
            FailureKind::Io => "io",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
