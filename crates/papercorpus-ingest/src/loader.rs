//! Reload a corpus of persisted `.txt` files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use papercorpus_core::{CorpusError, Document, DocumentFailure, FilenameMetadata, TextOrigin};

/// Documents read from a corpus directory, plus per-file failures.
#[derive(Debug, Default)]
pub struct LoadedCorpus {
    pub documents: Vec<Document>,
    pub failures: Vec<DocumentFailure>,
}

impl LoadedCorpus {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Split into four index-aligned vectors: `(texts, years, ref_ids, filenames)`.
    pub fn into_parallel(self) -> (Vec<String>, Vec<u16>, Vec<String>, Vec<PathBuf>) {
        let n = self.documents.len();
        let mut texts = Vec::with_capacity(n);
        let mut years = Vec::with_capacity(n);
        let mut ref_ids = Vec::with_capacity(n);
        let mut filenames = Vec::with_capacity(n);
        for doc in self.documents {
            texts.push(doc.text);
            years.push(doc.year);
            ref_ids.push(doc.ref_id);
            filenames.push(doc.source_filename);
        }
        (texts, years, ref_ids, filenames)
    }
}

/// Reads every visible regular file in a directory as a corpus document.
///
/// By default a file that cannot be read or whose name does not parse is
/// recorded in [`LoadedCorpus::failures`] and loading continues. With
/// [`strict`](Self::strict) the first such failure aborts the load.
#[derive(Debug, Clone, Default)]
pub struct CorpusLoader {
    strict: bool,
}

impl CorpusLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn load(&self, directory: &Path) -> Result<LoadedCorpus, CorpusError> {
        let entries = fs::read_dir(directory).map_err(|e| CorpusError::io(directory, e))?;

        let mut corpus = LoadedCorpus::default();
        let mut index = 0;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let error = CorpusError::io(directory, e);
                    self.record(&mut corpus, DocumentFailure::new(index, directory, error))?;
                    index += 1;
                    continue;
                }
            };

            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }
            let path = directory.join(&name);

            // fs::metadata follows symlinks
            match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    let error = CorpusError::io(&path, e);
                    self.record(&mut corpus, DocumentFailure::new(index, &path, error))?;
                    index += 1;
                    continue;
                }
            }

            match read_document(&path) {
                Ok(doc) => corpus.documents.push(doc),
                Err(error) => self.record(&mut corpus, DocumentFailure::new(index, &path, error))?,
            }
            index += 1;
        }

        tracing::info!(
            dir = %directory.display(),
            documents = corpus.documents.len(),
            failures = corpus.failures.len(),
            "corpus loaded"
        );
        Ok(corpus)
    }

    fn record(
        &self,
        corpus: &mut LoadedCorpus,
        failure: DocumentFailure,
    ) -> Result<(), CorpusError> {
        tracing::warn!(
            path = %failure.filename.display(),
            kind = %failure.kind(),
            error = %failure.error,
            "skipping corpus file"
        );
        if self.strict {
            return Err(failure.error);
        }
        corpus.failures.push(failure);
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<Document, CorpusError> {
    let meta = FilenameMetadata::parse(path)?;
    let bytes = fs::read(path).map_err(|e| CorpusError::io(path, e))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| CorpusError::io(path, io::Error::new(io::ErrorKind::InvalidData, e)))?;
    Ok(Document {
        text,
        source_filename: path.to_path_buf(),
        year: meta.year,
        ref_id: meta.ref_id,
        origin: TextOrigin::Persisted,
    })
}
