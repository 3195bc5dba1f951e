//! Filename metadata grammar.
//!
//! Corpus files are named `<refid>-<anything>-<YYYY>.<ext>`. The ref id is the
//! base-name prefix before the first `-`; the year is the four digits right
//! before the extension.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::MetadataFormatError;

static REF_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?P<ref_id>[^-]+)-").unwrap());

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^0-9])(?P<year>[0-9]{4})\.[^.]+$").unwrap());

/// Year and ref id parsed from a corpus filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameMetadata {
    pub ref_id: String,
    pub year: u16,
}

impl FilenameMetadata {
    pub fn parse(filename: impl AsRef<Path>) -> Result<Self, MetadataFormatError> {
        let filename = filename.as_ref();
        Ok(Self {
            ref_id: refid_of(filename)?,
            year: year_of(filename)?,
        })
    }
}

fn base_name(filename: &Path) -> Result<&str, MetadataFormatError> {
    let lossy = || filename.to_string_lossy().to_string();
    let name = filename
        .file_name()
        .ok_or_else(|| MetadataFormatError::new(lossy(), "no file name"))?;
    name.to_str()
        .ok_or_else(|| MetadataFormatError::new(lossy(), "file name is not valid UTF-8"))
}

/// Parse the publication year encoded before the file extension.
pub fn year_of(filename: impl AsRef<Path>) -> Result<u16, MetadataFormatError> {
    let filename = filename.as_ref();
    let name = base_name(filename)?;
    let caps = YEAR_RE.captures(name).ok_or_else(|| {
        MetadataFormatError::new(
            filename.to_string_lossy(),
            "expected four digits immediately before the extension",
        )
    })?;
    caps["year"].parse::<u16>().map_err(|_| {
        MetadataFormatError::new(filename.to_string_lossy(), "year is not a number")
    })
}

/// Parse the reference id: the base-name prefix before the first `-`.
pub fn refid_of(filename: impl AsRef<Path>) -> Result<String, MetadataFormatError> {
    let filename = filename.as_ref();
    let name = base_name(filename)?;
    REF_ID_RE
        .captures(name)
        .map(|caps| caps["ref_id"].to_string())
        .ok_or_else(|| {
            MetadataFormatError::new(
                filename.to_string_lossy(),
                "expected a non-empty ref id before the first '-'",
            )
        })
}

/// Parse the year of every filename, failing on the first that does not conform.
pub fn years_of<P: AsRef<Path>>(filenames: &[P]) -> Result<Vec<u16>, MetadataFormatError> {
    filenames.iter().map(year_of).collect()
}
