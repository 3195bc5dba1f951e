use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub extraction: Option<ExtractionConfig>,
    pub ocr: Option<OcrConfig>,
    pub output: Option<OutputConfig>,
    pub concurrency: Option<ConcurrencyConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Horizontal gap (PDF points) under which characters merge into one word.
    pub x_tolerance: Option<f32>,
    pub expand_ligatures: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrConfig {
    /// `auto`, `never` or `force`.
    pub mode: Option<String>,
    pub min_text_chars: Option<usize>,
    pub min_chars_per_page: Option<usize>,
    pub dpi: Option<u32>,
    pub language: Option<String>,
    pub tesseract_path: Option<String>,
    pub psm: Option<u32>,
    /// `substitute` or `abort`.
    pub page_failure: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: Option<String>,
    pub persist: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub workers: Option<usize>,
}

/// Platform config directory path: `<config_dir>/papercorpus/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("papercorpus").join("config.toml"))
}

/// Load config by cascading CWD `.papercorpus.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".papercorpus.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        extraction: Some(ExtractionConfig {
            x_tolerance: overlay
                .extraction
                .as_ref()
                .and_then(|e| e.x_tolerance)
                .or_else(|| base.extraction.as_ref().and_then(|e| e.x_tolerance)),
            expand_ligatures: overlay
                .extraction
                .as_ref()
                .and_then(|e| e.expand_ligatures)
                .or_else(|| base.extraction.as_ref().and_then(|e| e.expand_ligatures)),
        }),
        ocr: Some(OcrConfig {
            mode: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.mode.clone())
                .or_else(|| base.ocr.as_ref().and_then(|o| o.mode.clone())),
            min_text_chars: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.min_text_chars)
                .or_else(|| base.ocr.as_ref().and_then(|o| o.min_text_chars)),
            min_chars_per_page: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.min_chars_per_page)
                .or_else(|| base.ocr.as_ref().and_then(|o| o.min_chars_per_page)),
            dpi: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.dpi)
                .or_else(|| base.ocr.as_ref().and_then(|o| o.dpi)),
            language: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.language.clone())
                .or_else(|| base.ocr.as_ref().and_then(|o| o.language.clone())),
            tesseract_path: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.tesseract_path.clone())
                .or_else(|| base.ocr.as_ref().and_then(|o| o.tesseract_path.clone())),
            psm: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.psm)
                .or_else(|| base.ocr.as_ref().and_then(|o| o.psm)),
            page_failure: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.page_failure.clone())
                .or_else(|| base.ocr.as_ref().and_then(|o| o.page_failure.clone())),
        }),
        output: Some(OutputConfig {
            directory: overlay
                .output
                .as_ref()
                .and_then(|o| o.directory.clone())
                .or_else(|| base.output.as_ref().and_then(|o| o.directory.clone())),
            persist: overlay
                .output
                .as_ref()
                .and_then(|o| o.persist)
                .or_else(|| base.output.as_ref().and_then(|o| o.persist)),
        }),
        concurrency: Some(ConcurrencyConfig {
            workers: overlay
                .concurrency
                .as_ref()
                .and_then(|c| c.workers)
                .or_else(|| base.concurrency.as_ref().and_then(|c| c.workers)),
        }),
    }
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(&path, content).map_err(|e| format!("Failed to write config: {}", e))?;
    Ok(path)
}
