use std::path::PathBuf;

use papercorpus_core::config_file::ConfigFile;
use papercorpus_ocr::{DEFAULT_DPI, PageFailurePolicy};
use thiserror::Error;

use crate::policy::{ExtractionPolicy, OcrMode};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid config value for {field}: {message}")]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

/// Fully resolved ingestion settings.
///
/// Built from [`ConfigFile`] layers with [`IngestConfig::from_config_file`];
/// anything the file leaves unset keeps its default. Callers with higher
/// precedence sources (CLI flags, environment) overwrite fields afterwards.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub x_tolerance: f32,
    pub expand_ligatures: bool,
    pub policy: ExtractionPolicy,
    pub dpi: u32,
    pub language: String,
    pub tesseract_path: PathBuf,
    pub psm: u32,
    pub page_failure: PageFailurePolicy,
    pub output_dir: PathBuf,
    pub persist: bool,
    pub workers: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            x_tolerance: 2.0,
            expand_ligatures: true,
            policy: ExtractionPolicy::default(),
            dpi: DEFAULT_DPI,
            language: "eng".to_string(),
            tesseract_path: PathBuf::from("tesseract"),
            psm: 3,
            page_failure: PageFailurePolicy::default(),
            output_dir: PathBuf::from("txt"),
            persist: true,
            workers: 1,
        }
    }
}

impl IngestConfig {
    pub fn from_config_file(file: &ConfigFile) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(extraction) = &file.extraction {
            if let Some(tol) = extraction.x_tolerance {
                if !tol.is_finite() || tol < 0.0 {
                    return Err(ConfigError {
                        field: "extraction.x_tolerance",
                        message: format!("{} is not a non-negative number", tol),
                    });
                }
                config.x_tolerance = tol;
            }
            if let Some(expand) = extraction.expand_ligatures {
                config.expand_ligatures = expand;
            }
        }

        if let Some(ocr) = &file.ocr {
            if let Some(mode) = &ocr.mode {
                config.policy.mode = mode.parse::<OcrMode>().map_err(|message| ConfigError {
                    field: "ocr.mode",
                    message,
                })?;
            }
            if let Some(min) = ocr.min_text_chars {
                config.policy.min_text_chars = min;
            }
            if ocr.min_chars_per_page.is_some() {
                config.policy.min_chars_per_page = ocr.min_chars_per_page;
            }
            if let Some(dpi) = ocr.dpi {
                if dpi == 0 {
                    return Err(ConfigError {
                        field: "ocr.dpi",
                        message: "must be at least 1".to_string(),
                    });
                }
                config.dpi = dpi;
            }
            if let Some(lang) = &ocr.language {
                config.language = lang.clone();
            }
            if let Some(path) = &ocr.tesseract_path {
                config.tesseract_path = PathBuf::from(path);
            }
            if let Some(psm) = ocr.psm {
                config.psm = psm;
            }
            if let Some(policy) = &ocr.page_failure {
                config.page_failure =
                    policy
                        .parse::<PageFailurePolicy>()
                        .map_err(|message| ConfigError {
                            field: "ocr.page_failure",
                            message,
                        })?;
            }
        }

        if let Some(output) = &file.output {
            if let Some(dir) = &output.directory {
                config.output_dir = PathBuf::from(dir);
            }
            if let Some(persist) = output.persist {
                config.persist = persist;
            }
        }

        if let Some(workers) = file.concurrency.as_ref().and_then(|c| c.workers) {
            config.workers = workers.max(1);
        }

        Ok(config)
    }

    /// Snapshot of these settings as a complete [`ConfigFile`], e.g. for saving.
    pub fn to_config_file(&self) -> ConfigFile {
        use papercorpus_core::config_file::{
            ConcurrencyConfig, ExtractionConfig, OcrConfig, OutputConfig,
        };

        ConfigFile {
            extraction: Some(ExtractionConfig {
                x_tolerance: Some(self.x_tolerance),
                expand_ligatures: Some(self.expand_ligatures),
            }),
            ocr: Some(OcrConfig {
                mode: Some(self.policy.mode.as_str().to_string()),
                min_text_chars: Some(self.policy.min_text_chars),
                min_chars_per_page: self.policy.min_chars_per_page,
                dpi: Some(self.dpi),
                language: Some(self.language.clone()),
                tesseract_path: Some(self.tesseract_path.display().to_string()),
                psm: Some(self.psm),
                page_failure: Some(
                    match self.page_failure {
                        PageFailurePolicy::Substitute => "substitute",
                        PageFailurePolicy::Abort => "abort",
                    }
                    .to_string(),
                ),
            }),
            output: Some(OutputConfig {
                directory: Some(self.output_dir.display().to_string()),
                persist: Some(self.persist),
            }),
            concurrency: Some(ConcurrencyConfig {
                workers: Some(self.workers),
            }),
        }
    }

    /// An orchestrator with MuPDF native extraction and Tesseract OCR.
    #[cfg(feature = "pdf")]
    pub fn build_orchestrator(&self) -> crate::ExtractionOrchestrator {
        use papercorpus_ocr::{OcrTextExtractor, TesseractEngine};
        use papercorpus_pdf_mupdf::MupdfBackend;

        let native = MupdfBackend::new()
            .with_x_tolerance(self.x_tolerance)
            .with_ligature_expansion(self.expand_ligatures);
        let engine = TesseractEngine::new()
            .with_binary(&self.tesseract_path)
            .with_language(&self.language)
            .with_psm(self.psm);
        let ocr = OcrTextExtractor::new(Box::new(MupdfBackend::new()), Box::new(engine))
            .with_dpi(self.dpi)
            .with_page_failure_policy(self.page_failure);

        crate::ExtractionOrchestrator::new(Box::new(native))
            .with_ocr(ocr)
            .with_policy(self.policy.clone())
            .with_workers(self.workers)
    }
}
