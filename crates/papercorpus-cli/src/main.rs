use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use papercorpus_core::FailureKind;
use papercorpus_core::config_file;
use papercorpus_ingest::{CorpusLoader, IngestConfig, IngestEvent, OcrMode};
use papercorpus_ocr::TesseractEngine;

mod output;

use output::ColorMode;

/// Build and reload plain-text corpora from academic PDFs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of ./.papercorpus.toml and the platform config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from PDFs (files or directories of PDFs)
    Extract {
        /// PDF files, or directories whose .pdf files are all extracted
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the persisted <stem>.txt files
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Do not write .txt files
        #[arg(long)]
        no_persist: bool,

        /// When to run OCR: auto, never or force
        #[arg(long)]
        ocr: Option<OcrMode>,

        /// Text layers with fewer non-whitespace characters are OCRed (auto mode)
        #[arg(long)]
        min_chars: Option<usize>,

        /// Rasterization resolution for OCR
        #[arg(long)]
        dpi: Option<u32>,

        /// Tesseract language code(s), e.g. eng or eng+deu
        #[arg(long)]
        lang: Option<String>,

        /// Number of documents processed concurrently
        #[arg(short, long)]
        workers: Option<usize>,

        /// Horizontal gap (PDF points) under which characters join one word
        #[arg(long)]
        x_tolerance: Option<f32>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Load a directory of persisted .txt files and list it
    Load {
        /// Corpus directory
        dir: PathBuf,

        /// Abort on the first unreadable or misnamed file
        #[arg(long)]
        strict: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Print the publication year encoded in each file name
    Years {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Write the effective configuration to the platform config file
    InitConfig {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();
    run(Cli::parse())
}

/// Dispatch a parsed command line. Only `extract` and `init-config` read
/// the configuration, so a broken config file never blocks `load` or `years`.
fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Extract {
            inputs,
            out_dir,
            no_persist,
            ocr,
            min_chars,
            dpi,
            lang,
            workers,
            x_tolerance,
            no_color,
        } => {
            let mut config = resolve_config(cli.config.as_deref())?;
            // CLI flags override env vars and the config file
            if let Some(dir) = out_dir {
                config.output_dir = dir;
            }
            if no_persist {
                config.persist = false;
            }
            if let Some(mode) = ocr {
                config.policy.mode = mode;
            }
            if let Some(min) = min_chars {
                config.policy.min_text_chars = min;
            }
            if let Some(dpi) = dpi {
                config.dpi = dpi.max(1);
            }
            if let Some(lang) = lang {
                config.language = lang;
            }
            if let Some(workers) = workers {
                config.workers = workers.max(1);
            }
            if let Some(tol) = x_tolerance {
                config.x_tolerance = tol.max(0.0);
            }
            extract(&inputs, &config, color_mode(no_color))
        }
        Command::Load {
            dir,
            strict,
            no_color,
        } => load(&dir, strict, color_mode(no_color)),
        Command::Years { files } => years(&files),
        Command::InitConfig { force } => {
            init_config(&resolve_config(cli.config.as_deref())?, force)
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn color_mode(no_color: bool) -> ColorMode {
    ColorMode(!no_color && std::io::stdout().is_terminal())
}

/// Resolve configuration: env vars > config file > defaults.
fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<IngestConfig> {
    let file = match explicit {
        Some(path) => config_file::load_from_path(path)
            .ok_or_else(|| anyhow::anyhow!("Cannot read config file {}", path.display()))?,
        None => config_file::load_config(),
    };
    let mut config = IngestConfig::from_config_file(&file)?;

    if let Ok(dir) = std::env::var("PAPERCORPUS_OUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }
    if let Some(workers) = std::env::var("PAPERCORPUS_WORKERS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
    {
        config.workers = workers.max(1);
    }
    if let Ok(path) = std::env::var("TESSERACT_PATH") {
        config.tesseract_path = PathBuf::from(path);
    }
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

/// Expand directories to their visible `.pdf` files, sorted by name.
/// Plain file arguments are passed through as given.
fn expand_inputs(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            pdfs.push(input.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in std::fs::read_dir(input)
            .with_context(|| format!("Cannot read directory {}", input.display()))?
        {
            let path = entry?.path();
            let hidden = path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with('.'));
            let is_pdf = path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
            if !hidden && is_pdf && path.is_file() {
                found.push(path);
            }
        }
        found.sort();
        pdfs.extend(found);
    }
    Ok(pdfs)
}

fn extract(
    inputs: &[PathBuf],
    config: &IngestConfig,
    color: ColorMode,
) -> anyhow::Result<ExitCode> {
    let pdfs = expand_inputs(inputs)?;
    let mut stdout = std::io::stdout();

    if pdfs.is_empty() {
        writeln!(stdout, "No PDFs to extract.")?;
        return Ok(ExitCode::SUCCESS);
    }

    if config.policy.mode != OcrMode::Never
        && !TesseractEngine::new()
            .with_binary(&config.tesseract_path)
            .is_available()
    {
        let msg = format!(
            "tesseract not found at {}; scanned PDFs will fail (set TESSERACT_PATH or use --ocr never)",
            config.tesseract_path.display()
        );
        if color.enabled() {
            use owo_colors::OwoColorize;
            writeln!(stdout, "{}", msg.yellow())?;
        } else {
            writeln!(stdout, "{}", msg)?;
        }
    }

    writeln!(stdout, "Extracting text from {} PDFs...", pdfs.len())?;

    let bar = ProgressBar::new(pdfs.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.green/dim}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    let progress = |event: IngestEvent| {
        if let Some(line) = output::format_event(&event, color) {
            bar.println(line);
        }
        match &event {
            IngestEvent::Started { filename, .. } => bar.set_message(filename.clone()),
            IngestEvent::Finished { .. } => bar.inc(1),
            // Persist failures are followed by Finished; other failures end the document
            IngestEvent::Failed { kind, .. } if *kind != FailureKind::Io => bar.inc(1),
            _ => {}
        }
    };

    let orchestrator = config.build_orchestrator();
    let report =
        orchestrator.process_with_progress(&pdfs, &config.output_dir, config.persist, &progress);
    bar.finish_and_clear();

    let persisted_to = config.persist.then_some(config.output_dir.as_path());
    output::print_batch_summary(&mut stdout, pdfs.len(), &report, persisted_to, color)?;
    output::print_failures(&mut stdout, &report.failures, color)?;

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn load(dir: &Path, strict: bool, color: ColorMode) -> anyhow::Result<ExitCode> {
    let corpus = CorpusLoader::new()
        .strict(strict)
        .load(dir)
        .with_context(|| format!("Failed to load corpus from {}", dir.display()))?;

    let mut stdout = std::io::stdout();
    output::print_corpus_table(&mut stdout, &corpus.documents, color)?;
    output::print_failures(&mut stdout, &corpus.failures, color)?;

    Ok(if corpus.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn years(files: &[PathBuf]) -> anyhow::Result<ExitCode> {
    let mut stdout = std::io::stdout();
    let color = color_mode(false);
    let mut failed = false;
    for file in files {
        let year = papercorpus_core::year_of(file);
        failed |= year.is_err();
        output::print_year(&mut stdout, file, &year, color)?;
    }
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn init_config(config: &IngestConfig, force: bool) -> anyhow::Result<ExitCode> {
    if let Some(path) = config_file::config_path()
        && path.exists()
        && !force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite it.",
            path.display()
        );
    }
    let path = config_file::save_config(&config.to_config_file()).map_err(anyhow::Error::msg)?;
    println!("Wrote {}", path.display());
    Ok(ExitCode::SUCCESS)
}
