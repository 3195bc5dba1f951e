use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;
use papercorpus_core::{Document, DocumentFailure, MetadataFormatError, TextOrigin, display_name};
use papercorpus_ingest::{BatchReport, IngestEvent};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// One-line rendering of the progress events worth showing above the bar.
/// `Started`, `Persisted` and `Finished` only move the bar.
pub fn format_event(event: &IngestEvent, color: ColorMode) -> Option<String> {
    match event {
        IngestEvent::Escalated {
            filename,
            native_chars,
            reason,
            ..
        } => {
            let msg = format!(
                "{}: running OCR ({}, {} chars in text layer)",
                filename,
                reason.as_str(),
                native_chars
            );
            Some(if color.enabled() {
                msg.dimmed().to_string()
            } else {
                msg
            })
        }
        IngestEvent::OcrPageFailed {
            filename,
            page,
            message,
            ..
        } => Some(if color.enabled() {
            format!(
                "{} {}: page {} left empty ({})",
                "WARNING:".yellow(),
                filename,
                page,
                message
            )
        } else {
            format!(
                "WARNING: {}: page {} left empty ({})",
                filename, page, message
            )
        }),
        IngestEvent::Failed {
            filename,
            kind,
            message,
            ..
        } => Some(if color.enabled() {
            format!("{} [{}] {}: {}", "FAILED".red(), kind, filename, message)
        } else {
            format!("FAILED [{}] {}: {}", kind, filename, message)
        }),
        IngestEvent::Started { .. }
        | IngestEvent::Persisted { .. }
        | IngestEvent::Finished { .. } => None,
    }
}

fn print_header(w: &mut dyn Write, title: &str, color: ColorMode) -> std::io::Result<()> {
    writeln!(w)?;
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", title.bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "{}", title)?;
        writeln!(w, "{}", sep)?;
    }
    Ok(())
}

/// Print the summary after an `extract` run.
pub fn print_batch_summary(
    w: &mut dyn Write,
    total: usize,
    report: &BatchReport,
    persisted_to: Option<&Path>,
    color: ColorMode,
) -> std::io::Result<()> {
    let ocr = report
        .documents
        .iter()
        .filter(|d| d.origin == TextOrigin::Ocr)
        .count();
    let native = report.documents.len() - ocr;

    print_header(w, "SUMMARY", color)?;
    writeln!(w, "  PDFs processed: {}", total)?;
    if color.enabled() {
        writeln!(w, "  {} {}", "Extracted:".green(), report.documents.len())?;
    } else {
        writeln!(w, "  Extracted: {}", report.documents.len())?;
    }
    let split = format!("Text layer: {}, OCR: {}", native, ocr);
    if color.enabled() {
        writeln!(w, "  {}", split.dimmed())?;
    } else {
        writeln!(w, "  {}", split)?;
    }
    if let Some(dir) = persisted_to {
        writeln!(w, "  Text files written to: {}", dir.display())?;
    }
    if !report.failures.is_empty() {
        if color.enabled() {
            writeln!(w, "  {} {}", "Failures:".red(), report.failures.len())?;
        } else {
            writeln!(w, "  Failures: {}", report.failures.len())?;
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Print the failure manifest, one line per failure.
pub fn print_failures(
    w: &mut dyn Write,
    failures: &[DocumentFailure],
    color: ColorMode,
) -> std::io::Result<()> {
    if failures.is_empty() {
        return Ok(());
    }
    print_header(w, "FAILURES", color)?;
    for failure in failures {
        let kind = format!("[{}]", failure.kind());
        if color.enabled() {
            writeln!(
                w,
                "  {} {} {}",
                kind.red(),
                failure.display_name().bold(),
                failure.error
            )?;
        } else {
            writeln!(w, "  {} {} {}", kind, failure.display_name(), failure.error)?;
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Print a loaded corpus as a table of ref id, year, characters and file name.
pub fn print_corpus_table(
    w: &mut dyn Write,
    documents: &[Document],
    color: ColorMode,
) -> std::io::Result<()> {
    let header = format!("{:<12} {:>4} {:>10}  {}", "REF ID", "YEAR", "CHARS", "FILE");
    if color.enabled() {
        writeln!(w, "{}", header.bold())?;
    } else {
        writeln!(w, "{}", header)?;
    }
    for doc in documents {
        writeln!(
            w,
            "{:<12} {:>4} {:>10}  {}",
            truncate(&doc.ref_id, 12),
            doc.year,
            doc.char_count(),
            display_name(&doc.source_filename)
        )?;
    }
    writeln!(w)?;
    writeln!(w, "  Documents loaded: {}", documents.len())?;
    Ok(())
}

/// Print the year parsed from each file name, or why it could not be parsed.
pub fn print_year(
    w: &mut dyn Write,
    path: &Path,
    year: &Result<u16, MetadataFormatError>,
    color: ColorMode,
) -> std::io::Result<()> {
    match year {
        Ok(year) => writeln!(w, "{}\t{}", year, path.display()),
        Err(e) => {
            if color.enabled() {
                writeln!(w, "{}\t{}", "????".red(), e)
            } else {
                writeln!(w, "????\t{}", e)
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}
