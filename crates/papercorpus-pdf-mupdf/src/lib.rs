use std::path::{Path, PathBuf};

use mupdf::{Colorspace, Document, ImageFormat, Matrix, Page, TextPageFlags};

use papercorpus_core::{BackendError, PageRasterizer, PdfBackend, expand_ligatures};

/// MuPDF-based implementation of [`PdfBackend`] and [`PageRasterizer`].
///
/// This crate is the sole AGPL island. It isolates the mupdf dependency
/// (which is AGPL-3.0) so that non-PDF code paths do not transitively
/// depend on it.
///
/// Text is read block by block and line by line from MuPDF's structured
/// text, which follows the visual reading flow rather than content-stream
/// order. Within a line, glyphs separated by more than `x_tolerance` points
/// get a space between them; closer glyphs are merged into one word.
pub struct MupdfBackend {
    /// Horizontal gap (PDF points) above which a space is inserted. Default 2.0.
    x_tolerance: f32,
    /// Replace typographic ligatures (ﬁ, ﬂ, …) with their letters. Default true.
    expand_ligatures: bool,
}

impl Default for MupdfBackend {
    fn default() -> Self {
        Self {
            x_tolerance: 2.0,
            expand_ligatures: true,
        }
    }
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the horizontal merge tolerance. Negative values are clamped to `0.0`.
    pub fn with_x_tolerance(mut self, tolerance: f32) -> Self {
        self.x_tolerance = tolerance.max(0.0);
        self
    }

    pub fn with_ligature_expansion(mut self, enabled: bool) -> Self {
        self.expand_ligatures = enabled;
        self
    }

    fn page_text(&self, page: &Page) -> Result<String, mupdf::Error> {
        let text_page = page.to_text_page(TextPageFlags::empty())?;

        let mut page_text = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let glyphs = line.chars().map(|c| {
                    let quad = c.quad();
                    Glyph {
                        ch: c.char().unwrap_or('\u{FFFD}'),
                        left: quad.ul.x.min(quad.ll.x),
                        right: quad.ur.x.max(quad.lr.x),
                    }
                });
                page_text.push_str(&assemble_line(glyphs, self.x_tolerance));
                page_text.push('\n');
            }
        }
        Ok(page_text)
    }
}

fn open_document(path: &Path) -> Result<Document, BackendError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;
    Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let document = open_document(path)?;

        let mut text = String::new();
        let mut pages = 0usize;
        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            pages += 1;
            let page = page_result.map_err(|e| {
                BackendError::ExtractionError(format!("page {}: {}", pages, e))
            })?;
            let page_text = self.page_text(&page).map_err(|e| {
                BackendError::ExtractionError(format!("page {}: {}", pages, e))
            })?;
            // Leading space keeps the last word of one page off the first word of the next
            text.push(' ');
            text.push_str(&page_text);
        }

        tracing::debug!(path = %path.display(), pages, bytes = text.len(), "extracted text layer");

        if self.expand_ligatures {
            Ok(expand_ligatures(&text))
        } else {
            Ok(text)
        }
    }

    fn page_count(&self, path: &Path) -> Result<usize, BackendError> {
        let document = open_document(path)?;
        let count = document
            .page_count()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        Ok(count.max(0) as usize)
    }
}

impl PageRasterizer for MupdfBackend {
    fn rasterize(
        &self,
        path: &Path,
        dpi: u32,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, BackendError> {
        let document = open_document(path)?;

        let scale = dpi.max(1) as f32 / 72.0;
        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_gray();

        let mut images = Vec::new();
        for page_result in document
            .pages()
            .map_err(|e| BackendError::RenderError(e.to_string()))?
        {
            let page_number = images.len() + 1;
            let render_err =
                |e: mupdf::Error| BackendError::RenderError(format!("page {}: {}", page_number, e));

            let page = page_result.map_err(render_err)?;
            let pixmap = page
                .to_pixmap(&matrix, &colorspace, false, true)
                .map_err(render_err)?;

            let image_path = out_dir.join(format!("page-{:04}.png", page_number));
            let image_str = image_path
                .to_str()
                .ok_or_else(|| BackendError::RenderError("invalid output path encoding".into()))?;
            pixmap
                .save_as(image_str, ImageFormat::PNG)
                .map_err(render_err)?;
            images.push(image_path);
        }

        tracing::debug!(path = %path.display(), pages = images.len(), dpi, "rasterized pages");
        Ok(images)
    }
}

/// A positioned glyph on a text line.
#[derive(Debug, Clone, Copy)]
struct Glyph {
    ch: char,
    left: f32,
    right: f32,
}

/// Join a line's glyphs, inserting a space wherever the gap between two
/// consecutive non-space glyphs exceeds `x_tolerance`.
fn assemble_line(glyphs: impl IntoIterator<Item = Glyph>, x_tolerance: f32) -> String {
    let mut line = String::new();
    let mut prev: Option<Glyph> = None;

    for glyph in glyphs {
        if let Some(p) = prev
            && !p.ch.is_whitespace()
            && !glyph.ch.is_whitespace()
            && glyph.left - p.right > x_tolerance
        {
            line.push(' ');
        }
        line.push(glyph.ch);
        prev = Some(glyph);
    }
    line
}
