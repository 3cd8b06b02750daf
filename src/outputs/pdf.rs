//! PDF output.
//!
//! The document is laid out in two passes. [`layout`] turns the articles
//! into positioned lines grouped by page (cover, table of contents, then
//! each article starting on a fresh page), which fixes the page count.
//! [`render`] then draws every page with a `Page i of n` footer.

use printpdf::lopdf::{self, Object, StringFormat};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, OffsetDateTime, PdfDocument};

use super::ExportMeta;
use crate::error::ExportError;
use crate::models::Article;
use crate::utils::{truncate_text, wrap_text};

const FORMAT: &str = "PDF";

const DOCUMENT_TITLE: &str = "Article Listing Export";

// A4 portrait, millimetres.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const TOP: f32 = 277.0;
const BOTTOM: f32 = 25.0;
const FOOTER_Y: f32 = 12.0;

const TOC_TITLE_CHARS: usize = 60;
const TITLE_WRAP: usize = 55;
const BODY_WRAP: usize = 90;

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub size: f32,
    pub bold: bool,
    /// Baseline, measured from the bottom edge.
    pub y: f32,
}

pub type Page = Vec<Line>;

fn line_height(size: f32) -> f32 {
    size * 0.5
}

struct Layout {
    pages: Vec<Page>,
    current: Page,
    cursor: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            cursor: TOP,
        }
    }

    fn push(&mut self, text: impl Into<String>, size: f32, bold: bool) {
        let height = line_height(size);
        if self.cursor - height < BOTTOM && !self.current.is_empty() {
            self.new_page();
        }
        self.cursor -= height;
        self.current.push(Line {
            text: text.into(),
            size,
            bold,
            y: self.cursor,
        });
    }

    fn push_wrapped(&mut self, text: &str, width: usize, size: f32, bold: bool) {
        for line in wrap_text(text, width) {
            self.push(line, size, bold);
        }
    }

    fn gap(&mut self, mm: f32) {
        self.cursor -= mm;
    }

    fn new_page(&mut self) {
        if !self.current.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
        }
        self.cursor = TOP;
    }

    fn finish(mut self) -> Vec<Page> {
        self.new_page();
        self.pages
    }
}

/// Position every line of the document.
pub fn layout(articles: &[Article], meta: &ExportMeta) -> Vec<Page> {
    let mut doc = Layout::new();

    // Cover
    doc.gap(60.0);
    doc.push(DOCUMENT_TITLE, 26.0, true);
    doc.gap(10.0);
    doc.push(format!("Source: {}", meta.source), 12.0, false);
    doc.push(
        format!("Generated: {}", meta.exported_at.format("%Y-%m-%d %H:%M:%S UTC")),
        12.0,
        false,
    );
    doc.push(format!("Total Articles: {}", articles.len()), 12.0, false);

    doc.new_page();
    doc.push("Table of Contents", 18.0, true);
    doc.gap(4.0);
    for (i, article) in articles.iter().enumerate() {
        let title = article.title.split_whitespace().collect::<Vec<_>>().join(" ");
        doc.push(
            format!("{}. {}", i + 1, truncate_text(&title, TOC_TITLE_CHARS)),
            11.0,
            false,
        );
    }

    for (i, article) in articles.iter().enumerate() {
        doc.new_page();
        doc.push(format!("ARTICLE #{}", i + 1), 10.0, true);
        doc.gap(2.0);
        doc.push_wrapped(&article.title, TITLE_WRAP, 16.0, true);
        doc.gap(2.0);
        doc.push(format!("Author: {}", article.author), 11.0, false);
        doc.push(format!("Date: {}", article.publish_date), 11.0, false);
        doc.push_wrapped(&format!("URL: {}", article.url), BODY_WRAP, 11.0, false);
        doc.push_wrapped(
            &format!("Image: {}", article.featured_image),
            BODY_WRAP,
            11.0,
            false,
        );
        doc.gap(4.0);
        doc.push("Summary:", 12.0, true);
        doc.push_wrapped(&article.summary, BODY_WRAP, 11.0, false);
    }

    doc.finish()
}

pub fn render(articles: &[Article], meta: &ExportMeta) -> Result<Vec<u8>, ExportError> {
    let pages = layout(articles, meta);
    let total = pages.len();

    // Identifiers and dates default to random values and the wall clock;
    // everything here is derived from the batch instead.
    let stamp = OffsetDateTime::from_unix_timestamp(meta.exported_at.timestamp())
        .map_err(|e| ExportError::encode(FORMAT, e))?;
    let document_id = format!("{:032X}", meta.exported_at.timestamp_millis());

    let (document, first_page, first_layer) =
        PdfDocument::new(DOCUMENT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let document = document
        .with_document_id(document_id.clone())
        .with_creation_date(stamp)
        .with_mod_date(stamp)
        .with_metadata_date(stamp);
    let regular = document
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::encode(FORMAT, e))?;
    let bold = document
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::encode(FORMAT, e))?;

    for (index, lines) in pages.iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            document.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1")
        };
        let layer = document.get_page(page).get_layer(layer);

        for line in lines {
            let font: &IndirectFontRef = if line.bold { &bold } else { &regular };
            layer.use_text(line.text.as_str(), line.size, Mm(MARGIN_LEFT), Mm(line.y), font);
        }
        layer.use_text(
            format!("Page {} of {}", index + 1, total),
            9.0,
            Mm(PAGE_WIDTH / 2.0 - 10.0),
            Mm(FOOTER_Y),
            &regular,
        );
    }

    let bytes = document
        .save_to_bytes()
        .map_err(|e| ExportError::encode(FORMAT, e))?;
    pin_trailer_id(&bytes, &document_id).map_err(|e| ExportError::encode(FORMAT, e))
}

/// Replace the trailer `/ID` pair, which is filled with random characters on save.
fn pin_trailer_id(bytes: &[u8], id: &str) -> Result<Vec<u8>, lopdf::Error> {
    let mut document = lopdf::Document::load_mem(bytes)?;
    let id = Object::String(id.as_bytes().to_vec(), StringFormat::Literal);
    document.trailer.set("ID", Object::Array(vec![id.clone(), id]));

    let mut out = Vec::with_capacity(bytes.len());
    document.save_to(&mut out)?;
    Ok(out)
}
