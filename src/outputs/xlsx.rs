//! Excel output: one worksheet, bold header row, fixed column widths.

use chrono::{Datelike, Timelike};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, XlsxError};

use super::ExportMeta;
use crate::error::ExportError;
use crate::models::Article;

const FORMAT: &str = "Excel";

pub const SHEET_NAME: &str = "Articles";

/// `(header, column width)` in record key order.
const COLUMNS: [(&str, f64); 6] = [
    ("title", 40.0),
    ("summary", 60.0),
    ("author", 20.0),
    ("date", 15.0),
    ("url", 50.0),
    ("image", 30.0),
];

pub fn render(articles: &[Article], meta: &ExportMeta) -> Result<Vec<u8>, ExportError> {
    build_workbook(articles, meta).map_err(|e| ExportError::encode(FORMAT, e))
}

/// Creation time stored in the document properties.
fn created_at(meta: &ExportMeta) -> Result<ExcelDateTime, XlsxError> {
    let at = meta.exported_at;
    ExcelDateTime::from_ymd(at.year() as u16, at.month() as u8, at.day() as u8)?.and_hms(
        at.hour() as u16,
        at.minute() as u8,
        f64::from(at.second()),
    )
}

fn build_workbook(articles: &[Article], meta: &ExportMeta) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    // Without this the core properties carry the wall clock.
    let properties = DocProperties::new().set_creation_datetime(&created_at(meta)?);
    workbook.set_properties(&properties);

    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, (name, width)) in (0u16..).zip(COLUMNS) {
        sheet.set_column_width(col, width)?;
        sheet.write_string_with_format(0, col, name, &header)?;
    }

    for (row, article) in (1u32..).zip(articles) {
        let record = article.to_record();
        let cells = [
            &record.title,
            &record.summary,
            &record.author,
            &record.date,
            &record.url,
            &record.image,
        ];
        for (col, value) in (0u16..).zip(cells) {
            sheet.write_string(row, col, value.as_str())?;
        }
    }

    workbook.save_to_buffer()
}
