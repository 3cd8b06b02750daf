//! Output generation for every supported export format.
//!
//! This module contains one submodule per output format plus the
//! coordinator that runs them side by side:
//!
//! # Submodules
//!
//! - [`json`]: Pretty-printed document with a metadata block
//! - [`csv`]: Header row plus one row per article
//! - [`xlsx`]: Single-sheet workbook
//! - [`text`]: Human readable listing with a generated header
//! - [`pdf`]: Paginated A4 document with a table of contents
//! - [`coordinator`]: Concurrent fan-out over a list of [`ExportTask`]s
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── articles.json
//! ├── articles.csv
//! ├── articles.xlsx
//! ├── articles.txt
//! └── articles.pdf
//! ```
//!
//! Every format is reached through [`ExportFormat::export_to_file`], which
//! validates the input, renders the whole artifact in memory and only then
//! writes it in one atomic step.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use tracing::{info, instrument};

use crate::error::{ExportError, ScrapeError};
use crate::models::Article;
use crate::utils::write_atomic;

pub mod coordinator;
pub mod csv;
pub mod json;
pub mod pdf;
pub mod text;
pub mod xlsx;

pub use coordinator::export_all;

/// Base file name of every artifact written by [`ExportTask::plan`].
pub const ARTIFACT_STEM: &str = "articles";

/// Supported output representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Json,
    Csv,
    Xlsx,
    Txt,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Json,
        ExportFormat::Csv,
        ExportFormat::Xlsx,
        ExportFormat::Txt,
        ExportFormat::Pdf,
    ];

    pub fn file_extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Txt => "txt",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn format_name(self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
            ExportFormat::Xlsx => "Excel",
            ExportFormat::Txt => "Text",
            ExportFormat::Pdf => "PDF",
        }
    }

    /// One-line description used in the end-of-run report.
    pub fn description(self) -> &'static str {
        match self {
            ExportFormat::Json => "Structured JSON data",
            ExportFormat::Csv => "Spreadsheet compatible",
            ExportFormat::Xlsx => "Excel workbook",
            ExportFormat::Txt => "Human readable text",
            ExportFormat::Pdf => "Printable document",
        }
    }

    /// Serialize `articles` into this format's on-disk bytes.
    pub fn render(self, articles: &[Article], meta: &ExportMeta) -> Result<Vec<u8>, ExportError> {
        match self {
            ExportFormat::Json => json::render(articles, meta),
            ExportFormat::Csv => csv::render(articles),
            ExportFormat::Xlsx => xlsx::render(articles, meta),
            ExportFormat::Txt => Ok(text::render(articles, meta).into_bytes()),
            ExportFormat::Pdf => pdf::render(articles, meta),
        }
    }

    /// Validate, render and atomically write `articles` to `destination`.
    ///
    /// Returns the size of the written artifact in bytes.
    ///
    /// # Errors
    ///
    /// - [`ExportError::InvalidInput`] for an empty collection or an invalid record
    /// - [`ExportError::Encode`] when rendering fails
    /// - [`ExportError::Write`] when the file cannot be written
    #[instrument(level = "info", skip_all, fields(format = self.format_name(), path = %destination.display()))]
    pub async fn export_to_file(
        self,
        destination: &Path,
        articles: &[Article],
        meta: &ExportMeta,
    ) -> Result<u64, ExportError> {
        if articles.is_empty() || !articles.iter().all(Article::is_valid) {
            return Err(ExportError::InvalidInput {
                format: self.format_name(),
            });
        }

        let bytes = self.render(articles, meta)?;
        let written = write_atomic(destination, &bytes)
            .await
            .map_err(|source| ExportError::Write {
                format: self.format_name(),
                path: destination.to_path_buf(),
                source,
            })?;

        info!(bytes = written, "{} exported", self.format_name());
        Ok(written)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ExportFormat::ALL
            .into_iter()
            .find(|format| format.file_extension() == wanted)
            .ok_or_else(|| ScrapeError::UnsupportedFormat {
                format: s.to_string(),
            })
    }
}

/// Header data shared by every artifact of one export batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportMeta {
    /// The listing page the articles came from.
    pub source: String,
    /// Timestamp printed in headers and metadata blocks.
    pub exported_at: DateTime<Utc>,
}

impl ExportMeta {
    pub fn now(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            exported_at: Utc::now(),
        }
    }
}

/// One requested `(format, destination)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTask {
    pub format: ExportFormat,
    pub destination: PathBuf,
}

impl ExportTask {
    pub fn new(format: ExportFormat, destination: impl Into<PathBuf>) -> Self {
        Self {
            format,
            destination: destination.into(),
        }
    }

    /// `output_dir/articles.<ext>` for each named format.
    ///
    /// Names are matched case-insensitively; repeated names collapse into
    /// one task.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::UnsupportedFormat`] for the first unknown name.
    pub fn plan(output_dir: &Path, formats: &[String]) -> Result<Vec<ExportTask>, ScrapeError> {
        let formats = formats
            .iter()
            .map(|name| name.parse::<ExportFormat>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(formats
            .into_iter()
            .unique()
            .map(|format| {
                let file = format!("{ARTIFACT_STEM}.{}", format.file_extension());
                ExportTask::new(format, output_dir.join(file))
            })
            .collect())
    }
}
