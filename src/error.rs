//! Error types for the scrape-and-export pipeline.
//!
//! Three layers of errors exist:
//!
//! - [`BrowserError`]: driver-level faults raised by a browser session
//!   (timeouts, CDP failures). Never surfaced on their own; they are wrapped
//!   as the `source` of a [`ScrapeError`].
//! - [`ScrapeError`]: run-terminating faults. Configuration, extraction and
//!   normalization failures all abort the run before any export starts.
//! - [`ExportError`]: contained per-format failures. The export coordinator
//!   turns these into failed `ExportResult`s and never escalates them.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Faults raised by a [`BrowserSession`](crate::scrapers::BrowserSession).
#[derive(Debug, Error)]
pub enum BrowserError {
    /// An operation did not complete within its timeout.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// What was being waited on (e.g. `"page load"`).
        operation: &'static str,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The DevTools protocol reported a failure.
    #[error(transparent)]
    Cdp(#[from] chromiumoxide::error::CdpError),

    /// Any other driver failure.
    #[error("{0}")]
    Other(String),
}

/// Errors that terminate a scraping run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Configuration rejected before any work started.
    #[error("invalid scraping configuration: {reason}")]
    InvalidConfig {
        /// Which constraint was violated.
        reason: String,
    },

    /// A requested output format has no exporter.
    #[error("unsupported export format: {format}")]
    UnsupportedFormat {
        /// The format name as requested.
        format: String,
    },

    /// The export plan contained no tasks.
    #[error("no export formats requested")]
    NoExportTasks,

    /// Two export tasks point at the same file.
    #[error("duplicate export destination: {}", destination.display())]
    DuplicateDestination {
        /// The destination requested more than once.
        destination: PathBuf,
    },

    /// The browser session could not be created.
    #[error("failed to initialize browser: {source}")]
    BrowserInit {
        #[source]
        source: BrowserError,
    },

    /// Every navigation attempt failed.
    #[error("failed to navigate after {attempts} attempts: {source}")]
    Navigation {
        /// Number of attempts made.
        attempts: u32,
        /// The cause of the last failed attempt.
        #[source]
        source: BrowserError,
    },

    /// Reading the DOM failed.
    #[error("failed to extract article data: {reason}")]
    Extraction {
        /// Description of the failure.
        reason: String,
    },

    /// Normalization left nothing to export.
    #[error("no valid articles were extracted")]
    NoValidArticles,
}

impl ScrapeError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn extraction(reason: impl ToString) -> Self {
        Self::Extraction {
            reason: reason.to_string(),
        }
    }
}

/// Errors raised by a single format exporter.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The article collection was empty or held an invalid record.
    #[error("invalid articles provided for {format} export")]
    InvalidInput {
        /// Human readable format name.
        format: &'static str,
    },

    /// Serializing the articles into the format failed.
    #[error("{format} export failed: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    /// Writing the artifact to disk failed.
    #[error("{format} export failed writing {}: {source}", path.display())]
    Write {
        format: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn encode(format: &'static str, err: impl ToString) -> Self {
        Self::Encode {
            format,
            message: err.to_string(),
        }
    }
}
