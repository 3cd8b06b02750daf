//! Data models for scraped articles and export outcomes.
//!
//! This module defines the core data structures used throughout the application:
//! - [`RawArticle`]: Field values exactly as read from one list item of the page
//! - [`Article`]: The normalized, validated record every exporter consumes
//! - [`ExportRecord`]: The flat projection written by every output format
//! - [`ExportResult`] / [`ExportSummary`]: Per-artifact outcomes and their aggregate

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::outputs::ExportFormat;

/// Placeholder stored in a text field that had no usable value.
pub const EMPTY_FIELD: &str = "N/A";

/// Author used when the page offers no usable author name.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// One list item of the listing page, before any cleanup.
///
/// Every field is the empty string when the extraction schema found no
/// match for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArticle {
    pub title: String,
    pub summary: String,
    pub author: String,
    pub publish_date: String,
    pub url: String,
    pub image: String,
}

/// A normalized article.
///
/// Built once by [`normalize`](crate::normalize) and never mutated afterwards.
/// `url` and `featured_image` are either absolute URLs or [`EMPTY_FIELD`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// The article headline.
    pub title: String,
    /// The teaser text shown under the headline.
    pub summary: String,
    /// Author name with decorative alt-text markers removed.
    pub author: String,
    /// Publication date exactly as displayed by the page.
    pub publish_date: String,
    /// Absolute link to the article; the record's identity.
    pub url: String,
    /// Absolute link to the author image.
    pub featured_image: String,
    /// When this record was built.
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// A record is usable only if it has both a title and a link.
    pub fn is_valid(&self) -> bool {
        self.title != EMPTY_FIELD && self.url != EMPTY_FIELD
    }

    /// Flatten into the shape shared by all output formats.
    pub fn to_record(&self) -> ExportRecord {
        ExportRecord {
            title: self.title.clone(),
            summary: self.summary.clone(),
            author: self.author.clone(),
            date: self.publish_date.clone(),
            url: self.url.clone(),
            image: self.featured_image.clone(),
        }
    }
}

/// The per-article row written to disk.
///
/// Field names are the stable keys of every structured output:
/// `title`, `summary`, `author`, `date`, `url`, `image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub title: String,
    pub summary: String,
    pub author: String,
    pub date: String,
    pub url: String,
    pub image: String,
}

/// How a single export ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The artifact was written; `bytes` is its size on disk.
    Written { bytes: u64 },
    /// The exporter failed with this message.
    Failed { error: String },
}

/// Outcome of writing the article collection to one destination.
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub format: ExportFormat,
    pub destination: PathBuf,
    pub outcome: ExportOutcome,
}

impl ExportResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ExportOutcome::Written { .. })
    }
}

/// Aggregate view over a batch of [`ExportResult`]s, used for the final report.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Number of artifacts written.
    pub succeeded: usize,
    /// Sum of the sizes of all written artifacts.
    pub total_bytes: u64,
    /// `(destination, error)` for every failed export, in input order.
    pub failures: Vec<(PathBuf, String)>,
}

impl ExportSummary {
    pub fn from_results(results: &[ExportResult]) -> Self {
        results
            .iter()
            .fold(ExportSummary::default(), |mut summary, result| {
                match &result.outcome {
                    ExportOutcome::Written { bytes } => {
                        summary.succeeded += 1;
                        summary.total_bytes += bytes;
                    }
                    ExportOutcome::Failed { error } => {
                        summary
                            .failures
                            .push((result.destination.clone(), error.clone()));
                    }
                }
                summary
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, url: &str) -> Article {
        Article {
            title: title.to_string(),
            summary: "Summary".to_string(),
            author: "Jane Doe".to_string(),
            publish_date: "May 6, 2025".to_string(),
            url: url.to_string(),
            featured_image: EMPTY_FIELD.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_article_validity() {
        assert!(article("Title", "https://example.com/a").is_valid());
        assert!(!article(EMPTY_FIELD, "https://example.com/a").is_valid());
        assert!(!article("Title", EMPTY_FIELD).is_valid());
    }

    #[test]
    fn test_export_record_uses_stable_keys() {
        let record = article("Title", "https://example.com/a").to_record();
        let json = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();

        assert_eq!(keys.len(), 6);
        for key in ["title", "summary", "author", "date", "url", "image"] {
            assert!(keys.contains(&key), "missing key {key}");
        }
        assert_eq!(json["date"], "May 6, 2025");
    }

    #[test]
    fn test_summary_counts_successes_and_failures() {
        let results = vec![
            ExportResult {
                format: ExportFormat::Json,
                destination: PathBuf::from("out/articles.json"),
                outcome: ExportOutcome::Written { bytes: 120 },
            },
            ExportResult {
                format: ExportFormat::Csv,
                destination: PathBuf::from("out/articles.csv"),
                outcome: ExportOutcome::Failed {
                    error: "disk full".to_string(),
                },
            },
            ExportResult {
                format: ExportFormat::Txt,
                destination: PathBuf::from("out/articles.txt"),
                outcome: ExportOutcome::Written { bytes: 30 },
            },
        ];

        let summary = ExportSummary::from_results(&results);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.total_bytes, 150);
        assert_eq!(
            summary.failures,
            vec![(PathBuf::from("out/articles.csv"), "disk full".to_string())]
        );
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
    }
}
