//! JSON output.
//!
//! The document carries a metadata block followed by the articles in
//! scrape order:
//!
//! ```json
//! {
//!   "metadata": {
//!     "exportedAt": "2025-05-07T08:30:00+00:00",
//!     "totalArticles": 12,
//!     "source": "https://hacks.mozilla.org/",
//!     "version": "0.1.0"
//!   },
//!   "articles": [ { "title": "...", "summary": "...", ... } ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::ExportMeta;
use crate::error::ExportError;
use crate::models::{Article, ExportRecord};

const FORMAT: &str = "JSON";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonMetadata {
    pub exported_at: String,
    pub total_articles: usize,
    pub source: String,
    pub version: String,
}

/// Top-level shape of `articles.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDocument {
    pub metadata: JsonMetadata,
    pub articles: Vec<ExportRecord>,
}

impl JsonDocument {
    pub fn new(articles: &[Article], meta: &ExportMeta) -> Self {
        Self {
            metadata: JsonMetadata {
                exported_at: meta.exported_at.to_rfc3339(),
                total_articles: articles.len(),
                source: meta.source.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            articles: articles.iter().map(Article::to_record).collect(),
        }
    }
}

pub fn render(articles: &[Article], meta: &ExportMeta) -> Result<Vec<u8>, ExportError> {
    serde_json::to_vec_pretty(&JsonDocument::new(articles, meta))
        .map_err(|e| ExportError::encode(FORMAT, e))
}
