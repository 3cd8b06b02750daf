//! Turn raw list items into validated [`Article`]s.
//!
//! Each [`RawArticle`] is mapped on its own, with no state shared between
//! items, then the sequence is filtered down to valid records. Document
//! order is kept throughout.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::ScrapeError;
use crate::models::{Article, EMPTY_FIELD, RawArticle, UNKNOWN_AUTHOR};

/// Words that show up in the alt text of avatar images rather than in names.
static DECORATIVE_ALT_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(photo|avatar|image)").expect("static regex"));

/// Trim a display string, falling back to [`EMPTY_FIELD`].
pub fn sanitize_text(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        EMPTY_FIELD.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Keep `value` only if it parses as an absolute URL.
pub fn sanitize_url(value: &str) -> String {
    let trimmed = value.trim();
    match Url::parse(trimmed) {
        Ok(_) => trimmed.to_string(),
        Err(e) => {
            if !trimmed.is_empty() {
                debug!(value = %trimmed, error = %e, "Discarding unparsable URL");
            }
            EMPTY_FIELD.to_string()
        }
    }
}

/// Strip alt-text markers from an author name.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(process_author("Jane Doe avatar"), "Jane Doe");
/// assert_eq!(process_author("Photo"), UNKNOWN_AUTHOR);
/// ```
pub fn process_author(value: &str) -> String {
    let cleaned = DECORATIVE_ALT_TEXT.replace_all(value, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Build one [`Article`] from one raw list item.
pub fn normalize_article(raw: &RawArticle) -> Article {
    Article {
        title: sanitize_text(&raw.title),
        summary: sanitize_text(&raw.summary),
        author: process_author(&raw.author),
        publish_date: sanitize_text(&raw.publish_date),
        url: sanitize_url(&raw.url),
        featured_image: sanitize_url(&raw.image),
        created_at: Utc::now(),
    }
}

/// Normalize every raw item and keep the valid ones.
///
/// # Errors
///
/// [`ScrapeError::NoValidArticles`] if nothing survives validation.
#[instrument(level = "info", skip_all, fields(raw_count = raw.len()))]
pub fn normalize(raw: &[RawArticle]) -> Result<Vec<Article>, ScrapeError> {
    let articles: Vec<Article> = raw
        .iter()
        .map(normalize_article)
        .filter(Article::is_valid)
        .collect();

    info!(
        valid = articles.len(),
        discarded = raw.len() - articles.len(),
        "Processed articles"
    );

    if articles.is_empty() {
        return Err(ScrapeError::NoValidArticles);
    }
    Ok(articles)
}
