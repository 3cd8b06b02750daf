//! Plain-text output.
//!
//! ```text
//! ARTICLE LISTING EXPORT
//! Generated: 2025-05-07 08:30:00 UTC
//! Total Articles: 12
//! Source: https://hacks.mozilla.org/
//! ════════════════════ ...
//! ARTICLE #1
//!
//! Title: ...
//! ...
//! ──────────────────── ...
//! ARTICLE #2
//! ...
//! ════════════════════ ...
//! ```

use std::fmt::Write;

use itertools::Itertools;

use super::ExportMeta;
use crate::models::{Article, EMPTY_FIELD};
use crate::utils::wrap_text;

/// Summary column width.
const WRAP_WIDTH: usize = 70;
const RULE_WIDTH: usize = 80;

pub fn render(articles: &[Article], meta: &ExportMeta) -> String {
    let separator = "═".repeat(RULE_WIDTH);
    let article_separator = format!("\n{}\n", "─".repeat(RULE_WIDTH));

    let body = articles
        .iter()
        .enumerate()
        .map(|(i, article)| format_article(article, i + 1))
        .join(&article_separator);

    let mut out = header(articles.len(), meta);
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    out.push_str(&body);
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    out
}

fn header(total: usize, meta: &ExportMeta) -> String {
    format!(
        "ARTICLE LISTING EXPORT\nGenerated: {}\nTotal Articles: {}\nSource: {}",
        meta.exported_at.format("%Y-%m-%d %H:%M:%S UTC"),
        total,
        meta.source
    )
}

fn format_article(article: &Article, number: usize) -> String {
    let mut block = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(block, "ARTICLE #{number}\n");
    let _ = writeln!(block, "Title: {}", article.title);
    let _ = writeln!(block, "Author: {}", article.author);
    let _ = writeln!(block, "Date: {}", article.publish_date);
    let _ = writeln!(block, "URL: {}", article.url);
    let _ = writeln!(block, "Image: {}", display_or_na(&article.featured_image));
    let _ = writeln!(block, "\nSummary:");
    block.push_str(&wrap_text(&article.summary, WRAP_WIDTH).join("\n"));
    block
}

fn display_or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        EMPTY_FIELD
    } else {
        value
    }
}
