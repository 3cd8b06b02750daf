//! Fixed extraction schema for the listing page.
//!
//! Every list item matching [`ARTICLE_LIST`] is read through the same table
//! of [`FieldRule`]s. A rule whose selector matches nothing yields an empty
//! value for its field; it never fails the item.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use crate::error::ScrapeError;
use crate::models::RawArticle;

/// Selector for one entry of the article list. Its presence is also the
/// "content ready" condition the navigator waits for.
pub const ARTICLE_LIST: &str = "li.list-item";

/// Raw field filled by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Url,
    Summary,
    PublishDate,
    Author,
    Image,
}

/// Where a field's value comes from once its element is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Whitespace-collapsed element text.
    Text,
    /// Attribute value as written.
    Attr(&'static str),
    /// Attribute value resolved against the page URL.
    Link(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    pub selector: &'static str,
    pub source: Source,
}

/// One rule per raw field, evaluated relative to each list item.
pub const SCHEMA: &[FieldRule] = &[
    FieldRule {
        field: Field::Title,
        selector: ".post__title a",
        source: Source::Text,
    },
    FieldRule {
        field: Field::Url,
        selector: ".post__title a",
        source: Source::Link("href"),
    },
    FieldRule {
        field: Field::Summary,
        selector: ".post__tease",
        source: Source::Text,
    },
    FieldRule {
        field: Field::PublishDate,
        selector: ".post__meta .published",
        source: Source::Text,
    },
    FieldRule {
        field: Field::Author,
        selector: "img[alt]",
        source: Source::Attr("alt"),
    },
    FieldRule {
        field: Field::Image,
        selector: "img[alt]",
        source: Source::Link("src"),
    },
];

/// [`SCHEMA`] with its selectors parsed.
#[derive(Debug)]
pub struct CompiledSchema {
    item: Selector,
    rules: Vec<(FieldRule, Selector)>,
}

fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::extraction(format!("invalid selector {selector:?}: {e}")))
}

impl CompiledSchema {
    pub fn compile() -> Result<Self, ScrapeError> {
        Self::compile_rules(ARTICLE_LIST, SCHEMA)
    }

    pub fn compile_rules(item: &str, rules: &[FieldRule]) -> Result<Self, ScrapeError> {
        let item = parse_selector(item)?;
        let rules = rules
            .iter()
            .map(|rule| parse_selector(rule.selector).map(|selector| (*rule, selector)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { item, rules })
    }

    /// Read every list item of `html`, in document order.
    #[instrument(level = "debug", skip_all, fields(base = %base))]
    pub fn extract(&self, html: &str, base: &Url) -> Vec<RawArticle> {
        let document = Html::parse_document(html);
        document
            .select(&self.item)
            .enumerate()
            .map(|(index, item)| self.extract_item(index, item, base))
            .collect()
    }

    fn extract_item(&self, index: usize, item: ElementRef<'_>, base: &Url) -> RawArticle {
        let mut raw = RawArticle::default();
        for (rule, selector) in &self.rules {
            let value = item
                .select(selector)
                .next()
                .and_then(|element| read_value(element, rule.source, base))
                .unwrap_or_default();
            if value.is_empty() {
                debug!(index, field = ?rule.field, selector = rule.selector, "Field missing from list item");
            }
            let slot = match rule.field {
                Field::Title => &mut raw.title,
                Field::Url => &mut raw.url,
                Field::Summary => &mut raw.summary,
                Field::PublishDate => &mut raw.publish_date,
                Field::Author => &mut raw.author,
                Field::Image => &mut raw.image,
            };
            *slot = value;
        }
        raw
    }
}

fn read_value(element: ElementRef<'_>, source: Source, base: &Url) -> Option<String> {
    match source {
        Source::Text => Some(collapse_whitespace(&element.text().collect::<String>())),
        Source::Attr(name) => element.value().attr(name).map(|v| v.trim().to_string()),
        Source::Link(name) => element.value().attr(name).map(|href| {
            let href = href.trim();
            base.join(href)
                .map(|resolved| resolved.to_string())
                .unwrap_or_else(|_| href.to_string())
        }),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
<html><body>
<ul class="article-list">
  <li class="list-item">
    <h3 class="post__title"><a href="/2025/05/faster-wasm/">Faster
      <em>Wasm</em> builds</a></h3>
    <p class="post__tease">  A look at the new   pipeline. </p>
    <div class="post__meta">
      <img alt="Jane Doe avatar" src="https://cdn.example.com/jane.png">
      <abbr class="published">May 6, 2025</abbr>
    </div>
  </li>
  <li class="list-item">
    <h3 class="post__title"><a href="https://hacks.mozilla.org/2025/04/css/">CSS nesting</a></h3>
  </li>
  <li class="list-item">
    <p class="post__tease">Orphan teaser</p>
    <img alt="Photo" src="/img/anon.jpg">
  </li>
</ul>
<li class="other">not an article</li>
</body></html>
"#;

    fn base() -> Url {
        Url::parse("https://hacks.mozilla.org/").unwrap()
    }

    #[test]
    fn test_extracts_every_item_in_document_order() {
        let schema = CompiledSchema::compile().unwrap();
        let items = schema.extract(LISTING, &base());

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Faster Wasm builds");
        assert_eq!(items[1].title, "CSS nesting");
        assert_eq!(items[2].title, "");
    }

    #[test]
    fn test_full_item_fields() {
        let schema = CompiledSchema::compile().unwrap();
        let first = &schema.extract(LISTING, &base())[0];

        assert_eq!(first.url, "https://hacks.mozilla.org/2025/05/faster-wasm/");
        assert_eq!(first.summary, "A look at the new pipeline.");
        assert_eq!(first.publish_date, "May 6, 2025");
        assert_eq!(first.author, "Jane Doe avatar");
        assert_eq!(first.image, "https://cdn.example.com/jane.png");
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let schema = CompiledSchema::compile().unwrap();
        let items = schema.extract(LISTING, &base());

        let second = &items[1];
        assert_eq!(second.summary, "");
        assert_eq!(second.author, "");
        assert_eq!(second.image, "");

        let third = &items[2];
        assert_eq!(third.url, "");
        assert_eq!(third.summary, "Orphan teaser");
        assert_eq!(third.image, "https://hacks.mozilla.org/img/anon.jpg");
    }

    #[test]
    fn test_page_without_list_items() {
        let schema = CompiledSchema::compile().unwrap();
        assert!(schema.extract("<html><body></body></html>", &base()).is_empty());
    }

    #[test]
    fn test_bad_selector_is_extraction_error() {
        let rules = [FieldRule {
            field: Field::Title,
            selector: "a[[",
            source: Source::Text,
        }];
        let err = CompiledSchema::compile_rules(ARTICLE_LIST, &rules).unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction { .. }));
    }
}
