//! CSV output: a header row with the stable record keys, then one row per article.

use ::csv::WriterBuilder;

use crate::error::ExportError;
use crate::models::Article;

const FORMAT: &str = "CSV";

pub fn render(articles: &[Article]) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
    for article in articles {
        writer
            .serialize(article.to_record())
            .map_err(|e| ExportError::encode(FORMAT, e))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::encode(FORMAT, e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExportRecord;
    use crate::outputs::test_support::sample_articles;

    #[test]
    fn test_header_row() {
        let bytes = render(&sample_articles()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "title,summary,author,date,url,image"
        );
    }

    #[test]
    fn test_csv_round_trip_preserves_every_field() {
        let articles = sample_articles();
        let bytes = render(&articles).unwrap();

        let mut reader = ::csv::Reader::from_reader(bytes.as_slice());
        let records: Vec<ExportRecord> = reader
            .deserialize()
            .collect::<Result<_, _>>()
            .unwrap();

        let expected: Vec<ExportRecord> = articles.iter().map(Article::to_record).collect();
        assert_eq!(records.len(), articles.len());
        assert_eq!(records, expected);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let articles = sample_articles();
        assert_eq!(render(&articles).unwrap(), render(&articles).unwrap());
    }
}
