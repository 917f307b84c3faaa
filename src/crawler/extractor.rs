//! Record extraction from detail pages

use crate::config::ExtractConfig;
use crate::ConfigError;
use scraper::{Html, Selector};
use serde::Serialize;

/// The three text fields scraped from a detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedRecord {
    pub title: String,
    pub sub_title: String,
    pub content: String,
}

/// Capability: pull a record out of a document
///
/// Returns `None` when the page does not carry every required field.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> Option<ExtractedRecord>;
}

/// [`Extractor`] driven by three CSS selectors
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    title: Selector,
    sub_title: Selector,
    content: Selector,
}

impl SelectorExtractor {
    pub fn from_config(config: &ExtractConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title: parse_selector(&config.title_selector)?,
            sub_title: parse_selector(&config.subtitle_selector)?,
            content: parse_selector(&config.content_selector)?,
        })
    }
}

impl Extractor for SelectorExtractor {
    fn extract(&self, html: &str) -> Option<ExtractedRecord> {
        let document = Html::parse_document(html);

        Some(ExtractedRecord {
            title: first_text(&document, &self.title)?,
            sub_title: first_text(&document, &self.sub_title)?,
            content: first_text(&document, &self.content)?,
        })
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Trimmed text of the first element matching `selector`, if non-empty
fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
