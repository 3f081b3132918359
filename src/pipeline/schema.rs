//! Declarative CSS extraction.
//!
//! A schema names a repeating item selector plus a list of fields, each with
//! its own selector and extraction kind. Schemas deserialize from TOML in the
//! same shape the festival site configuration uses, so adding a field or a
//! source is a configuration change.

use crate::constants::*;
use crate::error::{Result, ScraperError};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::collections::HashMap;

/// Values pulled out of one item element, keyed by field name. Fields whose
/// selector matched nothing (or matched only whitespace) are absent.
pub type ExtractedItem = HashMap<String, String>;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ExtractionSchema {
    pub name: String,
    #[serde(alias = "baseSelector")]
    pub base_selector: String,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    /// Evaluated inside the item element; empty means the item itself.
    #[serde(default)]
    pub selector: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Attribute to read when `kind` is `attribute`.
    #[serde(default)]
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Attribute,
    #[serde(alias = "img")]
    Image,
}

impl FieldSpec {
    pub fn text(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            kind: FieldKind::Text,
            attribute: None,
        }
    }

    pub fn attribute(name: &str, selector: &str, attribute: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            kind: FieldKind::Attribute,
            attribute: Some(attribute.to_string()),
        }
    }

    pub fn image(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            kind: FieldKind::Image,
            attribute: None,
        }
    }
}

impl ExtractionSchema {
    /// Listing page schema for festivalsfromindia.com genre pages.
    pub fn festival_listing() -> Self {
        Self {
            name: LISTING_SCHEMA_NAME.to_string(),
            base_selector: LISTING_BASE_SELECTOR.to_string(),
            fields: vec![
                FieldSpec::image(FIELD_IMAGE, IMAGE_SELECTOR),
                FieldSpec::text(FIELD_FESTIVAL_NAME, FESTIVAL_NAME_SELECTOR),
                FieldSpec::text(FIELD_GENRE, GENRE_SELECTOR),
                FieldSpec::text(FIELD_CITY, CITY_SELECTOR),
                FieldSpec::text(FIELD_STATE, STATE_SELECTOR),
                FieldSpec::text(FIELD_START_DATE, START_DATE_SELECTOR),
                FieldSpec::text(FIELD_END_DATE, END_DATE_SELECTOR),
                FieldSpec::attribute(FIELD_DETAIL_URL, DETAIL_URL_SELECTOR, "href"),
            ],
        }
    }

    /// Detail page schema: the first paragraph of the content block.
    pub fn festival_detail() -> Self {
        Self {
            name: DETAIL_SCHEMA_NAME.to_string(),
            base_selector: DETAIL_BASE_SELECTOR.to_string(),
            fields: vec![FieldSpec::text(FIELD_DESCRIPTION, DESCRIPTION_SELECTOR)],
        }
    }

    /// Parses every selector up front so a bad schema fails before any fetch.
    pub fn compile(&self) -> Result<CompiledSchema> {
        let base = parse_selector(&self.base_selector)?;
        let fields = self
            .fields
            .iter()
            .map(|field| -> Result<CompiledField> {
                let selector = match field.selector.trim() {
                    "" => None,
                    s => Some(parse_selector(s)?),
                };
                let kind = match field.kind {
                    FieldKind::Text => CompiledKind::Text,
                    FieldKind::Image => CompiledKind::Image,
                    FieldKind::Attribute => {
                        let attribute = field
                            .attribute
                            .as_deref()
                            .map(str::trim)
                            .filter(|a| !a.is_empty())
                            .ok_or_else(|| {
                                ScraperError::Config(format!(
                                    "schema '{}': field '{}' has type attribute but no attribute name",
                                    self.name, field.name
                                ))
                            })?;
                        CompiledKind::Attribute(attribute.to_string())
                    }
                };
                Ok(CompiledField {
                    name: field.name.clone(),
                    selector,
                    kind,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CompiledSchema {
            name: self.name.clone(),
            base,
            fields,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScraperError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// A schema with its selectors parsed, ready to apply to any number of pages.
#[derive(Debug)]
pub struct CompiledSchema {
    name: String,
    base: Selector,
    fields: Vec<CompiledField>,
}

#[derive(Debug)]
struct CompiledField {
    name: String,
    selector: Option<Selector>,
    kind: CompiledKind,
}

#[derive(Debug)]
enum CompiledKind {
    Text,
    Attribute(String),
    Image,
}

// Lazy-loading themes keep the real source in a data attribute
const IMAGE_SOURCE_ATTRIBUTES: [&str; 3] = ["src", "data-src", "data-lazy-src"];

impl CompiledSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One item per element matched by the base selector, in document order.
    /// Every field of an item is read from that same element.
    pub fn extract(&self, html: &str) -> Vec<ExtractedItem> {
        let document = Html::parse_document(html);
        document
            .select(&self.base)
            .map(|element| self.extract_item(element))
            .collect()
    }

    fn extract_item(&self, element: ElementRef<'_>) -> ExtractedItem {
        let mut item = ExtractedItem::new();
        for field in &self.fields {
            let target = match &field.selector {
                Some(selector) => element.select(selector).next(),
                None => Some(element),
            };
            if let Some(value) = target.and_then(|el| field.kind.read(el)) {
                item.insert(field.name.clone(), value);
            }
        }
        item
    }
}

impl CompiledKind {
    fn read(&self, element: ElementRef<'_>) -> Option<String> {
        match self {
            CompiledKind::Text => non_empty(collapse_whitespace(&element.text().collect::<String>())),
            CompiledKind::Attribute(name) => element.value().attr(name).and_then(|v| non_empty(v.trim().to_string())),
            CompiledKind::Image => IMAGE_SOURCE_ATTRIBUTES
                .iter()
                .filter_map(|attr| element.value().attr(attr))
                .map(str::trim)
                .find(|v| !v.is_empty())
                .map(str::to_string),
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
