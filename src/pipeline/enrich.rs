use crate::app::ports::{FetchFailure, Fetcher};
use crate::constants::FIELD_DESCRIPTION;
use crate::error::Result;
use crate::pipeline::schema::{CompiledSchema, ExtractionSchema};
use crate::types::{EnrichedFestivalRecord, NormalizedFestivalRecord};
use futures::stream::{self, StreamExt};
use metrics::counter;
use scraper::Html;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

const QUOTE_CHARS: [char; 6] = ['\'', '"', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}'];

#[derive(Error, Debug)]
enum DetailFailure {
    #[error("{0}")]
    Fetch(#[from] FetchFailure),

    #[error("no description found on page")]
    Missing,
}

#[derive(Debug, Default)]
pub struct EnrichmentOutput {
    pub records: Vec<EnrichedFestivalRecord>,
    /// Detail URLs whose description could not be obtained, one per join key.
    pub failed_urls: Vec<String>,
}

/// Fetches each festival's detail page and attaches its description.
pub struct DetailEnricher {
    fetcher: Arc<dyn Fetcher>,
    schema: CompiledSchema,
    concurrency: usize,
    canonicalize: bool,
}

impl DetailEnricher {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        schema: &ExtractionSchema,
        concurrency: usize,
        canonicalize: bool,
    ) -> Result<Self> {
        Ok(Self {
            fetcher,
            schema: schema.compile()?,
            concurrency: concurrency.max(1),
            canonicalize,
        })
    }

    pub fn join_key(&self, url: &str) -> String {
        if self.canonicalize {
            canonical_url(url)
        } else {
            url.to_string()
        }
    }

    /// Every record comes back, in order, with `description` set when its
    /// detail page yielded one. Each distinct join key is fetched once.
    #[instrument(skip_all, fields(records = records.len()))]
    pub async fn enrich(&self, records: Vec<NormalizedFestivalRecord>) -> EnrichmentOutput {
        let mut seen = HashSet::new();
        let targets: Vec<(String, String)> = records
            .iter()
            .filter_map(|record| {
                let key = self.join_key(&record.detail_url);
                seen.insert(key.clone()).then(|| (key, record.detail_url.clone()))
            })
            .collect();
        info!("Fetching {} distinct detail pages", targets.len());

        let results: Vec<(String, String, std::result::Result<String, DetailFailure>)> =
            stream::iter(targets)
                .map(|(key, url)| async move {
                    let outcome = self.fetch_description(&url).await;
                    (key, url, outcome)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        let mut descriptions = HashMap::with_capacity(results.len());
        let mut failed_urls = Vec::new();
        for (key, url, outcome) in results {
            match outcome {
                Ok(description) => {
                    debug!("{}: {:?}", url, description);
                    descriptions.insert(key, description);
                }
                Err(failure) => {
                    warn!("Error processing result from {}: {}", url, failure);
                    counter!("festival_detail_failures_total").increment(1);
                    failed_urls.push(url);
                }
            }
        }
        failed_urls.sort();

        let records = records
            .into_iter()
            .map(|record| {
                let description = descriptions.get(&self.join_key(&record.detail_url)).cloned();
                EnrichedFestivalRecord::from_normalized(record, description)
            })
            .collect();

        EnrichmentOutput {
            records,
            failed_urls,
        }
    }

    async fn fetch_description(&self, url: &str) -> std::result::Result<String, DetailFailure> {
        let page = self.fetcher.fetch(url).await?;
        self.schema
            .extract(&page.body)
            .into_iter()
            .next()
            .and_then(|mut item| item.remove(FIELD_DESCRIPTION))
            .and_then(|raw| clean_description(&raw))
            .ok_or(DetailFailure::Missing)
    }
}

/// Decode entities, drop quote characters, trim. Empty results are absent.
pub fn clean_description(raw: &str) -> Option<String> {
    let cleaned = strip_quotes(&decode_html_entities(raw)).trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Decodes named and numeric character references left in extracted text.
///
/// The text goes through the HTML tokenizer as a fragment; `<` is escaped
/// first so nothing in it can be taken for markup.
pub fn decode_html_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(&text.replace('<', "&lt;"));
    fragment.root_element().text().collect()
}

pub fn strip_quotes(text: &str) -> String {
    text.chars().filter(|c| !QUOTE_CHARS.contains(c)).collect()
}

/// Canonical form used to match detail URLs: scheme and host lowercased,
/// fragment dropped, trailing slash removed from non-root paths. Strings that
/// do not parse as URLs are used as-is.
pub fn canonical_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url.trim()) else {
        return url.to_string();
    };
    parsed.set_fragment(None);
    let path = parsed.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        parsed.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
    }
    parsed.into()
}
