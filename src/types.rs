use crate::app::ports::FetchFailure;
use serde::Serialize;

/// A festival as scraped from one listing page item, before any cleanup.
///
/// There is no identifier; two records are the same festival only when every
/// field is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RawFestivalRecord {
    pub image: Option<String>,
    pub festival_name: String,
    pub genre: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub detail_url: String,
}

/// A cleaned record. Unique under full-row equality within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizedFestivalRecord {
    pub image: Option<String>,
    pub festival_name: String,
    pub genre: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Join key for the detail enrichment; never written out.
    pub detail_url: String,
}

impl From<NormalizedFestivalRecord> for RawFestivalRecord {
    fn from(record: NormalizedFestivalRecord) -> Self {
        Self {
            image: record.image,
            festival_name: record.festival_name,
            genre: record.genre,
            city: record.city,
            state: record.state,
            start_date: record.start_date,
            end_date: record.end_date,
            detail_url: record.detail_url,
        }
    }
}

/// The persisted entity: a normalized record plus its description, without
/// the detail URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedFestivalRecord {
    pub image: Option<String>,
    pub festival_name: String,
    pub genre: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

impl EnrichedFestivalRecord {
    pub fn from_normalized(record: NormalizedFestivalRecord, description: Option<String>) -> Self {
        Self {
            image: record.image,
            festival_name: record.festival_name,
            genre: record.genre,
            city: record.city,
            state: record.state,
            start_date: record.start_date,
            end_date: record.end_date,
            description,
        }
    }

    /// Cells in `OUTPUT_COLUMNS` order; absent values become empty cells.
    pub fn to_row(&self) -> [&str; 7] {
        [
            self.festival_name.as_str(),
            self.genre.as_str(),
            self.city.as_deref().unwrap_or(""),
            self.state.as_deref().unwrap_or(""),
            self.start_date.as_deref().unwrap_or(""),
            self.end_date.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or(""),
        ]
    }
}

/// What one listing page yielded.
#[derive(Debug, Default)]
pub struct ListingPage {
    /// Elements matched by the item selector, including items later dropped
    /// for missing required fields.
    pub matched: usize,
    pub records: Vec<RawFestivalRecord>,
}

/// Result of fetching and extracting one listing page.
///
/// Only a `Success` whose item selector matched nothing ends pagination for a
/// genre; a failed fetch is reported separately so it is never mistaken for
/// the last page.
#[derive(Debug)]
pub enum PageOutcome {
    Success(ListingPage),
    Failure(FetchFailure),
}

impl PageOutcome {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, PageOutcome::Success(page) if page.matched == 0)
    }
}
