// Festival acquisition pipeline: paginate, normalize, enrich, write

pub mod enrich;
pub mod listing;
pub mod normalize;
pub mod paginator;
pub mod schema;
pub mod writer;

use crate::app::ports::Fetcher;
use crate::config::Config;
use crate::error::Result;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use self::enrich::DetailEnricher;
use self::listing::ListingExtractor;
use self::paginator::{GenreReport, Paginator};

/// Summary of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub output_file: String,
    pub raw_records: usize,
    pub unique_records: usize,
    pub written_records: usize,
    pub described_records: usize,
    pub failed_pages: u32,
    pub failed_detail_urls: Vec<String>,
    pub genres: Vec<GenreReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct Pipeline {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
}

impl Pipeline {
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Runs every stage once and writes the output file.
    ///
    /// Page and detail failures only leave gaps in the data; the run fails on
    /// an invalid schema or when the output cannot be written.
    #[instrument(skip(self), fields(output = %self.config.output_path.display()))]
    pub async fn run(&self) -> Result<PipelineResult> {
        let started_at = Utc::now();
        let timer = std::time::Instant::now();
        let config = &self.config;

        // Compile both schemas before touching the network
        let extractor = ListingExtractor::new(&config.listing_schema)?;
        let enricher = DetailEnricher::new(
            self.fetcher.clone(),
            &config.detail_schema,
            config.detail_concurrency,
            config.canonicalize_join_keys,
        )?;
        let paginator = Paginator::new(self.fetcher.clone(), extractor, config);

        info!("Collecting data for {} genres", config.genres.len());
        let pagination = paginator.run(&config.genres).await;
        let raw_records = pagination.records.len();
        let failed_pages: u32 = pagination.reports.iter().map(|r| r.failed_pages).sum();
        counter!("festival_records_raw_total").increment(raw_records as u64);
        if failed_pages > 0 {
            warn!("{} listing pages failed and were skipped", failed_pages);
        }

        let normalized = normalize::normalize_records(pagination.records);
        let unique_records = normalized.len();
        info!(
            "Normalized {} raw records into {} unique festivals",
            raw_records, unique_records
        );

        let enrichment = enricher.enrich(normalized).await;
        let described_records = enrichment
            .records
            .iter()
            .filter(|r| r.description.is_some())
            .count();

        writer::write_csv(&config.output_path, &enrichment.records)?;
        let output_file = config.output_path.display().to_string();
        info!(
            "Saved {} festivals to {}",
            enrichment.records.len(),
            output_file
        );

        histogram!("festival_pipeline_duration_seconds").record(timer.elapsed().as_secs_f64());

        Ok(PipelineResult {
            output_file,
            raw_records,
            unique_records,
            written_records: enrichment.records.len(),
            described_records,
            failed_pages,
            failed_detail_urls: enrichment.failed_urls,
            genres: pagination.reports,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
