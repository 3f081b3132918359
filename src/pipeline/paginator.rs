use crate::app::ports::{FetchFailure, Fetcher};
use crate::config::Config;
use crate::constants::{GENRE_PLACEHOLDER, PAGE_PLACEHOLDER};
use crate::pipeline::listing::ListingExtractor;
use crate::types::{ListingPage, PageOutcome, RawFestivalRecord};
use futures::stream::{self, StreamExt};
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Why pagination stopped for a genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenreStop {
    /// A page was fetched successfully and had no listing items at all.
    Exhausted,
    TooManyFailures,
    PageLimit,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreReport {
    pub genre: String,
    /// Pages whose item selector matched at least once.
    pub pages_scraped: u32,
    pub failed_pages: u32,
    pub records: usize,
    pub stop: GenreStop,
}

#[derive(Debug, Default)]
pub struct PaginationOutput {
    pub records: Vec<RawFestivalRecord>,
    pub reports: Vec<GenreReport>,
}

/// Walks `page = 1, 2, ...` for each genre until a page is empty.
pub struct Paginator {
    fetcher: Arc<dyn Fetcher>,
    extractor: ListingExtractor,
    url_template: String,
    genre_concurrency: usize,
    max_consecutive_failures: u32,
    max_pages: Option<u32>,
    not_found_is_end: bool,
}

impl Paginator {
    pub fn new(fetcher: Arc<dyn Fetcher>, extractor: ListingExtractor, config: &Config) -> Self {
        Self {
            fetcher,
            extractor,
            url_template: config.url_template.clone(),
            genre_concurrency: config.genre_concurrency.max(1),
            max_consecutive_failures: config.max_consecutive_failures.max(1),
            max_pages: config.max_pages_per_genre,
            not_found_is_end: config.listing_not_found_is_end,
        }
    }

    pub fn page_url(&self, genre: &str, page: u32) -> String {
        self.url_template
            .replace(GENRE_PLACEHOLDER, genre)
            .replace(PAGE_PLACEHOLDER, &page.to_string())
    }

    /// Fetch and extract one listing page, keeping a failed fetch distinct
    /// from a page that simply has no festivals on it. A 404 counts as a page
    /// with no items when `listing_not_found_is_end` is set.
    pub async fn fetch_page(&self, url: &str) -> PageOutcome {
        match self.fetcher.fetch(url).await {
            Ok(page) => PageOutcome::Success(self.extractor.extract(&page)),
            Err(FetchFailure::Status(404)) if self.not_found_is_end => {
                debug!("{} returned 404, treating as past the last page", url);
                PageOutcome::Success(ListingPage::default())
            }
            Err(failure) => PageOutcome::Failure(failure),
        }
    }

    #[instrument(skip(self))]
    pub async fn paginate_genre(&self, genre: &str) -> (Vec<RawFestivalRecord>, GenreReport) {
        let mut records = Vec::new();
        let mut pages_scraped = 0;
        let mut failed_pages = 0;
        let mut consecutive_failures = 0;
        let mut page = 1;

        let stop = loop {
            if self.max_pages.is_some_and(|max| page > max) {
                info!("Reached page limit for genre {}", genre);
                break GenreStop::PageLimit;
            }

            let url = self.page_url(genre, page);
            info!("Scraping: {}", url);
            let outcome = self.fetch_page(&url).await;

            if outcome.is_exhausted() {
                info!("No more data on page {} for genre {}", page, genre);
                break GenreStop::Exhausted;
            }

            match outcome {
                PageOutcome::Success(listing) => {
                    consecutive_failures = 0;
                    pages_scraped += 1;
                    counter!("festival_pages_fetched_total", "genre" => genre.to_string()).increment(1);
                    let count = listing.records.len();
                    records.extend(listing.records);
                    info!(
                        "Retrieved {} festivals from {} (Total so far: {})",
                        count,
                        url,
                        records.len()
                    );
                }
                PageOutcome::Failure(failure) => {
                    failed_pages += 1;
                    consecutive_failures += 1;
                    counter!("festival_page_failures_total", "genre" => genre.to_string()).increment(1);
                    warn!("Failed to extract {}: {}", url, failure);
                    if consecutive_failures >= self.max_consecutive_failures {
                        warn!(
                            "Abandoning genre {} after {} consecutive failed pages",
                            genre, consecutive_failures
                        );
                        break GenreStop::TooManyFailures;
                    }
                }
            }
            page += 1;
        };

        let report = GenreReport {
            genre: genre.to_string(),
            pages_scraped,
            failed_pages,
            records: records.len(),
            stop,
        };
        (records, report)
    }

    /// Genres run concurrently; each keeps its own accumulator and the results
    /// are concatenated in the order the genres were given.
    pub async fn run(&self, genres: &[String]) -> PaginationOutput {
        let per_genre: Vec<(Vec<RawFestivalRecord>, GenreReport)> = stream::iter(genres)
            .map(|genre| self.paginate_genre(genre))
            .buffered(self.genre_concurrency)
            .collect()
            .await;

        let mut output = PaginationOutput::default();
        for (records, report) in per_genre {
            output.records.extend(records);
            output.reports.push(report);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::FetchedPage;
    use crate::pipeline::schema::ExtractionSchema;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies; unknown URLs come back as an empty listing page,
    /// URLs in `failing` return a 503 and URLs in `missing` a 404.
    struct ScriptedFetcher {
        pages: HashMap<String, String>,
        failing: Vec<String>,
        missing: Vec<String>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(pages: Vec<(String, String)>, failing: Vec<String>) -> Self {
            Self {
                pages: pages.into_iter().collect(),
                failing,
                missing: Vec::new(),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn with_missing(mut self, urls: &[&str]) -> Self {
            self.missing = urls.iter().map(|u| u.to_string()).collect();
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchFailure> {
            self.requested.lock().unwrap().push(url.to_string());
            if self.failing.iter().any(|u| u == url) {
                return Err(FetchFailure::Status(503));
            }
            if self.missing.iter().any(|u| u == url) {
                return Err(FetchFailure::Status(404));
            }
            let body = self
                .pages
                .get(url)
                .cloned()
                .unwrap_or_else(|| "<html><body></body></html>".to_string());
            Ok(FetchedPage {
                url: url.to_string(),
                body,
            })
        }
    }

    fn listing(names: &[&str]) -> String {
        let articles: String = names
            .iter()
            .map(|name| {
                format!(
                    r#"<article class="festival"><a class="cf-grids-box" href="https://example.com/{name}/">
                    <span class="cf-grids-box-cat-genre">Music</span><h4>{name}</h4></a></article>"#
                )
            })
            .collect();
        format!("<html><body>{articles}</body></html>")
    }

    fn config() -> Config {
        Config {
            url_template: "https://example.com/genres/{genre}/page/{page}/".to_string(),
            ..Config::default()
        }
    }

    fn paginator(fetcher: Arc<ScriptedFetcher>, config: &Config) -> Paginator {
        let extractor = ListingExtractor::new(&ExtractionSchema::festival_listing()).unwrap();
        Paginator::new(fetcher, extractor, config)
    }

    #[test]
    fn test_page_url_substitutes_placeholders() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![], vec![]));
        let paginator = paginator(fetcher, &Config::default());
        assert_eq!(
            paginator.page_url("multi-arts", 3),
            "https://www.festivalsfromindia.com/genres/multi-arts/page/3/?orderby=title"
        );
    }

    #[tokio::test]
    async fn test_stops_after_first_empty_page() {
        let fetcher = Arc::new(ScriptedFetcher::new(
            vec![
                ("https://example.com/genres/music/page/1/".into(), listing(&["a", "b"])),
                ("https://example.com/genres/music/page/2/".into(), listing(&["c"])),
            ],
            vec![],
        ));
        let config = config();
        let paginator = paginator(fetcher.clone(), &config);

        let (records, report) = paginator.paginate_genre("music").await;

        assert_eq!(records.len(), 3);
        assert_eq!(report.pages_scraped, 2);
        assert_eq!(report.stop, GenreStop::Exhausted);
        assert_eq!(
            fetcher.requested(),
            vec![
                "https://example.com/genres/music/page/1/",
                "https://example.com/genres/music/page/2/",
                "https://example.com/genres/music/page/3/",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_page_does_not_end_genre() {
        let fetcher = Arc::new(ScriptedFetcher::new(
            vec![
                ("https://example.com/genres/music/page/1/".into(), listing(&["a"])),
                ("https://example.com/genres/music/page/3/".into(), listing(&["c"])),
            ],
            vec!["https://example.com/genres/music/page/2/".into()],
        ));
        let config = config();
        let paginator = paginator(fetcher.clone(), &config);

        let (records, report) = paginator.paginate_genre("music").await;

        let names: Vec<_> = records.iter().map(|r| r.festival_name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(report.failed_pages, 1);
        assert_eq!(report.stop, GenreStop::Exhausted);
        assert_eq!(fetcher.requested().len(), 4);
    }

    #[tokio::test]
    async fn test_consecutive_failures_abandon_genre() {
        let failing = (1..=10)
            .map(|p| format!("https://example.com/genres/music/page/{p}/"))
            .collect();
        let fetcher = Arc::new(ScriptedFetcher::new(vec![], failing));
        let config = Config {
            max_consecutive_failures: 3,
            ..config()
        };
        let paginator = paginator(fetcher.clone(), &config);

        let (records, report) = paginator.paginate_genre("music").await;

        assert!(records.is_empty());
        assert_eq!(report.stop, GenreStop::TooManyFailures);
        assert_eq!(fetcher.requested().len(), 3);
    }

    #[tokio::test]
    async fn test_page_limit_caps_pagination() {
        let pages = (1..=5)
            .map(|p| (format!("https://example.com/genres/music/page/{p}/"), listing(&["x"])))
            .collect();
        let fetcher = Arc::new(ScriptedFetcher::new(pages, vec![]));
        let config = Config {
            max_pages_per_genre: Some(2),
            ..config()
        };
        let paginator = paginator(fetcher.clone(), &config);

        let (records, report) = paginator.paginate_genre("music").await;

        assert_eq!(records.len(), 2);
        assert_eq!(report.stop, GenreStop::PageLimit);
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_page_of_incomplete_items_does_not_end_genre() {
        let incomplete = r#"<html><body><article class="festival"><a class="cf-grids-box" href="https://example.com/x/">
            <h4>No genre here</h4></a></article></body></html>"#;
        let fetcher = Arc::new(ScriptedFetcher::new(
            vec![
                ("https://example.com/genres/music/page/1/".into(), incomplete.to_string()),
                ("https://example.com/genres/music/page/2/".into(), listing(&["b"])),
            ],
            vec![],
        ));
        let config = config();
        let paginator = paginator(fetcher.clone(), &config);

        let (records, report) = paginator.paginate_genre("music").await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].festival_name, "b");
        assert_eq!(report.pages_scraped, 2);
        assert_eq!(report.stop, GenreStop::Exhausted);
        assert_eq!(fetcher.requested().len(), 3);
    }

    #[tokio::test]
    async fn test_not_found_past_last_page_ends_genre() {
        let fetcher = Arc::new(
            ScriptedFetcher::new(
                vec![("https://example.com/genres/music/page/1/".into(), listing(&["a"]))],
                vec![],
            )
            .with_missing(&["https://example.com/genres/music/page/2/"]),
        );
        let config = config();
        let paginator = paginator(fetcher.clone(), &config);

        let (records, report) = paginator.paginate_genre("music").await;

        assert_eq!(records.len(), 1);
        assert_eq!(report.failed_pages, 0);
        assert_eq!(report.stop, GenreStop::Exhausted);
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_skipped_when_not_treated_as_end() {
        let fetcher = Arc::new(
            ScriptedFetcher::new(
                vec![
                    ("https://example.com/genres/music/page/1/".into(), listing(&["a"])),
                    ("https://example.com/genres/music/page/3/".into(), listing(&["c"])),
                ],
                vec![],
            )
            .with_missing(&["https://example.com/genres/music/page/2/"]),
        );
        let config = Config {
            listing_not_found_is_end: false,
            ..config()
        };
        let paginator = paginator(fetcher.clone(), &config);

        let (records, report) = paginator.paginate_genre("music").await;

        let names: Vec<_> = records.iter().map(|r| r.festival_name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(report.failed_pages, 1);
        assert_eq!(report.stop, GenreStop::Exhausted);
        assert_eq!(fetcher.requested().len(), 4);
    }

    #[tokio::test]
    async fn test_run_concatenates_genres_in_order() {
        let fetcher = Arc::new(ScriptedFetcher::new(
            vec![
                ("https://example.com/genres/music/page/1/".into(), listing(&["m1"])),
                ("https://example.com/genres/theatre/page/1/".into(), listing(&["t1", "t2"])),
            ],
            vec![],
        ));
        let config = config();
        let paginator = paginator(fetcher, &config);

        let output = paginator
            .run(&["music".to_string(), "theatre".to_string()])
            .await;

        let names: Vec<_> = output.records.iter().map(|r| r.festival_name.as_str()).collect();
        assert_eq!(names, vec!["m1", "t1", "t2"]);
        assert_eq!(output.reports[0].genre, "music");
        assert_eq!(output.reports[1].records, 2);
    }
}
