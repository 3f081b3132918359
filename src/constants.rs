//! Defaults for the festivalsfromindia.com listing and detail pages.

// Genres partitioning the listing site, in scrape order
pub const DEFAULT_GENRES: [&str; 4] = ["music", "multi-arts", "literature", "theatre"];

pub const GENRE_PLACEHOLDER: &str = "{genre}";
pub const PAGE_PLACEHOLDER: &str = "{page}";

pub const DEFAULT_URL_TEMPLATE: &str =
    "https://www.festivalsfromindia.com/genres/{genre}/page/{page}/?orderby=title";

pub const DEFAULT_OUTPUT_PATH: &str = "datasets/festivals_data.csv";
pub const DEFAULT_CONFIG_PATH: &str = "festival_scraper.toml";
pub const CONFIG_PATH_ENV: &str = "FESTIVAL_SCRAPER_CONFIG";
pub const DEFAULT_LOG_DIR: &str = "logs";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_DETAIL_CONCURRENCY: usize = 8;
pub const DEFAULT_GENRE_CONCURRENCY: usize = 4;
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

// Listing schema
pub const LISTING_SCHEMA_NAME: &str = "Festival Data";
pub const LISTING_BASE_SELECTOR: &str = "article.festival";
pub const IMAGE_SELECTOR: &str = "img.wp-post-image";
pub const FESTIVAL_NAME_SELECTOR: &str = "h4";
pub const GENRE_SELECTOR: &str = "span.cf-grids-box-cat-genre";
pub const CITY_SELECTOR: &str =
    "div.cf-grids-box-footer-first span.cf-grids-box-footer-location:nth-of-type(1)";
pub const STATE_SELECTOR: &str =
    "div.cf-grids-box-footer-first span.cf-grids-box-footer-location:nth-of-type(2)";
pub const START_DATE_SELECTOR: &str =
    "div.cf-grids-box-footer-last span.cf-grids-box-footer-date:nth-of-type(1)";
pub const END_DATE_SELECTOR: &str =
    "div.cf-grids-box-footer-last span.cf-grids-box-footer-date:nth-of-type(2)";
pub const DETAIL_URL_SELECTOR: &str = "a.cf-grids-box";

// Detail schema
pub const DETAIL_SCHEMA_NAME: &str = "Festival Detail";
pub const DETAIL_BASE_SELECTOR: &str = "div.fi-content";
pub const DESCRIPTION_SELECTOR: &str = "p:nth-of-type(1)";

// Field names shared by the schemas and the record types
pub const FIELD_IMAGE: &str = "image";
pub const FIELD_FESTIVAL_NAME: &str = "festival_name";
pub const FIELD_GENRE: &str = "genre";
pub const FIELD_CITY: &str = "city";
pub const FIELD_STATE: &str = "state";
pub const FIELD_START_DATE: &str = "start_date";
pub const FIELD_END_DATE: &str = "end_date";
pub const FIELD_DETAIL_URL: &str = "detail_url";
pub const FIELD_DESCRIPTION: &str = "description";

/// Column order of the output CSV. Downstream dashboard pages read these names.
pub const OUTPUT_COLUMNS: [&str; 7] = [
    FIELD_FESTIVAL_NAME,
    FIELD_GENRE,
    FIELD_CITY,
    FIELD_STATE,
    FIELD_START_DATE,
    FIELD_END_DATE,
    FIELD_DESCRIPTION,
];
