use crate::constants::*;
use crate::error::{Result, ScraperError};
use crate::pipeline::schema::ExtractionSchema;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub genres: Vec<String>,
    /// Listing URL with `{genre}` and `{page}` placeholders.
    pub url_template: String,
    pub output_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub detail_concurrency: usize,
    pub genre_concurrency: usize,
    /// A genre is abandoned after this many failed pages in a row.
    pub max_consecutive_failures: u32,
    pub max_pages_per_genre: Option<u32>,
    /// A 404 on a listing page means the genre has no more pages.
    pub listing_not_found_is_end: bool,
    /// Compare detail URLs by canonical form rather than exact text.
    pub canonicalize_join_keys: bool,
    pub listing_schema: ExtractionSchema,
    pub detail_schema: ExtractionSchema,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            genres: DEFAULT_GENRES.iter().map(|g| g.to_string()).collect(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            detail_concurrency: DEFAULT_DETAIL_CONCURRENCY,
            genre_concurrency: DEFAULT_GENRE_CONCURRENCY,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            max_pages_per_genre: None,
            listing_not_found_is_end: true,
            canonicalize_join_keys: true,
            listing_schema: ExtractionSchema::festival_listing(),
            detail_schema: ExtractionSchema::festival_detail(),
        }
    }
}

impl Config {
    /// Loads configuration from, in order of preference: `path`, the file named
    /// by `FESTIVAL_SCRAPER_CONFIG`, or `festival_scraper.toml`. Only the last
    /// may be missing, in which case the built-in defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let config_path = match explicit {
            Some(p) => p,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default_path.exists() {
                    info!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = fs::read_to_string(&config_path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        info!("Loaded configuration from {}", config_path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.genres.is_empty() {
            return Err(ScraperError::Config("at least one genre is required".into()));
        }
        if let Some(index) = self.genres.iter().position(|g| g.trim().is_empty()) {
            return Err(ScraperError::Config(format!("genre #{} is blank", index + 1)));
        }
        for placeholder in [GENRE_PLACEHOLDER, PAGE_PLACEHOLDER] {
            if !self.url_template.contains(placeholder) {
                return Err(ScraperError::Config(format!(
                    "url_template '{}' is missing the {} placeholder",
                    self.url_template, placeholder
                )));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(ScraperError::Config("request_timeout_secs must be positive".into()));
        }
        if self.output_path.file_name().is_none() {
            return Err(ScraperError::Config(format!(
                "output_path '{}' does not name a file",
                self.output_path.display()
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
