use anyhow::Context;
use clap::Parser;
use festival_scraper::config::Config;
use festival_scraper::constants::DEFAULT_LOG_DIR;
use festival_scraper::infra::http_client::ReqwestFetcher;
use festival_scraper::logging;
use festival_scraper::pipeline::Pipeline;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "festival_scraper")]
#[command(about = "Scrapes festival listings and writes a normalized CSV")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output CSV path (overrides config)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Genres to scrape, comma-separated (overrides config)
    #[arg(long, value_delimiter = ',')]
    genres: Option<Vec<String>>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let _guard = logging::init_logging(DEFAULT_LOG_DIR);

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if let Some(genres) = cli.genres {
        config.genres = genres.into_iter().map(|g| g.trim().to_string()).collect();
    }
    config.validate().context("validating configuration")?;

    let fetcher = ReqwestFetcher::new(&config.user_agent, config.request_timeout())
        .context("building HTTP client")?;
    let pipeline = Pipeline::new(config, Arc::new(fetcher));

    info!("Collecting data...");
    let result = match pipeline.run().await {
        Ok(result) => result,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            return Err(e).context("running festival pipeline");
        }
    };

    println!("✅ Saved {} festivals to {}", result.written_records, result.output_file);
    println!("   Raw records: {}", result.raw_records);
    println!("   Unique: {}", result.unique_records);
    println!("   With description: {}", result.described_records);
    if result.failed_pages > 0 || !result.failed_detail_urls.is_empty() {
        println!(
            "⚠️  {} listing pages and {} detail pages failed",
            result.failed_pages,
            result.failed_detail_urls.len()
        );
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}
