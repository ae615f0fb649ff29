use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transfer_stream_scraper::{
    config::ScraperConfig,
    crawler::ClubCrawler,
    export,
    fetcher::WebHtmlFetcher,
    graph_store::GraphClient,
    pipeline::{run_pipeline, RunOptions},
};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl the transfer streams and rebuild the graph
    Run {
        /// Number of clubs to track from the top of the income ranking
        #[arg(short, long)]
        top: Option<usize>,
    },
    /// Crawl only and write the records as CSV
    Crawl {
        /// Number of clubs to track from the top of the income ranking
        #[arg(short, long)]
        top: Option<usize>,
        /// Directory for clubs.csv and transfers.csv
        #[arg(short, long, default_value = "transfer_streams")]
        output: PathBuf,
    },
}

fn club_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} clubs ({eta})")
    {
        pb.set_style(style);
    }
    pb
}

fn log_fetch_metrics(fetcher: &WebHtmlFetcher) {
    match serde_json::to_string(&fetcher.metrics()) {
        Ok(metrics) => info!("Fetch metrics: {}", metrics),
        Err(e) => warn!("Could not serialize fetch metrics: {}", e),
    }
}

async fn execute(command: Commands, config: &ScraperConfig) -> Result<()> {
    let fetcher = WebHtmlFetcher::new(config)?;
    let max_concurrent = config.rate_limits.max_concurrent_requests;

    match command {
        Commands::Run { top } => {
            let options = RunOptions {
                top_clubs: top.unwrap_or(config.scraping.top_clubs),
                max_concurrent,
            };
            let client = GraphClient::connect(&config.neo4j)
                .await
                .context("Failed to connect to Neo4j")?;

            let result = run_pipeline(&fetcher, &client, options, club_progress_bar()).await;
            client.close();
            log_fetch_metrics(&fetcher);

            let report = result.context("Run failed, the graph may be partially rebuilt")?;
            info!("Load report: {}", serde_json::to_string(&report)?);
        }
        Commands::Crawl { top, output } => {
            let top_clubs = top.unwrap_or(config.scraping.top_clubs);
            let records = ClubCrawler::new(&fetcher, max_concurrent)
                .with_progress(club_progress_bar())
                .crawl(top_clubs)
                .await;
            log_fetch_metrics(&fetcher);

            export::write_csv(&records.context("Crawl failed")?, &output)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = ScraperConfig::from_env();

    // All fetches interleave on this one thread.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        tokio::select! {
            result = execute(cli.command, &config) => result,
            _ = tokio::signal::ctrl_c() => Err(anyhow!("Interrupted, in-flight requests abandoned")),
        }
    })
}
