use indicatif::ProgressBar;
use tracing::info;

use crate::{
    crawler::ClubCrawler,
    error::PipelineError,
    fetcher::HtmlFetcher,
    graph_store::GraphStore,
    loader::{GraphLoader, LoadReport},
};

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub top_clubs: usize,
    pub max_concurrent: usize,
}

/// One full run: crawl everything, then rebuild the store. The store is
/// only touched once the crawl has succeeded.
pub async fn run_pipeline<F, S>(
    fetcher: &F,
    store: &S,
    options: RunOptions,
    progress: ProgressBar,
) -> Result<LoadReport, PipelineError>
where
    F: HtmlFetcher,
    S: GraphStore,
{
    let records = ClubCrawler::new(fetcher, options.max_concurrent)
        .with_progress(progress)
        .crawl(options.top_clubs)
        .await?;
    info!(
        "Crawl finished: {} clubs, {} transfer rows",
        records.clubs.len(),
        records.transfers.len()
    );

    let report = GraphLoader::new(store).load(&records).await?;
    let counts = store.counts().await?;
    info!("Graph rebuilt: {} clubs, {} transfers", counts.clubs, counts.transfers);
    Ok(report)
}
