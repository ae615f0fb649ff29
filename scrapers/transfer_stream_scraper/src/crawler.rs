use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::ProgressBar;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::{
    error::PipelineError,
    fetcher::HtmlFetcher,
    pagination::{plan_income_pages, plan_stream_pages},
    table_parser::{parse_club_summaries, parse_transfer_edges},
    types::{ClubSummary, CrawlOutput, TransferEdge},
};

/// Collects every club summary and transfer edge for one run.
///
/// Both fan-out stages are driven on the caller's task with at most
/// `max_concurrent` requests in flight. The first error ends the crawl and
/// drops the remaining in-flight requests with it.
pub struct ClubCrawler<'a, F: HtmlFetcher> {
    fetcher: &'a F,
    max_concurrent: usize,
    progress: ProgressBar,
}

impl<'a, F: HtmlFetcher> ClubCrawler<'a, F> {
    pub fn new(fetcher: &'a F, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
            progress: ProgressBar::hidden(),
        }
    }

    /// Ticks `progress` once per club whose transfer streams are complete.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub async fn crawl(&self, target_clubs: usize) -> Result<CrawlOutput, PipelineError> {
        let clubs = self.crawl_clubs(target_clubs).await?;
        let transfers = self.crawl_transfers(&clubs).await?;
        Ok(CrawlOutput { clubs, transfers })
    }

    pub async fn crawl_clubs(&self, target_clubs: usize) -> Result<Vec<ClubSummary>, PipelineError> {
        let urls = plan_income_pages(target_clubs);
        info!("Fetching {} income pages", urls.len());

        let pages: Vec<Vec<ClubSummary>> = stream::iter(urls.iter())
            .map(|url| self.fetch_income_page(url))
            .buffer_unordered(self.max_concurrent)
            .try_collect()
            .await?;

        let mut seen = HashSet::new();
        let mut clubs = Vec::new();
        for club in pages.into_iter().flatten() {
            if seen.insert(club.name.clone()) {
                clubs.push(club);
            } else {
                warn!("Club {} listed more than once, keeping the first entry", club.name);
            }
        }

        info!("Extracted {} clubs", clubs.len());
        Ok(clubs)
    }

    async fn fetch_income_page(&self, url: &str) -> Result<Vec<ClubSummary>, PipelineError> {
        let html = self.fetcher.fetch_html(url).await?;
        let clubs = parse_club_summaries(&html).map_err(|e| PipelineError::parse(url, e))?;
        debug!("{} clubs on {}", clubs.len(), url);
        Ok(clubs)
    }

    pub async fn crawl_transfers(&self, clubs: &[ClubSummary]) -> Result<Vec<TransferEdge>, PipelineError> {
        self.progress.set_length(clubs.len() as u64);

        let per_club: Vec<Vec<TransferEdge>> = stream::iter(clubs.iter())
            .map(|club| self.crawl_club_stream(club))
            .buffer_unordered(self.max_concurrent)
            .try_collect()
            .await?;
        self.progress.finish_and_clear();

        let transfers: Vec<TransferEdge> = per_club.into_iter().flatten().collect();
        info!("Extracted {} transfer rows across {} clubs", transfers.len(), clubs.len());
        Ok(transfers)
    }

    /// All transfer rows into one club. The first stream page has to be
    /// parsed before the rest of the club's pages are known.
    pub async fn crawl_club_stream(&self, club: &ClubSummary) -> Result<Vec<TransferEdge>, PipelineError> {
        let first_url = club.detail_url.as_str();
        let first_page = self.fetcher.fetch_html(first_url).await?;

        let remaining = plan_stream_pages(&first_page, first_url)
            .map_err(|e| PipelineError::parse(first_url, e))?
            .unwrap_or_default();
        debug!("{}: {} further stream pages", club.name, remaining.len());

        let mut transfers =
            parse_transfer_edges(&first_page, &club.name).map_err(|e| PipelineError::parse(first_url, e))?;

        for url in &remaining {
            let html = self.fetcher.fetch_html(url).await?;
            transfers.extend(parse_transfer_edges(&html, &club.name).map_err(|e| PipelineError::parse(url, e))?);
        }

        self.progress.inc(1);
        Ok(transfers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::FetchError,
        fetcher::StaticHtmlFetcher,
        pagination::INCOME_LIST_URL,
    };
    use std::cell::Cell;
    use std::time::Duration;

    fn items_table(rows: &str, pagination: &str) -> String {
        format!(r#"<html><body><table class="items"><tbody>{rows}</tbody></table>{pagination}</body></html>"#)
    }

    fn club_row(name: &str, id: u32) -> String {
        format!(
            r#"<tr><td>{id}</td><td></td><td><a href="/{slug}/transfers/verein/{id}/saison_id/2021">{name}</a></td>
            <td><img alt="Spain"></td><td>€10.00m</td><td>2</td><td>€5.00m</td><td>1</td><td>-€5.00m</td></tr>"#,
            slug = name.to_lowercase().replace(' ', "-"),
        )
    }

    fn stream_url(name: &str, id: u32) -> String {
        format!(
            "https://www.transfermarkt.us/{}/transferstroeme/verein/{}/saisonIdVon/2016/saisonIdBis/2021/zuab/zu/verein_id//plus/0/",
            name.to_lowercase().replace(' ', "-"),
            id
        )
    }

    fn stream_row(origin: &str, arrivals: u32, departures: u32) -> String {
        format!(
            r#"<tr><td>1</td><td></td><td>{origin}</td><td>{arrivals}</td><td>{departures}</td><td>€1.00m</td></tr>"#
        )
    }

    fn pager(last: u32) -> String {
        format!(r#"<ul class="tm-pagination"><li><a href="x/page/{last}">{last}</a></li></ul>"#)
    }

    #[tokio::test]
    async fn test_crawl_follows_stream_pagination() {
        let sevilla = stream_url("Sevilla FC", 368);
        let fetcher = StaticHtmlFetcher::new()
            .with_page(INCOME_LIST_URL, items_table(&club_row("Sevilla FC", 368), ""))
            .with_page(sevilla.clone(), items_table(&stream_row("Real Betis", 2, 0), &pager(3)))
            .with_page(format!("{sevilla}page/2"), items_table(&stream_row("Villarreal", 1, 0), &pager(3)))
            .with_page(format!("{sevilla}page/3"), items_table(&stream_row("Getafe", 0, 1), &pager(3)));

        let output = ClubCrawler::new(&fetcher, 4).crawl(25).await.unwrap();

        assert_eq!(output.clubs.len(), 1);
        let origins: Vec<&str> = output.transfers.iter().map(|t| t.origin_club.as_str()).collect();
        assert_eq!(origins, vec!["Real Betis", "Villarreal", "Getafe"]);
        assert!(output.transfers.iter().all(|t| t.destination_club == "Sevilla FC"));
        assert_eq!(fetcher.requested().len(), 4);
    }

    #[tokio::test]
    async fn test_club_without_pagination_fetches_one_page() {
        let valencia = stream_url("Valencia CF", 1049);
        let fetcher = StaticHtmlFetcher::new()
            .with_page(valencia.clone(), items_table(&stream_row("Levante", 1, 0), ""));
        let club = ClubSummary {
            name: "Valencia CF".to_string(),
            country: "Spain".to_string(),
            expenditure: 0.0,
            arrivals: 1,
            income: 0.0,
            departures: 0,
            balance: 0.0,
            top_tier: true,
            detail_url: valencia.clone(),
        };

        let transfers = ClubCrawler::new(&fetcher, 4).crawl_club_stream(&club).await.unwrap();

        assert_eq!(transfers.len(), 1);
        assert_eq!(fetcher.requested(), vec![valencia]);
    }

    #[tokio::test]
    async fn test_duplicate_clubs_across_pages_are_collapsed() {
        let fetcher = StaticHtmlFetcher::new()
            .with_page(INCOME_LIST_URL, items_table(&club_row("Sevilla FC", 368), ""))
            .with_page(
                format!("{INCOME_LIST_URL}/page/2"),
                items_table(&[club_row("Sevilla FC", 368), club_row("Real Betis", 150)].concat(), ""),
            );

        let clubs = ClubCrawler::new(&fetcher, 2).crawl_clubs(50).await.unwrap();

        let mut names: Vec<&str> = clubs.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Real Betis", "Sevilla FC"]);
    }

    #[tokio::test]
    async fn test_missing_stream_page_fails_the_crawl() {
        let fetcher = StaticHtmlFetcher::new()
            .with_page(INCOME_LIST_URL, items_table(&club_row("Sevilla FC", 368), ""));

        let err = ClubCrawler::new(&fetcher, 4).crawl(25).await.unwrap_err();

        assert!(matches!(err, PipelineError::Fetch(FetchError::Status { .. })));
    }

    #[tokio::test]
    async fn test_malformed_income_page_fails_the_crawl() {
        let fetcher = StaticHtmlFetcher::new().with_page(INCOME_LIST_URL, "<html><body>maintenance</body></html>");

        let err = ClubCrawler::new(&fetcher, 4).crawl(25).await.unwrap_err();

        match err {
            PipelineError::Parse { url, .. } => assert_eq!(url, INCOME_LIST_URL),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Answers every URL with an empty listing after a short delay, tracking
    /// how many requests overlap.
    #[derive(Default)]
    struct SlowFetcher {
        in_flight: Cell<usize>,
        peak: Cell<usize>,
    }

    impl HtmlFetcher for SlowFetcher {
        async fn fetch_html(&self, _url: &str) -> Result<String, FetchError> {
            self.in_flight.set(self.in_flight.get() + 1);
            self.peak.set(self.peak.get().max(self.in_flight.get()));
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.set(self.in_flight.get() - 1);
            Ok(items_table("", ""))
        }
    }

    #[tokio::test]
    async fn test_in_flight_requests_are_bounded() {
        let fetcher = SlowFetcher::default();
        let clubs: Vec<ClubSummary> = (0..10)
            .map(|i| ClubSummary {
                name: format!("Club {i}"),
                country: "Spain".to_string(),
                expenditure: 0.0,
                arrivals: 0,
                income: 0.0,
                departures: 0,
                balance: 0.0,
                top_tier: true,
                detail_url: format!("https://example.test/{i}/"),
            })
            .collect();

        let transfers = ClubCrawler::new(&fetcher, 3).crawl_transfers(&clubs).await.unwrap();

        assert!(transfers.is_empty());
        assert_eq!(fetcher.peak.get(), 3);
    }
}
