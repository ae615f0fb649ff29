use anyhow::{anyhow, Context};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::StatusCode;
use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::debug;

use crate::{
    config::ScraperConfig,
    error::FetchError,
    metrics::{FetchMetrics, MetricsCollector},
};

#[allow(async_fn_in_trait)]
pub trait HtmlFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches pages over HTTP through one shared client. Every request waits
/// on a common rate limiter and is bounded by the configured timeout.
pub struct WebHtmlFetcher {
    client: reqwest::Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    metrics: MetricsCollector,
}

impl WebHtmlFetcher {
    pub fn new(config: &ScraperConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.scraping.user_agent)
            .timeout(Duration::from_secs(config.scraping.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limits.requests_per_second)
                .ok_or_else(|| anyhow!("Invalid requests_per_second value"))?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            metrics: MetricsCollector::new(),
        })
    }

    pub fn metrics(&self) -> FetchMetrics {
        self.metrics.snapshot()
    }

    async fn send(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })
    }
}

impl HtmlFetcher for WebHtmlFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let wait_start = Instant::now();
        self.rate_limiter.until_ready().await;
        self.metrics.record_rate_limit_wait(wait_start.elapsed());

        debug!("Fetching {}", url);
        let tracker = self.metrics.record_request_start();
        match self.send(url).await {
            Ok(html) => {
                tracker.succeeded(html.len());
                Ok(html)
            }
            Err(e) => {
                tracker.failed(&e.to_string());
                Err(e)
            }
        }
    }
}

/// Serves pages from memory, keyed by URL. Unknown URLs answer 404.
/// Keeps a log of requested URLs.
#[derive(Default)]
pub struct StaticHtmlFetcher {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StaticHtmlFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|requested| requested.clone())
            .unwrap_or_default()
    }
}

impl HtmlFetcher for StaticHtmlFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(url.to_string());
        }
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: StatusCode::NOT_FOUND,
        })
    }
}
