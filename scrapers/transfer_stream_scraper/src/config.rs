use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "127.0.0.1:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimits {
    pub requests_per_second: u32,
    pub max_concurrent_requests: usize,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            requests_per_second: 4,
            max_concurrent_requests: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapingConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// How many clubs from the top of the income ranking are tracked.
    pub top_clubs: usize,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; TransferStreams/1.0)".to_string(),
            request_timeout_secs: 30,
            top_clubs: 50,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScraperConfig {
    pub neo4j: Neo4jConfig,
    pub rate_limits: RateLimits,
    pub scraping: ScrapingConfig,
}

impl ScraperConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Layers overrides from `lookup` on top of the defaults. Values that
    /// fail to parse are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(uri) = lookup("NEO4J_URI") {
            config.neo4j.uri = uri;
        }
        if let Some(user) = lookup("NEO4J_USER") {
            config.neo4j.user = user;
        }
        if let Some(password) = lookup("NEO4J_PASSWORD") {
            config.neo4j.password = password;
        }
        if let Some(rps) = lookup("RATE_LIMIT_RPS").and_then(|r| r.parse::<u32>().ok()) {
            config.rate_limits.requests_per_second = rps;
        }
        if let Some(max) = lookup("MAX_CONCURRENT_REQUESTS").and_then(|m| m.parse::<usize>().ok()) {
            config.rate_limits.max_concurrent_requests = max.max(1);
        }
        if let Some(user_agent) = lookup("SCRAPER_USER_AGENT") {
            config.scraping.user_agent = user_agent;
        }
        if let Some(timeout) = lookup("SCRAPER_TIMEOUT_SECS").and_then(|t| t.parse::<u64>().ok()) {
            config.scraping.request_timeout_secs = timeout;
        }
        if let Some(top) = lookup("TOP_CLUBS").and_then(|t| t.parse::<usize>().ok()) {
            config.scraping.top_clubs = top;
        }

        config
    }
}
