use serde::{Deserialize, Serialize};

/// One row of the income ranking. Amounts are in millions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubSummary {
    pub name: String,
    pub country: String,
    pub expenditure: f64,
    pub arrivals: u32,
    pub income: f64,
    pub departures: u32,
    pub balance: f64,
    pub top_tier: bool,
    /// First page of the club's transfer streams. Never written to the store.
    #[serde(skip_serializing, default)]
    pub detail_url: String,
}

/// Transfers from one counterparty into a tracked club.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEdge {
    pub destination_club: String,
    pub origin_club: String,
    pub net_transfers: i32,
    pub volume: f64,
    pub is_academy: bool,
}

/// The properties of a tracked `Club` node as persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClubNode {
    pub name: String,
    pub country: String,
    pub expenditure: f64,
    pub arrivals: u32,
    pub income: f64,
    pub departures: u32,
    pub balance: f64,
    pub top_tier: bool,
}

impl From<&ClubSummary> for ClubNode {
    fn from(club: &ClubSummary) -> Self {
        Self {
            name: club.name.clone(),
            country: club.country.clone(),
            expenditure: club.expenditure,
            arrivals: club.arrivals,
            income: club.income,
            departures: club.departures,
            balance: club.balance,
            top_tier: club.top_tier,
        }
    }
}

/// Everything one crawl produced, handed to the loader as a unit.
#[derive(Debug, Clone, Default)]
pub struct CrawlOutput {
    pub clubs: Vec<ClubSummary>,
    pub transfers: Vec<TransferEdge>,
}
