use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::{
    error::StoreError,
    graph_store::GraphStore,
    types::{ClubNode, CrawlOutput},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub clubs_written: u64,
    pub transfers_written: u64,
    pub transfers_skipped: u64,
    pub loans_removed: u64,
    pub orphans_removed: u64,
}

/// Rebuilds the graph from scratch out of one crawl's records.
///
/// Steps run strictly in order: wipe, constraints, clubs, transfers, loan
/// pruning, orphan pruning. Any failure stops the load and leaves the store
/// as far as it got.
pub struct GraphLoader<'a, S: GraphStore> {
    store: &'a S,
}

impl<'a, S: GraphStore> GraphLoader<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn load(&self, records: &CrawlOutput) -> Result<LoadReport, StoreError> {
        let mut report = LoadReport::default();

        self.store.clear().await?;
        info!("Cleared graph");

        self.store.ensure_constraints().await?;

        let mut seen = HashSet::new();
        for club in &records.clubs {
            if !seen.insert(club.name.as_str()) {
                warn!("Skipping duplicate club {}", club.name);
                continue;
            }
            self.store.create_club(&ClubNode::from(club)).await?;
            report.clubs_written += 1;
        }
        info!("Wrote {} clubs", report.clubs_written);

        for transfer in &records.transfers {
            if self.store.merge_transfer(transfer).await? {
                report.transfers_written += 1;
            } else {
                warn!(
                    "No club {} to attach transfers from {}",
                    transfer.destination_club, transfer.origin_club
                );
                report.transfers_skipped += 1;
            }
        }
        info!("Wrote {} transfer rows", report.transfers_written);

        report.loans_removed = self.store.remove_loans().await?;
        info!("Removed {} loan-only relationships", report.loans_removed);

        report.orphans_removed = self.store.remove_orphan_clubs().await?;
        info!("Removed {} orphan clubs", report.orphans_removed);

        Ok(report)
    }
}
