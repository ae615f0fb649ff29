use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use crate::{
    error::StoreError,
    graph_store::{GraphCounts, GraphStore},
    types::{ClubNode, TransferEdge},
};

/// A club node: tracked clubs carry their summary, counterparties only an
/// academy flag set when they were first seen.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredClub {
    pub name: String,
    pub summary: Option<ClubNode>,
    pub academy: Option<bool>,
}

impl StoredClub {
    pub fn is_top_tier(&self) -> bool {
        self.summary.as_ref().is_some_and(|s| s.top_tier)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredTransfer {
    pub origin: String,
    pub destination: String,
    pub transfers: i32,
    pub volume: f64,
}

#[derive(Default)]
struct Graph {
    clubs: BTreeMap<String, StoredClub>,
    transfers: Vec<StoredTransfer>,
}

/// In-process [`GraphStore`] with the same semantics as the Neo4j one.
#[derive(Default)]
pub struct MemoryGraph {
    inner: Mutex<Graph>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clubs ordered by name.
    pub fn clubs(&self) -> Vec<StoredClub> {
        self.lock().clubs.values().cloned().collect()
    }

    /// Relationships ordered by origin, destination, then transfers.
    pub fn transfers(&self) -> Vec<StoredTransfer> {
        let mut transfers = self.lock().transfers.clone();
        transfers.sort_by(|a, b| {
            (&a.origin, &a.destination, a.transfers)
                .cmp(&(&b.origin, &b.destination, b.transfers))
                .then(a.volume.total_cmp(&b.volume))
        });
        transfers
    }

    pub fn club(&self, name: &str) -> Option<StoredClub> {
        self.lock().clubs.get(name).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Graph> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl GraphStore for MemoryGraph {
    async fn clear(&self) -> Result<(), StoreError> {
        let mut graph = self.lock();
        graph.clubs.clear();
        graph.transfers.clear();
        Ok(())
    }

    async fn ensure_constraints(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_club(&self, club: &ClubNode) -> Result<(), StoreError> {
        let mut graph = self.lock();
        if graph.clubs.contains_key(&club.name) {
            return Err(StoreError::Other(format!(
                "Club {} already exists with the same name",
                club.name
            )));
        }
        graph.clubs.insert(
            club.name.clone(),
            StoredClub {
                name: club.name.clone(),
                summary: Some(club.clone()),
                academy: None,
            },
        );
        Ok(())
    }

    async fn merge_transfer(&self, transfer: &TransferEdge) -> Result<bool, StoreError> {
        let mut graph = self.lock();
        if !graph.clubs.contains_key(&transfer.destination_club) {
            return Ok(false);
        }

        graph
            .clubs
            .entry(transfer.origin_club.clone())
            .or_insert_with(|| StoredClub {
                name: transfer.origin_club.clone(),
                summary: None,
                academy: Some(transfer.is_academy),
            });

        let edge = StoredTransfer {
            origin: transfer.origin_club.clone(),
            destination: transfer.destination_club.clone(),
            transfers: transfer.net_transfers,
            volume: transfer.volume,
        };
        if !graph.transfers.contains(&edge) {
            graph.transfers.push(edge);
        }
        Ok(true)
    }

    async fn remove_loans(&self) -> Result<u64, StoreError> {
        let mut graph = self.lock();
        let before = graph.transfers.len();
        graph.transfers.retain(|t| t.transfers != 0);
        Ok((before - graph.transfers.len()) as u64)
    }

    async fn remove_orphan_clubs(&self) -> Result<u64, StoreError> {
        let mut guard = self.lock();
        let graph = &mut *guard;
        let before = graph.clubs.len();
        let transfers = &graph.transfers;
        graph.clubs.retain(|name, club| {
            club.is_top_tier()
                || transfers
                    .iter()
                    .any(|t| &t.origin == name || &t.destination == name)
        });
        Ok((before - graph.clubs.len()) as u64)
    }

    async fn counts(&self) -> Result<GraphCounts, StoreError> {
        let graph = self.lock();
        Ok(GraphCounts {
            clubs: graph.clubs.len() as u64,
            transfers: graph.transfers.len() as u64,
        })
    }
}
