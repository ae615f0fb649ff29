use neo4rs::{query, Graph, Query};
use serde::Serialize;
use tracing::info;

use crate::{
    config::Neo4jConfig,
    error::StoreError,
    types::{ClubNode, TransferEdge},
};

/// Constraint left behind by earlier schema versions.
const LEGACY_CONSTRAINT: &str = "constraint_691ce0ef";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphCounts {
    pub clubs: u64,
    pub transfers: u64,
}

/// Write operations the loader needs from a graph of clubs joined by
/// `SOLD_TO` relationships. Clubs are identified by name.
#[allow(async_fn_in_trait)]
pub trait GraphStore {
    /// Deletes every node and relationship.
    async fn clear(&self) -> Result<(), StoreError>;

    /// Asserts name uniqueness for clubs. Succeeds when already in place.
    async fn ensure_constraints(&self) -> Result<(), StoreError>;

    async fn create_club(&self, club: &ClubNode) -> Result<(), StoreError>;

    /// Links the origin club to an existing destination club, creating the
    /// origin (flagged with `academy`) if it is new. An identical existing
    /// relationship is reused. Returns false when the destination is absent.
    async fn merge_transfer(&self, transfer: &TransferEdge) -> Result<bool, StoreError>;

    /// Deletes relationships with zero net transfers.
    async fn remove_loans(&self) -> Result<u64, StoreError>;

    /// Deletes clubs with no relationships that are not top tier.
    async fn remove_orphan_clubs(&self) -> Result<u64, StoreError>;

    async fn counts(&self) -> Result<GraphCounts, StoreError>;
}

/// An open Neo4j connection pool. Build it with [`GraphClient::connect`] and
/// release it with [`GraphClient::close`].
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    pub async fn connect(config: &Neo4jConfig) -> Result<Self, StoreError> {
        let graph = Graph::new(&config.uri, &config.user, &config.password).await?;
        info!("Connected to Neo4j at {}", config.uri);
        Ok(Self { graph })
    }

    pub fn close(self) {
        drop(self.graph);
        info!("Closed Neo4j connection");
    }

    async fn fetch_count(&self, q: Query, column: &str) -> Result<u64, StoreError> {
        let mut stream = self.graph.execute(q).await?;
        match stream.next().await? {
            Some(row) => count_value(column, row.get::<i64>(column)),
            None => Ok(0),
        }
    }
}

fn count_value<E: std::fmt::Display>(column: &str, value: Result<i64, E>) -> Result<u64, StoreError> {
    value
        .map(|count| count.max(0) as u64)
        .map_err(|e| StoreError::Other(format!("Could not read column {}: {}", column, e)))
}

impl GraphStore for GraphClient {
    async fn clear(&self) -> Result<(), StoreError> {
        self.graph.run(query("MATCH (n) DETACH DELETE n")).await?;
        Ok(())
    }

    async fn ensure_constraints(&self) -> Result<(), StoreError> {
        self.graph
            .run(query(&format!("DROP CONSTRAINT {} IF EXISTS", LEGACY_CONSTRAINT)))
            .await?;
        self.graph
            .run(query(
                "CREATE CONSTRAINT club_name IF NOT EXISTS
                 FOR (c:Club) REQUIRE c.name IS UNIQUE",
            ))
            .await?;
        Ok(())
    }

    async fn create_club(&self, club: &ClubNode) -> Result<(), StoreError> {
        let q = query(
            "CREATE (:Club {
                name: $name,
                country: $country,
                expenditure: $expenditure,
                arrivals: $arrivals,
                income: $income,
                departures: $departures,
                balance: $balance,
                top_tier: $top_tier
            })",
        )
        .param("name", club.name.as_str())
        .param("country", club.country.as_str())
        .param("expenditure", club.expenditure)
        .param("arrivals", club.arrivals as i64)
        .param("income", club.income)
        .param("departures", club.departures as i64)
        .param("balance", club.balance)
        .param("top_tier", club.top_tier);

        self.graph.run(q).await?;
        Ok(())
    }

    async fn merge_transfer(&self, transfer: &TransferEdge) -> Result<bool, StoreError> {
        let q = query(
            "MATCH (dest:Club {name: $destination})
             MERGE (origin:Club {name: $origin})
               ON CREATE SET origin.academy = $academy
             MERGE (origin)-[:SOLD_TO {transfers: $transfers, volume: $volume}]->(dest)
             RETURN count(dest) AS matched",
        )
        .param("destination", transfer.destination_club.as_str())
        .param("origin", transfer.origin_club.as_str())
        .param("academy", transfer.is_academy)
        .param("transfers", transfer.net_transfers as i64)
        .param("volume", transfer.volume);

        Ok(self.fetch_count(q, "matched").await? > 0)
    }

    async fn remove_loans(&self) -> Result<u64, StoreError> {
        let q = query(
            "MATCH (:Club)-[r:SOLD_TO]->()
             WHERE r.transfers = 0
             DELETE r
             RETURN count(r) AS deleted",
        );
        self.fetch_count(q, "deleted").await
    }

    async fn remove_orphan_clubs(&self) -> Result<u64, StoreError> {
        let q = query(
            "MATCH (c:Club)
             WHERE NOT (c)--() AND coalesce(c.top_tier, false) = false
             DELETE c
             RETURN count(c) AS deleted",
        );
        self.fetch_count(q, "deleted").await
    }

    async fn counts(&self) -> Result<GraphCounts, StoreError> {
        let clubs = self
            .fetch_count(query("MATCH (c:Club) RETURN count(c) AS clubs"), "clubs")
            .await?;
        let transfers = self
            .fetch_count(query("MATCH ()-[r:SOLD_TO]->() RETURN count(r) AS transfers"), "transfers")
            .await?;
        Ok(GraphCounts { clubs, transfers })
    }
}
