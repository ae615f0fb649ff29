use reqwest::StatusCode;

/// A page could not be retrieved.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: StatusCode },
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Expected markup was missing or malformed.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Missing element: {0}")]
    MissingElement(&'static str),
    #[error("Row has no cell at index {index} (found {found} cells)")]
    MissingCell { index: usize, found: usize },
    #[error("Cell {index} has no {attr} attribute")]
    MissingAttribute { index: usize, attr: &'static str },
    #[error("Club link does not look like a transfer listing: {0}")]
    MalformedClubLink(String),
    #[error("Cell {index} is not a count: {text:?}")]
    InvalidCount { index: usize, text: String },
    #[error("Pagination control has no readable page number")]
    MalformedPagination,
}

/// A graph store operation failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),
    #[error("Store error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Failed to parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    pub fn parse(url: &str, source: ParseError) -> Self {
        Self::Parse {
            url: url.to_string(),
            source,
        }
    }
}
