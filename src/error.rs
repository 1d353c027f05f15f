//! Error taxonomy for the ingestion pipeline.

use thiserror::Error;

/// Failure of a single persistence-gateway operation.
///
/// Carries the collection name so batch reports can say *where* a write
/// failed, not just why.
#[derive(Debug, Error)]
#[error("persistence error on '{collection}': {cause}")]
pub struct PersistenceError {
    pub collection: String,
    #[source]
    pub cause: rusqlite::Error,
}

impl PersistenceError {
    pub fn new(collection: impl Into<String>, cause: rusqlite::Error) -> Self {
        Self {
            collection: collection.into(),
            cause,
        }
    }
}

/// Errors raised inside a single artist ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The top-level payload has no usable artist id. Fatal for the call.
    #[error("payload has no artist id")]
    InvalidPayload,

    /// A sub-entity fragment lacks its id. The fragment is skipped by the
    /// caller; siblings are unaffected.
    #[error("{entity} fragment is missing its id")]
    MissingIdentity { entity: &'static str },

    /// A delete-then-insert refresh failed before or during the delete step.
    /// The old rows are left in place, nothing was inserted.
    #[error("refresh of {entity} failed: {source}")]
    RefreshFailed {
        entity: &'static str,
        #[source]
        source: PersistenceError,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Errors from the external source API adapter.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("token request failed: {0}")]
    Token(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source API returned status {status} for {resource}")]
    Status { status: u16, resource: String },
}
