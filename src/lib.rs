//! Melodex: an artist-metadata ingestion pipeline backed by SQLite.
//!
//! Payloads scraped or fetched from the upstream catalog API are normalized
//! into flat records and persisted through a generic [`store::PersistenceGateway`].
//! The [`ingest`] module holds the per-artist orchestrator and the batch
//! driver, [`fetch`] the OAuth source-API adapter, and [`rank_cache`] the
//! leaderboard table maintenance.

pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod normalize;
pub mod payload;
pub mod rank_cache;
pub mod store;

pub use error::{FetchError, IngestError, PersistenceError};
