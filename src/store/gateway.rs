//! PersistenceGateway trait definition.
//!
//! The ingestion core only ever talks to the database through this
//! capability trait: upsert-with-conflict-key, delete-by-filter, plain
//! inserts and filtered selects against named collections. It assumes
//! per-statement atomicity and nothing more; refresh ordering (parent before
//! child, delete before insert) substitutes for transactions.

use crate::error::PersistenceError;
use serde_json::Value;

/// A flat record as the gateway expects it: column name to JSON scalar.
pub type Record = serde_json::Map<String, Value>;

/// Equality filter, ANDed together. An empty filter matches every row.
pub type Filter<'a> = &'a [(&'a str, Value)];

pub trait PersistenceGateway: Send + Sync {
    /// Insert each record, or update the existing row sharing the declared
    /// unique key tuple.
    fn upsert(
        &self,
        collection: &str,
        records: &[Record],
        conflict_keys: &[&str],
    ) -> Result<(), PersistenceError>;

    /// Delete every row matching the filter. Returns the number of rows
    /// removed.
    fn delete_where(&self, collection: &str, filter: Filter) -> Result<usize, PersistenceError>;

    /// Insert records without conflict handling.
    fn insert_many(&self, collection: &str, records: &[Record]) -> Result<(), PersistenceError>;

    /// Select rows matching the filter, optionally ordered descending by one
    /// column and capped at `limit`.
    fn select_where(
        &self,
        collection: &str,
        filter: Filter,
        order_desc_by: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, PersistenceError>;
}
