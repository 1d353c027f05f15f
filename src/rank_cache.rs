//! Rank cache maintenance.
//!
//! Denormalized leaderboard tables (top artists by monthly listeners, top
//! tracks by play count) are rebuilt from scratch on each run so ranks are
//! always dense and 1-based. The two metrics are rebuilt independently; a
//! failure in one does not stop the other.

use crate::error::PersistenceError;
use crate::store::{PersistenceGateway, Record};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// One rankable metric: which collection feeds it, which column orders it,
/// and which cache collection holds the result.
#[derive(Debug, Clone, Copy)]
pub struct RankMetric {
    pub name: &'static str,
    pub source_collection: &'static str,
    pub metric_column: &'static str,
    pub cache_collection: &'static str,
    pub cache_id_column: &'static str,
}

pub const ARTIST_RANK_METRIC: RankMetric = RankMetric {
    name: "artists by monthly listeners",
    source_collection: "artists",
    metric_column: "monthly_listeners",
    cache_collection: "artist_rank_cache",
    cache_id_column: "artist_id",
};

pub const TRACK_RANK_METRIC: RankMetric = RankMetric {
    name: "tracks by play count",
    source_collection: "tracks",
    metric_column: "play_count",
    cache_collection: "track_rank_cache",
    cache_id_column: "track_id",
};

#[derive(Debug, Clone)]
pub struct RebuildOutcome {
    pub metric: &'static str,
    pub entries: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RankCacheReport {
    pub rebuilt_at: String,
    pub outcomes: Vec<RebuildOutcome>,
}

pub struct RankCacheUpdater {
    gateway: Arc<dyn PersistenceGateway>,
    limit: usize,
}

impl RankCacheUpdater {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, limit: usize) -> Self {
        Self { gateway, limit }
    }

    /// Rebuild one metric's cache table from its source collection.
    pub fn rebuild(&self, metric: &RankMetric) -> Result<usize, PersistenceError> {
        let rows = self.gateway.select_where(
            metric.source_collection,
            &[],
            Some(metric.metric_column),
            Some(self.limit),
        )?;

        let mut entries: Vec<Record> = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.get("id").and_then(Value::as_str);
            let value = row.get(metric.metric_column).and_then(Value::as_i64);
            match (id, value) {
                (Some(id), Some(value)) => {
                    let mut record = Record::new();
                    record.insert(metric.cache_id_column.to_string(), json!(id));
                    record.insert("rank".to_string(), json!(entries.len() as i64 + 1));
                    record.insert("metric_value".to_string(), json!(value));
                    entries.push(record);
                }
                _ => {
                    warn!(
                        "Skipping {} row without id or {} while ranking",
                        metric.source_collection, metric.metric_column
                    );
                }
            }
        }

        // Full rebuild: clear then insert the fresh ranking. Readers between
        // the two steps see an empty cache, never a stale mix.
        self.gateway.delete_where(metric.cache_collection, &[])?;
        self.gateway.insert_many(metric.cache_collection, &entries)?;

        info!(
            "Rebuilt rank cache for {} with {} entries",
            metric.name,
            entries.len()
        );
        Ok(entries.len())
    }

    /// Rebuild all rank caches, isolated per metric.
    pub fn run_all(&self) -> RankCacheReport {
        let mut outcomes = Vec::new();
        for metric in [&ARTIST_RANK_METRIC, &TRACK_RANK_METRIC] {
            let outcome = match self.rebuild(metric) {
                Ok(entries) => RebuildOutcome {
                    metric: metric.name,
                    entries,
                    error: None,
                },
                Err(e) => {
                    warn!("Rank cache rebuild for {} failed: {}", metric.name, e);
                    RebuildOutcome {
                        metric: metric.name,
                        entries: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }
        RankCacheReport {
            rebuilt_at: Utc::now().to_rfc3339(),
            outcomes,
        }
    }
}
