//! Batch import driver.
//!
//! Feeds a list of raw payload values through the [`ArtistIngestor`] one at
//! a time, pacing between items so a large import does not hammer the
//! database. Items are isolated from each other: a malformed or failing
//! item is recorded and the rest of the batch continues.

use super::orchestrator::ArtistIngestor;
use crate::payload::ArtistPayload;
use serde_json::Value;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ImportedItem {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct FailedItem {
    pub id: String,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub successful: Vec<ImportedItem>,
    pub failed: Vec<FailedItem>,
    pub skipped: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len() + self.skipped
    }
}

pub struct BatchImporter {
    ingestor: ArtistIngestor,
    pacing: Duration,
}

impl BatchImporter {
    pub fn new(ingestor: ArtistIngestor, pacing: Duration) -> Self {
        Self { ingestor, pacing }
    }

    /// Import a batch of raw payload values. Each value is deserialized
    /// individually so one malformed item cannot sink the batch.
    pub fn import_values(&self, items: &[Value]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut ingested_any = false;

        for (index, item) in items.iter().enumerate() {
            // Best-effort identity for reporting, even when the item fails
            // to deserialize.
            let id = string_field(item, "id");
            let name = string_field(item, "name");

            let payload: ArtistPayload = match serde_json::from_value(item.clone()) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Batch item {} is malformed: {}", index, e);
                    report.failed.push(FailedItem {
                        id,
                        name,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            if payload.status != Some(true) || payload.kind.as_deref() != Some("artist") {
                warn!(
                    "Skipping batch item {} ('{}'): status={:?} type={:?}",
                    index, name, payload.status, payload.kind
                );
                report.skipped += 1;
                continue;
            }

            // Malformed and skipped items never touch the database, so
            // pacing only applies between ingested items.
            if ingested_any {
                thread::sleep(self.pacing);
            }
            ingested_any = true;

            self.ingest_item(index, &payload, id, name, &mut report);
        }

        info!(
            "Batch import done: {} imported, {} failed, {} skipped",
            report.successful.len(),
            report.failed.len(),
            report.skipped
        );
        report
    }

    fn ingest_item(
        &self,
        index: usize,
        payload: &ArtistPayload,
        id: String,
        name: String,
        report: &mut BatchReport,
    ) {
        match self.ingestor.ingest_artist(payload) {
            Ok(ingest_report) => {
                if !ingest_report.is_clean() {
                    warn!(
                        "Artist {} imported with {} section failures",
                        ingest_report.artist_id,
                        ingest_report.failure_count()
                    );
                }
                report.successful.push(ImportedItem { id, name });
            }
            Err(e) => {
                warn!("Batch item {} ('{}') failed: {}", index, name, e);
                report.failed.push(FailedItem {
                    id,
                    name,
                    error: e.to_string(),
                });
            }
        }
    }
}

fn string_field(item: &Value, field: &str) -> String {
    item.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
