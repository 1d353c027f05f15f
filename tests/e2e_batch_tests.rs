//! End-to-end tests for the batch import driver.

mod common;

use common::*;
use melodex::ingest::BatchImporter;
use serde_json::json;
use std::time::Duration;

fn importer(gateway: &std::sync::Arc<melodex::store::SqliteGateway>) -> BatchImporter {
    BatchImporter::new(test_ingestor(gateway), Duration::ZERO)
}

#[test]
fn imports_a_batch_of_valid_payloads() {
    let gateway = test_gateway();
    let importer = importer(&gateway);

    let items = vec![
        minimal_artist("a1"),
        minimal_artist("a2"),
        full_artist("a3"),
    ];
    let report = importer.import_values(&items);

    assert_eq!(report.successful.len(), 3);
    assert!(report.failed.is_empty());
    assert_eq!(report.skipped, 0);
    for id in ["a1", "a2", "a3"] {
        assert_eq!(select_for(&gateway, "artists", "id", id).len(), 1);
    }
}

#[test]
fn malformed_item_fails_without_stopping_the_batch() {
    let gateway = test_gateway();
    let importer = importer(&gateway);

    // Item 3 has a non-string id and cannot deserialize; items 4 and 5
    // must still be processed.
    let items = vec![
        minimal_artist("a1"),
        minimal_artist("a2"),
        json!({"id": 12345, "status": true, "type": "artist"}),
        minimal_artist("a4"),
        minimal_artist("a5"),
    ];
    let report = importer.import_values(&items);

    assert_eq!(report.successful.len(), 4);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(select_all(&gateway, "artists").len(), 4);
    assert_eq!(select_for(&gateway, "artists", "id", "a5").len(), 1);
}

#[test]
fn unavailable_and_non_artist_items_are_skipped() {
    let gateway = test_gateway();
    let importer = importer(&gateway);

    let mut unavailable = minimal_artist("a-gone");
    unavailable["status"] = json!(false);
    let mut wrong_kind = minimal_artist("not-artist");
    wrong_kind["type"] = json!("playlist");
    let mut no_status = minimal_artist("a-unknown");
    no_status.as_object_mut().unwrap().remove("status");

    let report = importer.import_values(&[
        unavailable,
        wrong_kind,
        no_status,
        minimal_artist("a-ok"),
    ]);

    assert_eq!(report.skipped, 3);
    assert_eq!(report.successful.len(), 1);
    assert!(report.failed.is_empty());
    assert_eq!(select_all(&gateway, "artists").len(), 1);
}

#[test]
fn failed_item_identity_is_reported_when_available() {
    let gateway = test_gateway();
    let importer = importer(&gateway);

    // Parses fine but has no id, so ingestion rejects it.
    let report = importer.import_values(&[json!({
        "status": true,
        "type": "artist",
        "name": "Nameless Wonder"
    })]);

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "Nameless Wonder");
    assert!(report.failed[0].id.is_empty());
}

#[test]
fn pacing_is_not_paid_for_skipped_or_malformed_items() {
    let gateway = test_gateway();
    let pacing = Duration::from_millis(250);
    let importer = BatchImporter::new(test_ingestor(&gateway), pacing);

    let mut unavailable = minimal_artist("a-gone");
    unavailable["status"] = json!(false);
    let mut wrong_kind = minimal_artist("not-artist");
    wrong_kind["type"] = json!("playlist");

    // One ingested item among skips and a malformed one: no two ingested
    // items means no pacing sleep at all.
    let started = std::time::Instant::now();
    let report = importer.import_values(&[
        unavailable,
        json!({"id": 42}),
        wrong_kind,
        minimal_artist("a-ok"),
    ]);

    assert!(started.elapsed() < pacing);
    assert_eq!(report.successful.len(), 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed.len(), 1);
}

#[test]
fn empty_batch_produces_empty_report() {
    let gateway = test_gateway();
    let importer = importer(&gateway);

    let report = importer.import_values(&[]);

    assert_eq!(report.total(), 0);
}
