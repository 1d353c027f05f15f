//! End-to-end tests for rank cache rebuilds over ingested data.

mod common;

use common::*;
use melodex::rank_cache::{RankCacheUpdater, ARTIST_RANK_METRIC, TRACK_RANK_METRIC};
use serde_json::json;

fn artist_with_listeners(id: &str, listeners: i64) -> serde_json::Value {
    let mut payload = minimal_artist(id);
    payload["stats"] = json!({"monthlyListeners": listeners});
    payload
}

#[test]
fn artist_ranks_follow_monthly_listeners() {
    let gateway = test_gateway();
    let ingestor = test_ingestor(&gateway);
    for (id, listeners) in [("a", 500), ("b", 900), ("c", 100)] {
        ingestor
            .ingest_artist(&parse_payload(&artist_with_listeners(id, listeners)))
            .unwrap();
    }

    let updater = RankCacheUpdater::new(gateway.clone(), 2);
    let report = updater.run_all();
    assert!(report.outcomes.iter().all(|o| o.error.is_none()));

    let mut ranks: Vec<(i64, String)> = select_all(&gateway, "artist_rank_cache")
        .into_iter()
        .map(|r| {
            (
                r["rank"].as_i64().unwrap(),
                r["artist_id"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    ranks.sort();

    assert_eq!(ranks, vec![(1, "b".to_string()), (2, "a".to_string())]);
}

#[test]
fn track_ranks_follow_play_counts() {
    let gateway = test_gateway();
    let ingestor = test_ingestor(&gateway);

    let mut payload = minimal_artist("a");
    payload["topTracks"] = json!([
        {"id": "t-low", "name": "Low", "playCount": 10},
        {"id": "t-high", "name": "High", "playCount": 1000},
        {"id": "t-mid", "name": "Mid", "playCount": 100}
    ]);
    ingestor.ingest_artist(&parse_payload(&payload)).unwrap();

    RankCacheUpdater::new(gateway.clone(), 10)
        .rebuild(&TRACK_RANK_METRIC)
        .unwrap();

    let mut ranks: Vec<(i64, String, i64)> = select_all(&gateway, "track_rank_cache")
        .into_iter()
        .map(|r| {
            (
                r["rank"].as_i64().unwrap(),
                r["track_id"].as_str().unwrap().to_string(),
                r["metric_value"].as_i64().unwrap(),
            )
        })
        .collect();
    ranks.sort();

    assert_eq!(
        ranks,
        vec![
            (1, "t-high".to_string(), 1000),
            (2, "t-mid".to_string(), 100),
            (3, "t-low".to_string(), 10),
        ]
    );
}

#[test]
fn rebuild_after_reingest_reflects_new_counters() {
    let gateway = test_gateway();
    let ingestor = test_ingestor(&gateway);
    let updater = RankCacheUpdater::new(gateway.clone(), 10);

    ingestor
        .ingest_artist(&parse_payload(&artist_with_listeners("a", 100)))
        .unwrap();
    ingestor
        .ingest_artist(&parse_payload(&artist_with_listeners("b", 200)))
        .unwrap();
    updater.rebuild(&ARTIST_RANK_METRIC).unwrap();

    // Artist a overtakes b on refresh.
    ingestor
        .ingest_artist(&parse_payload(&artist_with_listeners("a", 900)))
        .unwrap();
    updater.rebuild(&ARTIST_RANK_METRIC).unwrap();

    let rows = select_all(&gateway, "artist_rank_cache");
    assert_eq!(rows.len(), 2);
    let top = rows.iter().find(|r| r["rank"] == json!(1)).unwrap();
    assert_eq!(top["artist_id"], json!("a"));
    assert_eq!(top["metric_value"], json!(900));
}
