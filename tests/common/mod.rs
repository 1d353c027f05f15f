//! Common test infrastructure
//!
//! Fixture payloads and a pre-wired in-memory gateway for the ingestion
//! end-to-end tests. Payloads are built as raw JSON so tests exercise the
//! real deserialization path.

// Not every test binary uses every helper.
#![allow(dead_code)]

use melodex::ingest::ArtistIngestor;
use melodex::payload::ArtistPayload;
use melodex::store::{PersistenceGateway, Record, SqliteGateway};
use serde_json::{json, Value};
use std::sync::Arc;

pub const ARTIST_1_ID: &str = "artist-001";
pub const ARTIST_2_ID: &str = "artist-002";

pub fn test_gateway() -> Arc<SqliteGateway> {
    Arc::new(SqliteGateway::open_in_memory().unwrap())
}

pub fn test_ingestor(gateway: &Arc<SqliteGateway>) -> ArtistIngestor {
    ArtistIngestor::new(gateway.clone())
}

pub fn parse_payload(value: &Value) -> ArtistPayload {
    serde_json::from_value(value.clone()).unwrap()
}

pub fn minimal_artist(id: &str) -> Value {
    json!({
        "id": id,
        "status": true,
        "type": "artist",
        "name": format!("Artist {id}")
    })
}

/// A payload touching every section of the schema.
pub fn full_artist(id: &str) -> Value {
    json!({
        "id": id,
        "status": true,
        "type": "artist",
        "name": "The Midnight Owls",
        "shareUrl": format!("https://open.example.com/artist/{id}"),
        "verified": true,
        "biography": "Two owls and a synthesizer.",
        "stats": {
            "followers": 1200,
            "monthlyListeners": 98000,
            "worldRank": 1543
        },
        "externalLinks": [
            {"name": "instagram", "url": "https://instagram.com/midnightowls"},
            {"name": "wikipedia", "url": "https://en.wikipedia.org/wiki/Midnight_Owls"}
        ],
        "visuals": {
            "avatar": [{"url": "https://img.example.com/avatar-big", "width": 640, "height": 640}],
            "header": [{"url": "https://img.example.com/header", "width": 2660, "height": 1140}],
            "gallery": [
                [{"url": "https://img.example.com/g0-0"}, {"url": "https://img.example.com/g0-1"}],
                [{"url": "https://img.example.com/g1-0"}]
            ]
        },
        "topCities": [
            {"city": "Berlin", "country": "DE", "region": "BE", "numListeners": 4000},
            {"city": "London", "country": "GB", "region": "LND", "numListeners": 3500}
        ],
        "discography": {
            "latest": {"id": "album-latest", "name": "Night Flight", "trackCount": 10},
            "singles": [
                {
                    "id": "album-single-1",
                    "name": "Talon",
                    "label": "Hoot Records",
                    "trackCount": 1,
                    "copyright": [{"text": "2025 Hoot Records", "type": "C"}],
                    "cover": [
                        {"url": "https://img.example.com/s1-small", "width": 64, "height": 64},
                        {"url": "https://img.example.com/s1-big", "width": 640, "height": 640}
                    ]
                }
            ],
            "albums": [{"id": "album-full-1", "name": "First Light", "trackCount": 12}],
            "compilations": [],
            "popularReleases": [{"id": "album-latest", "name": "Night Flight", "trackCount": 10}]
        },
        "topTracks": [
            {
                "id": "track-1",
                "name": "Moonlit",
                "explicit": false,
                "durationMs": 215000,
                "discNumber": 1,
                "playCount": 500000,
                "album": {"id": "album-latest"},
                "artists": [
                    {"id": id, "name": "The Midnight Owls"},
                    {"id": "artist-feat-1", "name": "Night Heron"}
                ]
            },
            {
                "id": "track-2",
                "name": "Talon",
                "explicit": true,
                "durationMs": 180000,
                "playCount": 250000,
                "album": {"id": "album-single-1"}
            }
        ],
        "relatedArtists": [
            {"id": "artist-rel-1", "name": "Night Heron"},
            {"id": "artist-rel-2", "name": "Dawn Chorus"}
        ],
        "discoveredOn": [
            {
                "id": "playlist-1",
                "name": "Late Night Drive",
                "owner": "editorial",
                "cover": [{"url": "https://img.example.com/pl1"}]
            }
        ]
    })
}

pub fn select_all(gateway: &SqliteGateway, collection: &str) -> Vec<Record> {
    gateway.select_where(collection, &[], None, None).unwrap()
}

pub fn select_for(gateway: &SqliteGateway, collection: &str, key: &str, id: &str) -> Vec<Record> {
    gateway
        .select_where(collection, &[(key, json!(id))], None, None)
        .unwrap()
}
