//! Entity normalizers: pure mappings from payload fragments to flat records.
//!
//! Each function takes one denormalized sub-object and produces the record
//! shape the persistence gateway expects. A fragment without its identity
//! field fails with `MissingIdentity` and is skipped by the caller; every
//! other field defaults (counters to 0, descriptive fields to null). No I/O
//! happens here.

use crate::error::IngestError;
use crate::payload::*;
use crate::store::Record;
use serde_json::Value;

macro_rules! record {
    ( $( $key:literal : $value:expr ),* $(,)? ) => {{
        let mut m = Record::new();
        $( m.insert($key.to_string(), Value::from($value)); )*
        m
    }};
}

fn require_id(id: &Option<String>, entity: &'static str) -> Result<String, IngestError> {
    match id {
        Some(id) if !id.is_empty() => Ok(id.clone()),
        _ => Err(IngestError::MissingIdentity { entity }),
    }
}

/// Artist core record. The caller has already validated the id.
pub fn normalize_artist(payload: &ArtistPayload, id: &str, now: &str) -> Record {
    let stats = payload.stats.clone().unwrap_or_default();
    record! {
        "id": id,
        "name": payload.name.clone(),
        "share_url": payload.share_url.clone(),
        "verified": payload.verified.unwrap_or(false),
        "biography": payload.biography.clone(),
        "followers": stats.followers.unwrap_or(0),
        "monthly_listeners": stats.monthly_listeners.unwrap_or(0),
        "world_rank": stats.world_rank.unwrap_or(0),
        "updated_at": now,
    }
}

/// Minimal stub for an artist known only as a reference, enough to satisfy
/// the relationship row's foreign key.
pub fn normalize_artist_stub(fragment: &ArtistRefPayload, now: &str) -> Result<Record, IngestError> {
    let id = require_id(&fragment.id, "related artist")?;
    Ok(record! {
        "id": id,
        "name": fragment.name.clone(),
        "share_url": fragment.share_url.clone(),
        "updated_at": now,
    })
}

pub fn normalize_link(artist_id: &str, fragment: &LinkPayload) -> Record {
    record! {
        "artist_id": artist_id,
        "name": fragment.name.clone(),
        "url": fragment.url.clone(),
    }
}

pub fn normalize_artist_image(
    artist_id: &str,
    image_type: &str,
    position: usize,
    fragment: &ImagePayload,
) -> Record {
    record! {
        "artist_id": artist_id,
        "image_type": image_type,
        "url": fragment.url.clone(),
        "width": fragment.width.unwrap_or(0),
        "height": fragment.height.unwrap_or(0),
        "position": position as i64,
    }
}

/// Top-city rank comes from the input array position (1-based); the source
/// ordering is authoritative, listener counts are not re-sorted.
pub fn normalize_top_city(artist_id: &str, rank: usize, fragment: &CityPayload) -> Record {
    record! {
        "artist_id": artist_id,
        "city": fragment.city.clone(),
        "country": fragment.country.clone(),
        "region": fragment.region.clone(),
        "listeners": fragment.num_listeners.unwrap_or(0),
        "rank": rank as i64,
    }
}

pub fn normalize_album(fragment: &AlbumPayload, group: &str, now: &str) -> Result<Record, IngestError> {
    let id = require_id(&fragment.id, "album")?;
    Ok(record! {
        "id": id,
        "name": fragment.name.clone(),
        "share_url": fragment.share_url.clone(),
        "album_type": group,
        "label": fragment.label.clone(),
        "track_count": fragment.track_count.unwrap_or(0),
        // The source payload withholds release dates.
        "release_date": Value::Null,
        "updated_at": now,
    })
}

pub fn normalize_album_image(album_id: &str, position: usize, fragment: &ImagePayload) -> Record {
    record! {
        "album_id": album_id,
        "url": fragment.url.clone(),
        "width": fragment.width.unwrap_or(0),
        "height": fragment.height.unwrap_or(0),
        "position": position as i64,
    }
}

pub fn normalize_album_copyright(album_id: &str, fragment: &CopyrightPayload) -> Record {
    record! {
        "album_id": album_id,
        "text": fragment.text.clone(),
        "copyright_type": fragment.kind.clone(),
    }
}

pub fn normalize_artist_album(artist_id: &str, album_id: &str, group: &str) -> Record {
    record! {
        "artist_id": artist_id,
        "album_id": album_id,
        "album_group": group,
    }
}

pub fn normalize_track(fragment: &TrackPayload, now: &str) -> Result<Record, IngestError> {
    let id = require_id(&fragment.id, "track")?;
    let album_id = fragment.album.as_ref().and_then(|a| a.id.clone());
    Ok(record! {
        "id": id,
        "name": fragment.name.clone(),
        "share_url": fragment.share_url.clone(),
        "explicit": fragment.explicit.unwrap_or(false),
        "duration_ms": fragment.duration_ms.unwrap_or(0),
        "disc_number": fragment.disc_number.unwrap_or(0),
        "play_count": fragment.play_count.unwrap_or(0),
        "album_id": album_id,
        "updated_at": now,
    })
}

pub fn normalize_artist_track(
    artist_id: &str,
    track_id: &str,
    is_primary: bool,
    is_top_track: bool,
) -> Record {
    record! {
        "artist_id": artist_id,
        "track_id": track_id,
        "is_primary": is_primary,
        "is_top_track": is_top_track,
    }
}

pub fn normalize_related_artist(artist_id: &str, related_artist_id: &str) -> Record {
    record! {
        "artist_id": artist_id,
        "related_artist_id": related_artist_id,
    }
}

pub fn normalize_playlist(fragment: &PlaylistPayload, now: &str) -> Result<Record, IngestError> {
    let id = require_id(&fragment.id, "playlist")?;
    Ok(record! {
        "id": id,
        "name": fragment.name.clone(),
        "share_url": fragment.share_url.clone(),
        "description": fragment.description.clone(),
        "owner_name": fragment.owner.clone(),
        "updated_at": now,
    })
}

pub fn normalize_playlist_image(playlist_id: &str, position: usize, fragment: &ImagePayload) -> Record {
    record! {
        "playlist_id": playlist_id,
        "url": fragment.url.clone(),
        "width": fragment.width.unwrap_or(0),
        "height": fragment.height.unwrap_or(0),
        "position": position as i64,
    }
}

pub fn normalize_artist_playlist(
    artist_id: &str,
    playlist_id: &str,
    relationship_type: &str,
) -> Record {
    record! {
        "artist_id": artist_id,
        "playlist_id": playlist_id,
        "relationship_type": relationship_type,
    }
}
