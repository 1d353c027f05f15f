//! Deserialization types for the source API's artist payload.
//!
//! The upstream shape is nested and loosely structured; every field except
//! the root id is optional and absence must never fail deserialization.
//! Defaults are applied by the normalizers, not here.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistPayload {
    pub id: Option<String>,
    /// Upstream marks unavailable artists with `status: false`.
    pub status: Option<bool>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub share_url: Option<String>,
    pub verified: Option<bool>,
    pub biography: Option<String>,
    pub stats: Option<StatsPayload>,
    pub external_links: Option<Vec<LinkPayload>>,
    pub visuals: Option<VisualsPayload>,
    pub top_cities: Option<Vec<CityPayload>>,
    pub discography: Option<DiscographyPayload>,
    pub top_tracks: Option<Vec<TrackPayload>>,
    pub related_artists: Option<Vec<ArtistRefPayload>>,
    pub discovered_on: Option<Vec<PlaylistPayload>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsPayload {
    pub followers: Option<i64>,
    pub monthly_listeners: Option<i64>,
    pub world_rank: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPayload {
    pub name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualsPayload {
    pub avatar: Option<Vec<ImagePayload>>,
    pub header: Option<Vec<ImagePayload>>,
    /// Gallery images arrive grouped; group order is authoritative.
    pub gallery: Option<Vec<Vec<ImagePayload>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub url: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityPayload {
    pub city: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub num_listeners: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscographyPayload {
    pub latest: Option<AlbumPayload>,
    pub singles: Option<Vec<AlbumPayload>>,
    pub albums: Option<Vec<AlbumPayload>>,
    pub compilations: Option<Vec<AlbumPayload>>,
    pub popular_releases: Option<Vec<AlbumPayload>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumPayload {
    pub id: Option<String>,
    pub name: Option<String>,
    pub share_url: Option<String>,
    pub label: Option<String>,
    pub track_count: Option<i64>,
    pub copyright: Option<Vec<CopyrightPayload>>,
    pub cover: Option<Vec<ImagePayload>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyrightPayload {
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPayload {
    pub id: Option<String>,
    pub name: Option<String>,
    pub share_url: Option<String>,
    pub explicit: Option<bool>,
    pub duration_ms: Option<i64>,
    pub disc_number: Option<i64>,
    pub play_count: Option<i64>,
    pub album: Option<AlbumRefPayload>,
    pub artists: Option<Vec<ArtistRefPayload>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumRefPayload {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistRefPayload {
    pub id: Option<String>,
    pub name: Option<String>,
    pub share_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPayload {
    pub id: Option<String>,
    pub name: Option<String>,
    pub share_url: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub cover: Option<Vec<ImagePayload>>,
}
