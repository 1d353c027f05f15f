//! Artist ingestion orchestrator.
//!
//! Given one artist payload, upserts the artist core record and fans out to
//! the related-entity sections in a fixed order (links → images → top cities
//! → discography → top tracks → related artists → playlists). Later sections
//! may reference rows created by earlier ones, so the order is part of the
//! contract.
//!
//! Sub-items are isolated: one malformed album or track is recorded in that
//! section's report and its siblings continue. Only a failure to upsert the
//! artist row itself (or a payload without an id) fails the whole call,
//! since nothing downstream can attach to a missing artist.

use super::refresh::{merge_upsert, replace_all};
use crate::error::IngestError;
use crate::normalize::*;
use crate::payload::*;
use crate::store::{PersistenceGateway, Record};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Relationship type under which source playlists are attached to an artist.
pub const PLAYLIST_REL_DISCOVERED_ON: &str = "discovered_on";

#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub item: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct SectionReport {
    pub section: &'static str,
    pub processed: usize,
    pub failures: Vec<ItemFailure>,
}

impl SectionReport {
    fn new(section: &'static str) -> Self {
        Self {
            section,
            processed: 0,
            failures: Vec::new(),
        }
    }

    fn fail(&mut self, item: impl Into<String>, error: &IngestError) {
        let item = item.into();
        warn!(
            "Section {} item '{}' failed: {}",
            self.section, item, error
        );
        self.failures.push(ItemFailure {
            item,
            error: error.to_string(),
        });
    }
}

/// Outcome of one artist ingestion. The artist row was written; section
/// reports say how much of the rest made it.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub artist_id: String,
    pub sections: Vec<SectionReport>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.sections.iter().all(|s| s.failures.is_empty())
    }

    pub fn failure_count(&self) -> usize {
        self.sections.iter().map(|s| s.failures.len()).sum()
    }
}

pub struct ArtistIngestor {
    gateway: Arc<dyn PersistenceGateway>,
}

impl ArtistIngestor {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Ingest one artist payload. See the module docs for the isolation
    /// contract.
    pub fn ingest_artist(&self, payload: &ArtistPayload) -> Result<IngestReport, IngestError> {
        let artist_id = match &payload.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => return Err(IngestError::InvalidPayload),
        };
        let now = Utc::now().to_rfc3339();

        // Step 1: the artist row itself. Blocking; every relationship row
        // below references it.
        let artist_record = normalize_artist(payload, &artist_id, &now);
        merge_upsert(self.gateway.as_ref(), "artists", &[artist_record], &["id"])?;
        debug!("Upserted artist {}", artist_id);

        let mut sections = Vec::new();

        if let Some(links) = &payload.external_links {
            sections.push(self.refresh_links(&artist_id, links));
        }
        if let Some(visuals) = &payload.visuals {
            sections.push(self.refresh_images(&artist_id, visuals));
        }
        if let Some(cities) = &payload.top_cities {
            sections.push(self.refresh_top_cities(&artist_id, cities));
        }
        if let Some(discography) = &payload.discography {
            sections.push(self.process_discography(&artist_id, discography, &now));
        }
        if let Some(tracks) = &payload.top_tracks {
            sections.push(self.process_top_tracks(&artist_id, tracks, &now));
        }
        if let Some(related) = &payload.related_artists {
            sections.push(self.process_related_artists(&artist_id, related, &now));
        }
        if let Some(playlists) = &payload.discovered_on {
            sections.push(self.process_playlists(&artist_id, playlists, &now));
        }

        Ok(IngestReport {
            artist_id,
            sections,
        })
    }

    fn refresh_links(&self, artist_id: &str, links: &[LinkPayload]) -> SectionReport {
        let mut report = SectionReport::new("external_links");
        let records: Vec<Record> = links.iter().map(|l| normalize_link(artist_id, l)).collect();

        match replace_all(
            self.gateway.as_ref(),
            "links",
            "artist_links",
            &[("artist_id", json!(artist_id))],
            &records,
        ) {
            Ok(()) => {
                report.processed = records.len();
                debug!("Replaced {} links for artist {}", records.len(), artist_id);
            }
            Err(e) => report.fail(artist_id, &e),
        }
        report
    }

    fn refresh_images(&self, artist_id: &str, visuals: &VisualsPayload) -> SectionReport {
        let mut report = SectionReport::new("images");
        let mut records = Vec::new();

        for (image_type, images) in [("avatar", &visuals.avatar), ("header", &visuals.header)] {
            if let Some(images) = images {
                for (position, image) in images.iter().enumerate() {
                    records.push(normalize_artist_image(artist_id, image_type, position, image));
                }
            }
        }
        // Gallery groups are flattened; the running position preserves the
        // source's group-then-item ordering.
        if let Some(gallery) = &visuals.gallery {
            let mut position = 0;
            for group in gallery {
                for image in group {
                    records.push(normalize_artist_image(artist_id, "gallery", position, image));
                    position += 1;
                }
            }
        }

        match replace_all(
            self.gateway.as_ref(),
            "images",
            "artist_images",
            &[("artist_id", json!(artist_id))],
            &records,
        ) {
            Ok(()) => {
                report.processed = records.len();
                debug!("Replaced {} images for artist {}", records.len(), artist_id);
            }
            Err(e) => report.fail(artist_id, &e),
        }
        report
    }

    fn refresh_top_cities(&self, artist_id: &str, cities: &[CityPayload]) -> SectionReport {
        let mut report = SectionReport::new("top_cities");
        let records: Vec<Record> = cities
            .iter()
            .enumerate()
            .map(|(i, city)| normalize_top_city(artist_id, i + 1, city))
            .collect();

        match replace_all(
            self.gateway.as_ref(),
            "top cities",
            "artist_top_cities",
            &[("artist_id", json!(artist_id))],
            &records,
        ) {
            Ok(()) => {
                report.processed = records.len();
                debug!("Replaced {} top cities for artist {}", records.len(), artist_id);
            }
            Err(e) => report.fail(artist_id, &e),
        }
        report
    }

    fn process_discography(
        &self,
        artist_id: &str,
        discography: &DiscographyPayload,
        now: &str,
    ) -> SectionReport {
        let mut report = SectionReport::new("discography");

        let latest: Vec<AlbumPayload> = discography.latest.clone().into_iter().collect();
        let empty = Vec::new();
        let groups: [(&str, &Vec<AlbumPayload>); 5] = [
            ("latest", &latest),
            ("singles", discography.singles.as_ref().unwrap_or(&empty)),
            ("albums", discography.albums.as_ref().unwrap_or(&empty)),
            (
                "compilations",
                discography.compilations.as_ref().unwrap_or(&empty),
            ),
            (
                "popular_releases",
                discography.popular_releases.as_ref().unwrap_or(&empty),
            ),
        ];

        for (group, albums) in groups {
            for album in albums {
                match self.process_album(artist_id, album, group, now) {
                    Ok(()) => report.processed += 1,
                    Err(e) => {
                        report.fail(album.id.clone().unwrap_or_else(|| format!("<{group}>")), &e)
                    }
                }
            }
        }
        debug!(
            "Processed {} discography albums for artist {} ({} failed)",
            report.processed,
            artist_id,
            report.failures.len()
        );
        report
    }

    fn process_album(
        &self,
        artist_id: &str,
        album: &AlbumPayload,
        group: &str,
        now: &str,
    ) -> Result<(), IngestError> {
        let record = normalize_album(album, group, now)?;
        let album_id = record["id"].as_str().unwrap_or_default().to_string();

        // Parent row before the relationship row.
        merge_upsert(self.gateway.as_ref(), "albums", &[record], &["id"])?;
        merge_upsert(
            self.gateway.as_ref(),
            "artist_albums",
            &[normalize_artist_album(artist_id, &album_id, group)],
            &["artist_id", "album_id", "album_group"],
        )?;

        if let Some(covers) = &album.cover {
            let records: Vec<Record> = covers
                .iter()
                .enumerate()
                .map(|(i, img)| normalize_album_image(&album_id, i, img))
                .collect();
            replace_all(
                self.gateway.as_ref(),
                "album images",
                "album_images",
                &[("album_id", json!(album_id))],
                &records,
            )?;
        }
        if let Some(copyrights) = &album.copyright {
            let records: Vec<Record> = copyrights
                .iter()
                .map(|c| normalize_album_copyright(&album_id, c))
                .collect();
            replace_all(
                self.gateway.as_ref(),
                "album copyrights",
                "album_copyrights",
                &[("album_id", json!(album_id))],
                &records,
            )?;
        }
        Ok(())
    }

    fn process_top_tracks(
        &self,
        artist_id: &str,
        tracks: &[TrackPayload],
        now: &str,
    ) -> SectionReport {
        let mut report = SectionReport::new("top_tracks");

        for track in tracks {
            match self.process_top_track(artist_id, track, now) {
                Ok(()) => report.processed += 1,
                Err(e) => report.fail(track.id.clone().unwrap_or_else(|| "<track>".into()), &e),
            }
        }
        debug!(
            "Processed {} top tracks for artist {} ({} failed)",
            report.processed,
            artist_id,
            report.failures.len()
        );
        report
    }

    fn process_top_track(
        &self,
        artist_id: &str,
        track: &TrackPayload,
        now: &str,
    ) -> Result<(), IngestError> {
        let record = normalize_track(track, now)?;
        let track_id = record["id"].as_str().unwrap_or_default().to_string();

        merge_upsert(self.gateway.as_ref(), "tracks", &[record], &["id"])?;
        merge_upsert(
            self.gateway.as_ref(),
            "artist_tracks",
            &[normalize_artist_track(artist_id, &track_id, true, true)],
            &["artist_id", "track_id"],
        )?;

        // Co-credited artists get non-primary rows, backed by stub artist
        // records so the foreign key always resolves.
        if let Some(credits) = &track.artists {
            for credit in credits {
                let Some(credit_id) = credit.id.as_deref().filter(|id| !id.is_empty()) else {
                    continue;
                };
                if credit_id == artist_id {
                    continue;
                }
                let stub = normalize_artist_stub(credit, now)?;
                merge_upsert(self.gateway.as_ref(), "artists", &[stub], &["id"])?;
                merge_upsert(
                    self.gateway.as_ref(),
                    "artist_tracks",
                    &[normalize_artist_track(credit_id, &track_id, false, false)],
                    &["artist_id", "track_id"],
                )?;
            }
        }
        Ok(())
    }

    fn process_related_artists(
        &self,
        artist_id: &str,
        related: &[ArtistRefPayload],
        now: &str,
    ) -> SectionReport {
        let mut report = SectionReport::new("related_artists");

        for reference in related {
            let result = (|| -> Result<(), IngestError> {
                let stub = normalize_artist_stub(reference, now)?;
                let related_id = stub["id"].as_str().unwrap_or_default().to_string();
                // Stub row first, then the (additive-only) relationship.
                merge_upsert(self.gateway.as_ref(), "artists", &[stub], &["id"])?;
                merge_upsert(
                    self.gateway.as_ref(),
                    "related_artists",
                    &[normalize_related_artist(artist_id, &related_id)],
                    &["artist_id", "related_artist_id"],
                )?;
                Ok(())
            })();

            match result {
                Ok(()) => report.processed += 1,
                Err(e) => {
                    report.fail(reference.id.clone().unwrap_or_else(|| "<artist>".into()), &e)
                }
            }
        }
        debug!(
            "Processed {} related artists for artist {} ({} failed)",
            report.processed,
            artist_id,
            report.failures.len()
        );
        report
    }

    fn process_playlists(
        &self,
        artist_id: &str,
        playlists: &[PlaylistPayload],
        now: &str,
    ) -> SectionReport {
        let mut report = SectionReport::new("playlists");
        let mut relationship_records = Vec::new();

        for playlist in playlists {
            let result = (|| -> Result<Record, IngestError> {
                let record = normalize_playlist(playlist, now)?;
                let playlist_id = record["id"].as_str().unwrap_or_default().to_string();

                merge_upsert(self.gateway.as_ref(), "playlists", &[record], &["id"])?;

                if let Some(covers) = &playlist.cover {
                    let records: Vec<Record> = covers
                        .iter()
                        .enumerate()
                        .map(|(i, img)| normalize_playlist_image(&playlist_id, i, img))
                        .collect();
                    replace_all(
                        self.gateway.as_ref(),
                        "playlist images",
                        "playlist_images",
                        &[("playlist_id", json!(playlist_id))],
                        &records,
                    )?;
                }
                Ok(normalize_artist_playlist(
                    artist_id,
                    &playlist_id,
                    PLAYLIST_REL_DISCOVERED_ON,
                ))
            })();

            match result {
                Ok(relationship) => {
                    relationship_records.push(relationship);
                    report.processed += 1;
                }
                Err(e) => {
                    report.fail(playlist.id.clone().unwrap_or_else(|| "<playlist>".into()), &e)
                }
            }
        }

        // The relationship set is replaced scoped to this relationship type;
        // rows of other types for the same artist stay untouched.
        if let Err(e) = replace_all(
            self.gateway.as_ref(),
            "artist playlists",
            "artist_playlists",
            &[
                ("artist_id", json!(artist_id)),
                ("relationship_type", json!(PLAYLIST_REL_DISCOVERED_ON)),
            ],
            &relationship_records,
        ) {
            report.fail(artist_id, &e);
        }

        debug!(
            "Processed {} playlists for artist {} ({} failed)",
            report.processed,
            artist_id,
            report.failures.len()
        );
        report
    }
}
