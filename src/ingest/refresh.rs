//! Refresh strategies for related-entity collections.
//!
//! Two policies cover every collection the orchestrator touches:
//!
//! - `replace_all`: the children are strictly "this owner's current snapshot"
//!   (links, images, top cities, copyrights, playlist relationships). Stale
//!   rows have no identity worth preserving, so the scope is cleared and the
//!   fresh set inserted.
//! - `merge_upsert`: the entity is independently meaningful or shared across
//!   artists (artists, albums, tracks, playlists, join rows). Rows are
//!   upserted by their unique key and never deleted, so references held by
//!   other artists survive a refresh.

use crate::error::IngestError;
use crate::store::{Filter, PersistenceGateway, Record};

/// Delete every child row matching `scope`, then insert `records`.
///
/// If the delete fails nothing is inserted: the old generation stays intact
/// rather than ending up merged with the new one.
pub fn replace_all(
    gateway: &dyn PersistenceGateway,
    entity: &'static str,
    collection: &str,
    scope: Filter,
    records: &[Record],
) -> Result<(), IngestError> {
    gateway
        .delete_where(collection, scope)
        .map_err(|source| IngestError::RefreshFailed { entity, source })?;
    gateway
        .insert_many(collection, records)
        .map_err(|source| IngestError::RefreshFailed { entity, source })?;
    Ok(())
}

/// Upsert `records` by `conflict_keys`. Never deletes.
pub fn merge_upsert(
    gateway: &dyn PersistenceGateway,
    collection: &str,
    records: &[Record],
    conflict_keys: &[&str],
) -> Result<(), IngestError> {
    gateway.upsert(collection, records, conflict_keys)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteGateway;
    use serde_json::{json, Value};

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn link(artist: &str, url: &str) -> Record {
        record(&[
            ("artist_id", json!(artist)),
            ("name", json!("site")),
            ("url", json!(url)),
        ])
    }

    #[test]
    fn test_replace_all_clears_previous_generation() {
        let gateway = SqliteGateway::open_in_memory().unwrap();
        let scope = [("artist_id", json!("a1"))];

        replace_all(
            &gateway,
            "links",
            "artist_links",
            &scope,
            &[link("a1", "u1"), link("a1", "u2")],
        )
        .unwrap();
        replace_all(&gateway, "links", "artist_links", &scope, &[link("a1", "u3")]).unwrap();

        let rows = gateway
            .select_where("artist_links", &scope, None, None)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["url"], json!("u3"));
    }

    #[test]
    fn test_replace_all_scope_does_not_touch_other_owners() {
        let gateway = SqliteGateway::open_in_memory().unwrap();

        replace_all(
            &gateway,
            "links",
            "artist_links",
            &[("artist_id", json!("a1"))],
            &[link("a1", "u1")],
        )
        .unwrap();
        replace_all(
            &gateway,
            "links",
            "artist_links",
            &[("artist_id", json!("a2"))],
            &[link("a2", "u2")],
        )
        .unwrap();

        let rows = gateway.select_where("artist_links", &[], None, None).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_replace_all_failure_is_refresh_failed() {
        let gateway = SqliteGateway::open_in_memory().unwrap();
        let err = replace_all(&gateway, "links", "no_such_table", &[], &[]).unwrap_err();
        assert!(matches!(
            err,
            IngestError::RefreshFailed { entity: "links", .. }
        ));
    }

    #[test]
    fn test_merge_upsert_is_additive() {
        let gateway = SqliteGateway::open_in_memory().unwrap();
        let pair = |related: &str| {
            record(&[
                ("artist_id", json!("a1")),
                ("related_artist_id", json!(related)),
            ])
        };
        let keys = ["artist_id", "related_artist_id"];

        merge_upsert(&gateway, "related_artists", &[pair("x"), pair("y")], &keys).unwrap();
        merge_upsert(&gateway, "related_artists", &[pair("y"), pair("z")], &keys).unwrap();

        let rows = gateway
            .select_where("related_artists", &[], None, None)
            .unwrap();
        assert_eq!(rows.len(), 3);
    }
}
