//! SQLite schema for the metadata database.
//!
//! Collections are keyed by the source API's opaque string ids; relationship
//! tables carry composite unique keys so upserts can target them with
//! `ON CONFLICT`. Replace-on-refresh tables (links, images, cities,
//! copyrights, artist_playlists) deliberately have no unique key beyond
//! their owner scope: they are always cleared and reinserted as a set.

use anyhow::{bail, Result};
use rusqlite::Connection;

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub non_null: bool,
}

macro_rules! col {
    ($name:expr, $sql_type:expr) => {
        Column {
            name: $name,
            sql_type: $sql_type,
            non_null: false,
        }
    };
    ($name:expr, $sql_type:expr, non_null) => {
        Column {
            name: $name,
            sql_type: $sql_type,
            non_null: true,
        }
    };
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut sql = format!("CREATE TABLE {} (", self.name);
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(column.name);
            sql.push_str(match column.sql_type {
                SqlType::Text => " TEXT",
                SqlType::Integer => " INTEGER",
            });
            if column.non_null {
                sql.push_str(" NOT NULL");
            }
        }
        for unique in self.unique_constraints {
            sql.push_str(&format!(", UNIQUE ({})", unique.join(", ")));
        }
        sql.push_str(");");
        conn.execute(&sql, [])?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                [],
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// Core entity tables
// =============================================================================

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        col!("id", SqlType::Text, non_null), // source base62 id
        col!("name", SqlType::Text),
        col!("share_url", SqlType::Text),
        col!("verified", SqlType::Integer),
        col!("biography", SqlType::Text),
        col!("followers", SqlType::Integer),
        col!("monthly_listeners", SqlType::Integer),
        col!("world_rank", SqlType::Integer),
        col!("updated_at", SqlType::Text, non_null),
    ],
    indices: &[("idx_artists_listeners", "monthly_listeners")],
    unique_constraints: &[&["id"]],
};

const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        col!("id", SqlType::Text, non_null),
        col!("name", SqlType::Text),
        col!("share_url", SqlType::Text),
        col!("album_type", SqlType::Text), // latest|singles|albums|compilations|popular_releases
        col!("label", SqlType::Text),
        col!("track_count", SqlType::Integer),
        col!("release_date", SqlType::Text), // source payload withholds it, stays null
        col!("updated_at", SqlType::Text, non_null),
    ],
    indices: &[],
    unique_constraints: &[&["id"]],
};

const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        col!("id", SqlType::Text, non_null),
        col!("name", SqlType::Text),
        col!("share_url", SqlType::Text),
        col!("explicit", SqlType::Integer),
        col!("duration_ms", SqlType::Integer),
        col!("disc_number", SqlType::Integer),
        col!("play_count", SqlType::Integer),
        col!("album_id", SqlType::Text),
        col!("updated_at", SqlType::Text, non_null),
    ],
    indices: &[
        ("idx_tracks_album", "album_id"),
        ("idx_tracks_play_count", "play_count"),
    ],
    unique_constraints: &[&["id"]],
};

const PLAYLISTS_TABLE: Table = Table {
    name: "playlists",
    columns: &[
        col!("id", SqlType::Text, non_null),
        col!("name", SqlType::Text),
        col!("share_url", SqlType::Text),
        col!("description", SqlType::Text),
        col!("owner_name", SqlType::Text),
        col!("updated_at", SqlType::Text, non_null),
    ],
    indices: &[],
    unique_constraints: &[&["id"]],
};

// =============================================================================
// Replace-on-refresh child tables
// =============================================================================

const ARTIST_LINKS_TABLE: Table = Table {
    name: "artist_links",
    columns: &[
        col!("artist_id", SqlType::Text, non_null),
        col!("name", SqlType::Text),
        col!("url", SqlType::Text),
    ],
    indices: &[("idx_artist_links_artist", "artist_id")],
    unique_constraints: &[],
};

const ARTIST_IMAGES_TABLE: Table = Table {
    name: "artist_images",
    columns: &[
        col!("artist_id", SqlType::Text, non_null),
        col!("image_type", SqlType::Text, non_null), // avatar|header|gallery
        col!("url", SqlType::Text),
        col!("width", SqlType::Integer),
        col!("height", SqlType::Integer),
        col!("position", SqlType::Integer, non_null),
    ],
    indices: &[("idx_artist_images_artist", "artist_id")],
    unique_constraints: &[],
};

const ARTIST_TOP_CITIES_TABLE: Table = Table {
    name: "artist_top_cities",
    columns: &[
        col!("artist_id", SqlType::Text, non_null),
        col!("city", SqlType::Text),
        col!("country", SqlType::Text),
        col!("region", SqlType::Text),
        col!("listeners", SqlType::Integer),
        col!("rank", SqlType::Integer, non_null),
    ],
    indices: &[("idx_artist_top_cities_artist", "artist_id")],
    unique_constraints: &[],
};

const ALBUM_IMAGES_TABLE: Table = Table {
    name: "album_images",
    columns: &[
        col!("album_id", SqlType::Text, non_null),
        col!("url", SqlType::Text),
        col!("width", SqlType::Integer),
        col!("height", SqlType::Integer),
        col!("position", SqlType::Integer, non_null),
    ],
    indices: &[("idx_album_images_album", "album_id")],
    unique_constraints: &[],
};

const ALBUM_COPYRIGHTS_TABLE: Table = Table {
    name: "album_copyrights",
    columns: &[
        col!("album_id", SqlType::Text, non_null),
        col!("text", SqlType::Text),
        col!("copyright_type", SqlType::Text),
    ],
    indices: &[("idx_album_copyrights_album", "album_id")],
    unique_constraints: &[],
};

const PLAYLIST_IMAGES_TABLE: Table = Table {
    name: "playlist_images",
    columns: &[
        col!("playlist_id", SqlType::Text, non_null),
        col!("url", SqlType::Text),
        col!("width", SqlType::Integer),
        col!("height", SqlType::Integer),
        col!("position", SqlType::Integer, non_null),
    ],
    indices: &[("idx_playlist_images_playlist", "playlist_id")],
    unique_constraints: &[],
};

const ARTIST_PLAYLISTS_TABLE: Table = Table {
    name: "artist_playlists",
    columns: &[
        col!("artist_id", SqlType::Text, non_null),
        col!("playlist_id", SqlType::Text, non_null),
        col!("relationship_type", SqlType::Text, non_null), // e.g. discovered_on
    ],
    indices: &[("idx_artist_playlists_artist", "artist_id")],
    unique_constraints: &[&["artist_id", "playlist_id", "relationship_type"]],
};

// =============================================================================
// Merge-upsert relationship tables
// =============================================================================

const ARTIST_ALBUMS_TABLE: Table = Table {
    name: "artist_albums",
    columns: &[
        col!("artist_id", SqlType::Text, non_null),
        col!("album_id", SqlType::Text, non_null),
        // The same album can appear for an artist under multiple groups
        // (e.g. both "albums" and "popular_releases"), as distinct rows.
        col!("album_group", SqlType::Text, non_null),
    ],
    indices: &[
        ("idx_artist_albums_artist", "artist_id"),
        ("idx_artist_albums_album", "album_id"),
    ],
    unique_constraints: &[&["artist_id", "album_id", "album_group"]],
};

const ARTIST_TRACKS_TABLE: Table = Table {
    name: "artist_tracks",
    columns: &[
        col!("artist_id", SqlType::Text, non_null),
        col!("track_id", SqlType::Text, non_null),
        col!("is_primary", SqlType::Integer, non_null),
        col!("is_top_track", SqlType::Integer, non_null),
    ],
    indices: &[
        ("idx_artist_tracks_artist", "artist_id"),
        ("idx_artist_tracks_track", "track_id"),
    ],
    unique_constraints: &[&["artist_id", "track_id"]],
};

const RELATED_ARTISTS_TABLE: Table = Table {
    name: "related_artists",
    columns: &[
        col!("artist_id", SqlType::Text, non_null),
        col!("related_artist_id", SqlType::Text, non_null),
    ],
    indices: &[("idx_related_artists_artist", "artist_id")],
    unique_constraints: &[&["artist_id", "related_artist_id"]],
};

// =============================================================================
// Rank cache tables, fully rebuilt by the rank-cache job
// =============================================================================

const ARTIST_RANK_CACHE_TABLE: Table = Table {
    name: "artist_rank_cache",
    columns: &[
        col!("artist_id", SqlType::Text, non_null),
        col!("rank", SqlType::Integer, non_null),
        col!("metric_value", SqlType::Integer, non_null),
    ],
    indices: &[],
    unique_constraints: &[&["artist_id"]],
};

const TRACK_RANK_CACHE_TABLE: Table = Table {
    name: "track_rank_cache",
    columns: &[
        col!("track_id", SqlType::Text, non_null),
        col!("rank", SqlType::Integer, non_null),
        col!("metric_value", SqlType::Integer, non_null),
    ],
    indices: &[],
    unique_constraints: &[&["track_id"]],
};

pub const ALL_TABLES: &[Table] = &[
    ARTISTS_TABLE,
    ALBUMS_TABLE,
    TRACKS_TABLE,
    PLAYLISTS_TABLE,
    ARTIST_LINKS_TABLE,
    ARTIST_IMAGES_TABLE,
    ARTIST_TOP_CITIES_TABLE,
    ALBUM_IMAGES_TABLE,
    ALBUM_COPYRIGHTS_TABLE,
    PLAYLIST_IMAGES_TABLE,
    ARTIST_PLAYLISTS_TABLE,
    ARTIST_ALBUMS_TABLE,
    ARTIST_TRACKS_TABLE,
    RELATED_ARTISTS_TABLE,
    ARTIST_RANK_CACHE_TABLE,
    TRACK_RANK_CACHE_TABLE,
];

/// Create all tables on a fresh database. No-op guard: fails if any table
/// already exists, mirroring a create-only import flow.
pub fn create_schema(conn: &Connection) -> Result<()> {
    for table in ALL_TABLES {
        table.create(conn)?;
    }
    Ok(())
}

/// Validate that every expected table and column is present.
pub fn validate_schema(conn: &Connection) -> Result<()> {
    for table in ALL_TABLES {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table.name))?;
        let actual: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<_, _>>()?;

        if actual.is_empty() {
            bail!("Table {} is missing", table.name);
        }
        for column in table.columns {
            if !actual.iter().any(|name| name == column.name) {
                bail!("Table {} is missing column {}", table.name, column.name);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_creates_and_validates() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        validate_schema(&conn).unwrap();
    }

    #[test]
    fn test_validate_detects_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        // Only create part of the schema
        ALL_TABLES[0].create(&conn).unwrap();

        let result = validate_schema(&conn);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("is missing"));
    }

    #[test]
    fn test_artist_tracks_unique_pair() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO artist_tracks (artist_id, track_id, is_primary, is_top_track) VALUES ('a1', 't1', 1, 1)",
            [],
        )
        .unwrap();

        // Second insert for the same pair must violate the unique key
        let result = conn.execute(
            "INSERT INTO artist_tracks (artist_id, track_id, is_primary, is_top_track) VALUES ('a1', 't1', 0, 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_artist_albums_same_album_multiple_groups() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO artist_albums (artist_id, album_id, album_group) VALUES ('a1', 'al1', 'albums')",
            [],
        )
        .unwrap();
        // Same album under a different group is a distinct relationship row
        conn.execute(
            "INSERT INTO artist_albums (artist_id, album_id, album_group) VALUES ('a1', 'al1', 'popular_releases')",
            [],
        )
        .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM artist_albums", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}
