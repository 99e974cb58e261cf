/// The common module defines the entity records that the rest of the crate trades in, and
/// the store capabilities that persistence backends implement.
///
/// Each entity carries a surrogate integer ID assigned by the storage engine and an
/// attributes struct holding the business data. Deduplication happens on natural keys
/// (artist name+sort, genre name, album name+sort+date+artist+genre, song file path),
/// never on the surrogate ID.
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Filter mapping passed to list queries. Recognized keys are "artistID", "albumID" and
/// "genreID"; anything else is silently ignored.
pub type Predicates = HashMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub attributes: ArtistAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistAttributes {
    pub name: String,
    pub sort: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub attributes: GenreAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreAttributes {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub attributes: AlbumAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumAttributes {
    pub name: String,
    pub sort: String,
    pub artist_name: String,
    pub artist_sort: String,
    pub genre_name: String,
    pub release_date: String,
    pub album_artist: String,
    pub album_artist_sort: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub attributes: SongAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongAttributes {
    pub file_path: String,
    pub file_base: String,
    pub file_dir: String,
    pub artist_name: String,
    pub artist_sort: String,
    pub name: String,
    pub genre_name: String,
    pub release_date: String,
    pub track_number: Option<i64>,
    pub disc_number: Option<i64>,
    pub duration_in_millis: Option<i64>,
    pub lyrics: String,
    pub comments: String,
}

/// Manages interactions with the artist data source.
pub trait ArtistStore {
    fn create_table(&self) -> Result<()>;
    fn drop_table(&self) -> Result<()>;
    /// Upserts by natural key (name, sort). Inserting an already-present artist is a
    /// no-op, not an error.
    fn create_artist(&self, attributes: &ArtistAttributes) -> Result<()>;
    fn artist(&self, id: i64) -> Result<Option<Artist>>;
    fn artists(&self, predicates: &Predicates) -> Result<Vec<Artist>>;
}

/// Manages interactions with the genre data source.
pub trait GenreStore {
    fn create_table(&self) -> Result<()>;
    fn drop_table(&self) -> Result<()>;
    /// Upserts by the globally unique genre name.
    fn create_genre(&self, attributes: &GenreAttributes) -> Result<()>;
    fn genre(&self, id: i64) -> Result<Option<Genre>>;
    fn genres(&self) -> Result<Vec<Genre>>;
}

/// Manages interactions with the album data source.
pub trait AlbumStore {
    fn create_table(&self) -> Result<()>;
    fn drop_table(&self) -> Result<()>;
    /// Upserts by natural key (name, sort, release date, artist, genre). The artist and
    /// genre foreign keys are resolved from their natural keys at insert time; missing
    /// parents bind NULL rather than failing.
    fn create_album(&self, attributes: &AlbumAttributes) -> Result<()>;
    fn album(&self, id: i64) -> Result<Option<Album>>;
    fn albums(&self, predicates: &Predicates) -> Result<Vec<Album>>;
}

/// Manages interactions with the song data source.
pub trait SongStore {
    fn create_table(&self) -> Result<()>;
    fn drop_table(&self) -> Result<()>;
    /// Upserts by file path alone: re-ingesting the same path is a no-op even when the
    /// tags changed.
    fn create_song(&self, attributes: &SongAttributes) -> Result<()>;
    fn song(&self, id: i64) -> Result<Option<Song>>;
    fn song_by_path(&self, file_path: &str) -> Result<Option<Song>>;
    fn songs(&self, predicates: &Predicates) -> Result<Vec<Song>>;
}

/// Links artists to the albums they are credited on.
pub trait AlbumDiscogStore {
    fn create_table(&self) -> Result<()>;
    fn drop_table(&self) -> Result<()>;
    /// Insert-or-ignore on the (artist_id, album_id) composite key. Both IDs are
    /// resolved via correlated subqueries, so the owning rows must exist first.
    fn create_album_discog(&self, attributes: &AlbumAttributes) -> Result<()>;
}

/// Links artists to the songs they are credited on, with an optional album.
pub trait SongDiscogStore {
    fn create_table(&self) -> Result<()>;
    fn drop_table(&self) -> Result<()>;
    /// Insert-or-ignore on the (artist_id, song_id) composite key. A missing album
    /// silently yields a NULL album_id.
    fn create_song_discog(&self, song: &SongAttributes, album: &AlbumAttributes) -> Result<()>;
}
