use crate::common::{
    AlbumAttributes, AlbumDiscogStore, AlbumStore, ArtistAttributes, ArtistStore, GenreAttributes, GenreStore, SongAttributes, SongDiscogStore, SongStore,
};
use crate::sqlite::{AlbumDiscogTable, AlbumTable, ArtistTable, GenreTable, Session, SongDiscogTable, SongTable};
use std::sync::Once;
use tempfile::TempDir;

static INIT: Once = Once::new();

pub fn init() -> TempDir {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")))
            .with_test_writer()
            .try_init();
    });
    TempDir::new().expect("failed to create temp dir")
}

// Creates a session against a fresh database with all six tables created.
pub fn session() -> (Session, TempDir) {
    let temp_dir = init();
    let mut session = Session::open(&temp_dir.path().join("library.sqlite3")).expect("failed to open session");
    create_tables(&mut session);
    (session, temp_dir)
}

pub fn create_tables(session: &mut Session) {
    let tx = session.transaction().expect("failed to begin transaction");
    GenreTable::new(&tx).create_table().expect("failed to create genres table");
    ArtistTable::new(&tx).create_table().expect("failed to create artists table");
    AlbumTable::new(&tx).create_table().expect("failed to create albums table");
    SongTable::new(&tx).create_table().expect("failed to create songs table");
    AlbumDiscogTable::new(&tx).create_table().expect("failed to create album_discographies table");
    SongDiscogTable::new(&tx).create_table().expect("failed to create song_discographies table");
    tx.commit().expect("failed to commit schema");
}

pub fn genre_attrs() -> GenreAttributes {
    GenreAttributes { name: "Techno".to_string() }
}

pub fn artist_attrs() -> ArtistAttributes {
    ArtistAttributes {
        name: "Techno Man".to_string(),
        sort: "Techno Man, The".to_string(),
    }
}

pub fn album_attrs() -> AlbumAttributes {
    AlbumAttributes {
        name: "Release 1".to_string(),
        sort: "Release 1".to_string(),
        artist_name: "Techno Man".to_string(),
        artist_sort: "Techno Man, The".to_string(),
        genre_name: "Techno".to_string(),
        release_date: "2023".to_string(),
        album_artist: "Techno Man".to_string(),
        album_artist_sort: "Techno Man, The".to_string(),
    }
}

pub fn song_attrs(file_path: &str, name: &str, track_number: i64) -> SongAttributes {
    SongAttributes {
        file_path: file_path.to_string(),
        file_base: file_path.rsplit('/').next().unwrap_or_default().to_string(),
        file_dir: file_path.rsplit_once('/').map(|(dir, _)| dir.to_string()).unwrap_or_default(),
        artist_name: "Techno Man".to_string(),
        artist_sort: "Techno Man, The".to_string(),
        name: name.to_string(),
        genre_name: "Techno".to_string(),
        release_date: "2023".to_string(),
        track_number: Some(track_number),
        disc_number: Some(1),
        duration_in_millis: Some(120_000),
        lyrics: String::new(),
        comments: String::new(),
    }
}

// Creates a session seeded with one artist, one genre, one album, two songs, and their
// discography links, the way an `add_path` ingestion would lay them down.
pub fn seeded_session() -> (Session, TempDir) {
    let (session, temp_dir) = session();
    let conn = session.connection();

    let genre = genre_attrs();
    let artist = artist_attrs();
    let album = album_attrs();
    GenreTable::new(conn).create_genre(&genre).expect("failed to insert genre");
    ArtistTable::new(conn).create_artist(&artist).expect("failed to insert artist");
    AlbumTable::new(conn).create_album(&album).expect("failed to insert album");
    AlbumDiscogTable::new(conn).create_album_discog(&album).expect("failed to insert album discography");

    for (path, name, track) in [("/music/r1/01.m4a", "Track 1", 1), ("/music/r1/02.m4a", "Track 2", 2)] {
        let song = song_attrs(path, name, track);
        SongTable::new(conn).create_song(&song).expect("failed to insert song");
        SongDiscogTable::new(conn).create_song_discog(&song, &album).expect("failed to insert song discography");
    }

    (session, temp_dir)
}

pub fn count_rows(session: &Session, table: &str) -> i64 {
    session
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .expect("failed to count rows")
}
