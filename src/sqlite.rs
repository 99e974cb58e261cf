/// The sqlite module is the SQLite persistence backend. It owns the database session, the
/// predicate builder for list queries, and one repository per table implementing the
/// store capabilities from the common module.
///
/// All writes are upserts: entity inserts use a single parameterized
/// `INSERT ... SELECT ... WHERE NOT EXISTS` keyed on the natural key, and discography
/// link inserts use `INSERT OR IGNORE` keyed on the composite primary key, resolving
/// foreign keys through correlated subqueries against the owning tables. Statements are
/// compiled lazily on first use and reused through the connection's prepared-statement
/// cache.
use crate::common::{
    Album, AlbumAttributes, AlbumDiscogStore, AlbumStore, Artist, ArtistAttributes, ArtistStore, Genre, GenreAttributes, GenreStore, Predicates, Song,
    SongAttributes, SongDiscogStore, SongStore,
};
use crate::errors::Result;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use tracing::error;

/// Connect to the SQLite database with appropriate settings.
pub fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA busy_timeout = 15000;
        ",
    )?;
    Ok(conn)
}

/// An open connection to the library database. All repositories execute through the
/// session's connection; at most one transaction is active at a time.
pub struct Session {
    conn: Connection,
}

impl Session {
    pub fn open(path: &Path) -> Result<Session> {
        Ok(Session { conn: connect(path)? })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begin the session's single active transaction. The transaction rolls back on
    /// drop unless committed.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Discard every cached prepared statement. Called after dropping tables so that no
    /// cached statement outlives the schema it was compiled against.
    pub fn flush_statements(&self) {
        self.conn.flush_prepared_statement_cache();
    }

    pub fn artists(&self) -> ArtistTable<'_> {
        ArtistTable::new(&self.conn)
    }

    pub fn genres(&self) -> GenreTable<'_> {
        GenreTable::new(&self.conn)
    }

    pub fn albums(&self) -> AlbumTable<'_> {
        AlbumTable::new(&self.conn)
    }

    pub fn songs(&self) -> SongTable<'_> {
        SongTable::new(&self.conn)
    }
}

/// Append WHERE clauses for the recognized predicates to the query and return the
/// positional arguments matching placeholder order.
///
/// Conditions are emitted in a fixed order (artist, album, genre) no matter how the map
/// iterates. Unrecognized keys and empty values are silently ignored.
pub fn append_predicates(query: &mut String, predicates: &Predicates) -> Vec<String> {
    const COLUMNS: &[(&str, &str)] = &[
        ("artistID", "artists.artist_id"),
        ("albumID", "albums.album_id"),
        ("genreID", "genres.genre_id"),
    ];

    let mut args = Vec::new();
    for (key, column) in COLUMNS {
        let value = match predicates.get(*key) {
            Some(v) if !v.is_empty() => v,
            _ => continue,
        };
        query.push_str(if args.is_empty() { " WHERE " } else { " AND " });
        query.push_str(column);
        query.push_str(" = ?");
        args.push(value.clone());
    }
    args
}

/// Log a database failure at its origin and convert it into the crate error. "No rows"
/// is never routed through here; absence is represented as None/empty, not an error.
fn logged<T>(what: &str, result: rusqlite::Result<T>) -> Result<T> {
    result.map_err(|e| {
        error!("{what}: {e}");
        e.into()
    })
}

fn select_all<T, F>(conn: &Connection, base: &str, predicates: &Predicates, what: &str, decode: F) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut query = base.to_string();
    let args = append_predicates(&mut query, predicates);
    let mut stmt = logged(what, conn.prepare(&query))?;
    let rows = logged(what, stmt.query_map(params_from_iter(args.iter()), decode))?;
    let mut results = Vec::new();
    for row in rows {
        results.push(logged(what, row)?);
    }
    Ok(results)
}

/// Repository for the 'artists' table.
pub struct ArtistTable<'c> {
    conn: &'c Connection,
}

impl<'c> ArtistTable<'c> {
    pub fn new(conn: &'c Connection) -> ArtistTable<'c> {
        ArtistTable { conn }
    }
}

fn artist_from_row(row: &Row<'_>) -> rusqlite::Result<Artist> {
    Ok(Artist {
        id: row.get(0)?,
        attributes: ArtistAttributes {
            name: row.get(1)?,
            sort: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        },
    })
}

impl ArtistStore for ArtistTable<'_> {
    fn create_table(&self) -> Result<()> {
        logged(
            "create artists table",
            self.conn.execute(
                "CREATE TABLE IF NOT EXISTS artists (
                    artist_id   INTEGER PRIMARY KEY,
                    artist_name TEXT    NOT NULL,
                    artist_sort TEXT
                )",
                [],
            ),
        )?;
        Ok(())
    }

    fn drop_table(&self) -> Result<()> {
        logged("drop artists table", self.conn.execute("DROP TABLE IF EXISTS artists", []))?;
        Ok(())
    }

    fn create_artist(&self, attributes: &ArtistAttributes) -> Result<()> {
        let mut stmt = logged(
            "prepare artist insert",
            self.conn.prepare_cached(
                "INSERT INTO artists (artist_name, artist_sort)
                 SELECT ?1, ?2
                 WHERE NOT EXISTS (SELECT 1 FROM artists WHERE artist_name = ?1 AND artist_sort = ?2)",
            ),
        )?;
        logged("insert artist", stmt.execute(params![attributes.name, attributes.sort]))?;
        Ok(())
    }

    fn artist(&self, id: i64) -> Result<Option<Artist>> {
        logged(
            "query artist by id",
            self.conn
                .query_row("SELECT artist_id, artist_name, artist_sort FROM artists WHERE artist_id = ?1", params![id], artist_from_row)
                .optional(),
        )
    }

    fn artists(&self, predicates: &Predicates) -> Result<Vec<Artist>> {
        select_all(
            self.conn,
            "SELECT artist_id, artist_name, artist_sort FROM artists",
            predicates,
            "query artists",
            artist_from_row,
        )
    }
}

/// Repository for the 'genres' table.
pub struct GenreTable<'c> {
    conn: &'c Connection,
}

impl<'c> GenreTable<'c> {
    pub fn new(conn: &'c Connection) -> GenreTable<'c> {
        GenreTable { conn }
    }
}

fn genre_from_row(row: &Row<'_>) -> rusqlite::Result<Genre> {
    Ok(Genre {
        id: row.get(0)?,
        attributes: GenreAttributes { name: row.get(1)? },
    })
}

impl GenreStore for GenreTable<'_> {
    fn create_table(&self) -> Result<()> {
        logged(
            "create genres table",
            self.conn.execute(
                "CREATE TABLE IF NOT EXISTS genres (
                    genre_id   INTEGER PRIMARY KEY,
                    genre_name TEXT    UNIQUE NOT NULL
                )",
                [],
            ),
        )?;
        Ok(())
    }

    fn drop_table(&self) -> Result<()> {
        logged("drop genres table", self.conn.execute("DROP TABLE IF EXISTS genres", []))?;
        Ok(())
    }

    fn create_genre(&self, attributes: &GenreAttributes) -> Result<()> {
        let mut stmt = logged(
            "prepare genre insert",
            self.conn.prepare_cached(
                "INSERT INTO genres (genre_name)
                 SELECT ?1
                 WHERE NOT EXISTS (SELECT 1 FROM genres WHERE genre_name = ?1)",
            ),
        )?;
        logged("insert genre", stmt.execute(params![attributes.name]))?;
        Ok(())
    }

    fn genre(&self, id: i64) -> Result<Option<Genre>> {
        logged(
            "query genre by id",
            self.conn
                .query_row("SELECT genre_id, genre_name FROM genres WHERE genre_id = ?1", params![id], genre_from_row)
                .optional(),
        )
    }

    fn genres(&self) -> Result<Vec<Genre>> {
        select_all(self.conn, "SELECT genre_id, genre_name FROM genres", &Predicates::new(), "query genres", genre_from_row)
    }
}

/// Repository for the 'albums' table. Reads join through the album discography to reach
/// the credited artist and the genre.
pub struct AlbumTable<'c> {
    conn: &'c Connection,
}

const ALBUM_SELECT: &str = "
    SELECT
        albums.album_id,
        albums.album_name,
        albums.album_sort,
        artists.artist_name,
        artists.artist_sort,
        genres.genre_name,
        albums.release_date,
        albums.album_artist,
        albums.album_artist_sort
    FROM album_discographies
    INNER JOIN artists ON album_discographies.artist_id = artists.artist_id
    INNER JOIN albums ON album_discographies.album_id = albums.album_id
    INNER JOIN genres ON albums.genre_id = genres.genre_id";

impl<'c> AlbumTable<'c> {
    pub fn new(conn: &'c Connection) -> AlbumTable<'c> {
        AlbumTable { conn }
    }
}

fn album_from_row(row: &Row<'_>) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        attributes: AlbumAttributes {
            name: row.get(1)?,
            sort: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            artist_name: row.get(3)?,
            artist_sort: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            genre_name: row.get(5)?,
            release_date: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            album_artist: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            album_artist_sort: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        },
    })
}

impl AlbumStore for AlbumTable<'_> {
    fn create_table(&self) -> Result<()> {
        logged(
            "create albums table",
            self.conn.execute(
                "CREATE TABLE IF NOT EXISTS albums (
                    album_id          INTEGER PRIMARY KEY,
                    album_name        TEXT    NOT NULL,
                    artist_id         INTEGER,
                    genre_id          INTEGER,
                    release_date      TEXT,
                    album_sort        TEXT,
                    album_artist      TEXT,
                    album_artist_sort TEXT,
                    FOREIGN KEY('artist_id') REFERENCES artists('artist_id'),
                    FOREIGN KEY('genre_id')  REFERENCES genres('genre_id')
                )",
                [],
            ),
        )?;
        Ok(())
    }

    fn drop_table(&self) -> Result<()> {
        logged("drop albums table", self.conn.execute("DROP TABLE IF EXISTS albums", []))?;
        Ok(())
    }

    fn create_album(&self, attributes: &AlbumAttributes) -> Result<()> {
        let mut stmt = logged(
            "prepare album insert",
            self.conn.prepare_cached(
                "INSERT INTO albums
                        (album_name, artist_id, genre_id, release_date, album_sort, album_artist, album_artist_sort)
                 SELECT ?1,
                        (SELECT artist_id FROM artists WHERE artist_name = ?2 AND artist_sort = ?3),
                        (SELECT genre_id FROM genres WHERE genre_name = ?4),
                        ?5, ?6, ?7, ?8
                 WHERE NOT EXISTS (
                     SELECT 1 FROM albums
                     WHERE album_name = ?1
                       AND album_sort = ?6
                       AND release_date = ?5
                       AND artist_id = (SELECT artist_id FROM artists WHERE artist_name = ?2 AND artist_sort = ?3)
                       AND genre_id = (SELECT genre_id FROM genres WHERE genre_name = ?4)
                 )",
            ),
        )?;
        logged(
            "insert album",
            stmt.execute(params![
                attributes.name,
                attributes.artist_name,
                attributes.artist_sort,
                attributes.genre_name,
                attributes.release_date,
                attributes.sort,
                attributes.album_artist,
                attributes.album_artist_sort,
            ]),
        )?;
        Ok(())
    }

    fn album(&self, id: i64) -> Result<Option<Album>> {
        let query = format!("{ALBUM_SELECT} WHERE albums.album_id = ?1");
        logged("query album by id", self.conn.query_row(&query, params![id], album_from_row).optional())
    }

    fn albums(&self, predicates: &Predicates) -> Result<Vec<Album>> {
        select_all(self.conn, ALBUM_SELECT, predicates, "query albums", album_from_row)
    }
}

/// Repository for the 'songs' table. Reads join through the song discography to reach
/// the credited artist and the genre; the linked album is a left join so songs with a
/// NULL album link still list.
pub struct SongTable<'c> {
    conn: &'c Connection,
}

const SONG_SELECT: &str = "
    SELECT
        songs.song_id,
        songs.file_path,
        songs.file_base,
        songs.file_dir,
        artists.artist_name,
        artists.artist_sort,
        genres.genre_name,
        songs.song_name,
        songs.release_date,
        songs.track_number,
        songs.disc_number,
        songs.duration_in_millis,
        songs.lyrics,
        songs.comments
    FROM song_discographies
    INNER JOIN songs ON song_discographies.song_id = songs.song_id
    INNER JOIN artists ON song_discographies.artist_id = artists.artist_id
    INNER JOIN genres ON songs.genre_id = genres.genre_id
    LEFT JOIN albums ON song_discographies.album_id = albums.album_id";

impl<'c> SongTable<'c> {
    pub fn new(conn: &'c Connection) -> SongTable<'c> {
        SongTable { conn }
    }
}

fn song_from_row(row: &Row<'_>) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        attributes: SongAttributes {
            file_path: row.get(1)?,
            file_base: row.get(2)?,
            file_dir: row.get(3)?,
            artist_name: row.get(4)?,
            artist_sort: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            genre_name: row.get(6)?,
            name: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            release_date: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
            track_number: row.get(9)?,
            disc_number: row.get(10)?,
            duration_in_millis: row.get(11)?,
            lyrics: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
            comments: row.get::<_, Option<String>>(13)?.unwrap_or_default(),
        },
    })
}

impl SongStore for SongTable<'_> {
    fn create_table(&self) -> Result<()> {
        logged(
            "create songs table",
            self.conn.execute(
                "CREATE TABLE IF NOT EXISTS songs (
                    song_id            INTEGER PRIMARY KEY,
                    file_path          TEXT    NOT NULL,
                    file_base          TEXT    NOT NULL,
                    file_dir           TEXT    NOT NULL,
                    artist_id          INTEGER,
                    song_name          TEXT,
                    genre_id           INTEGER,
                    release_date       TEXT,
                    track_number       INTEGER,
                    disc_number        INTEGER,
                    duration_in_millis INTEGER,
                    lyrics             TEXT,
                    comments           TEXT,
                    FOREIGN KEY('artist_id') REFERENCES artists('artist_id'),
                    FOREIGN KEY('genre_id')  REFERENCES genres('genre_id')
                )",
                [],
            ),
        )?;
        Ok(())
    }

    fn drop_table(&self) -> Result<()> {
        logged("drop songs table", self.conn.execute("DROP TABLE IF EXISTS songs", []))?;
        Ok(())
    }

    fn create_song(&self, attributes: &SongAttributes) -> Result<()> {
        let mut stmt = logged(
            "prepare song insert",
            self.conn.prepare_cached(
                "INSERT INTO songs
                        (file_path, file_base, file_dir, artist_id, song_name, genre_id,
                         release_date, track_number, disc_number, duration_in_millis, lyrics, comments)
                 SELECT ?1, ?2, ?3,
                        (SELECT artist_id FROM artists WHERE artist_name = ?4 AND artist_sort = ?5),
                        ?6,
                        (SELECT genre_id FROM genres WHERE genre_name = ?7),
                        ?8, ?9, ?10, ?11, ?12, ?13
                 WHERE NOT EXISTS (SELECT 1 FROM songs WHERE file_path = ?1)",
            ),
        )?;
        logged(
            "insert song",
            stmt.execute(params![
                attributes.file_path,
                attributes.file_base,
                attributes.file_dir,
                attributes.artist_name,
                attributes.artist_sort,
                attributes.name,
                attributes.genre_name,
                attributes.release_date,
                attributes.track_number,
                attributes.disc_number,
                attributes.duration_in_millis,
                attributes.lyrics,
                attributes.comments,
            ]),
        )?;
        Ok(())
    }

    fn song(&self, id: i64) -> Result<Option<Song>> {
        let query = format!("{SONG_SELECT} WHERE songs.song_id = ?1");
        logged("query song by id", self.conn.query_row(&query, params![id], song_from_row).optional())
    }

    fn song_by_path(&self, file_path: &str) -> Result<Option<Song>> {
        let query = format!("{SONG_SELECT} WHERE songs.file_path = ?1");
        logged("query song by path", self.conn.query_row(&query, params![file_path], song_from_row).optional())
    }

    fn songs(&self, predicates: &Predicates) -> Result<Vec<Song>> {
        select_all(self.conn, SONG_SELECT, predicates, "query songs", song_from_row)
    }
}

/// Repository for the 'album_discographies' link table.
pub struct AlbumDiscogTable<'c> {
    conn: &'c Connection,
}

impl<'c> AlbumDiscogTable<'c> {
    pub fn new(conn: &'c Connection) -> AlbumDiscogTable<'c> {
        AlbumDiscogTable { conn }
    }
}

impl AlbumDiscogStore for AlbumDiscogTable<'_> {
    fn create_table(&self) -> Result<()> {
        logged(
            "create album_discographies table",
            self.conn.execute(
                "CREATE TABLE IF NOT EXISTS album_discographies (
                    artist_id INTEGER NOT NULL,
                    album_id  INTEGER NOT NULL,
                    PRIMARY KEY('artist_id', 'album_id'),
                    FOREIGN KEY('artist_id') REFERENCES artists('artist_id'),
                    FOREIGN KEY('album_id')  REFERENCES albums('album_id')
                )",
                [],
            ),
        )?;
        Ok(())
    }

    fn drop_table(&self) -> Result<()> {
        logged("drop album_discographies table", self.conn.execute("DROP TABLE IF EXISTS album_discographies", []))?;
        Ok(())
    }

    fn create_album_discog(&self, attributes: &AlbumAttributes) -> Result<()> {
        let mut stmt = logged(
            "prepare album discography insert",
            self.conn.prepare_cached(
                "INSERT OR IGNORE INTO album_discographies (artist_id, album_id)
                 SELECT (SELECT artist_id FROM artists WHERE artist_name = ?1 AND artist_sort = ?2),
                        (SELECT album_id FROM albums
                          WHERE album_name = ?3
                            AND album_sort = ?4
                            AND release_date = ?5
                            AND artist_id = (SELECT artist_id FROM artists WHERE artist_name = ?1 AND artist_sort = ?2)
                            AND genre_id = (SELECT genre_id FROM genres WHERE genre_name = ?6))",
            ),
        )?;
        logged(
            "insert album discography",
            stmt.execute(params![
                attributes.artist_name,
                attributes.artist_sort,
                attributes.name,
                attributes.sort,
                attributes.release_date,
                attributes.genre_name,
            ]),
        )?;
        Ok(())
    }
}

/// Repository for the 'song_discographies' link table.
pub struct SongDiscogTable<'c> {
    conn: &'c Connection,
}

impl<'c> SongDiscogTable<'c> {
    pub fn new(conn: &'c Connection) -> SongDiscogTable<'c> {
        SongDiscogTable { conn }
    }
}

impl SongDiscogStore for SongDiscogTable<'_> {
    fn create_table(&self) -> Result<()> {
        logged(
            "create song_discographies table",
            self.conn.execute(
                "CREATE TABLE IF NOT EXISTS song_discographies (
                    artist_id INTEGER NOT NULL,
                    song_id   INTEGER NOT NULL,
                    album_id  INTEGER,
                    PRIMARY KEY('artist_id', 'song_id'),
                    FOREIGN KEY('artist_id') REFERENCES artists('artist_id'),
                    FOREIGN KEY('song_id')   REFERENCES songs('song_id'),
                    FOREIGN KEY('album_id')  REFERENCES albums('album_id')
                )",
                [],
            ),
        )?;
        Ok(())
    }

    fn drop_table(&self) -> Result<()> {
        logged("drop song_discographies table", self.conn.execute("DROP TABLE IF EXISTS song_discographies", []))?;
        Ok(())
    }

    fn create_song_discog(&self, song: &SongAttributes, album: &AlbumAttributes) -> Result<()> {
        let mut stmt = logged(
            "prepare song discography insert",
            self.conn.prepare_cached(
                "INSERT OR IGNORE INTO song_discographies (artist_id, song_id, album_id)
                 SELECT (SELECT artist_id FROM artists WHERE artist_name = ?1 AND artist_sort = ?2),
                        (SELECT song_id FROM songs WHERE file_path = ?3),
                        (SELECT album_id FROM albums WHERE album_name = ?4 AND album_sort = ?5)",
            ),
        )?;
        logged(
            "insert song discography",
            stmt.execute(params![song.artist_name, song.artist_sort, song.file_path, album.name, album.sort]),
        )?;
        Ok(())
    }
}
