/// The library module is the orchestrator: it owns the session lifecycle, the
/// whole-schema create/delete operations, and the directory-walk ingestion pipeline.
///
/// Every orchestrated operation runs in exactly one transaction. `add_path` is best
/// effort across files (a bad file is logged and skipped) but all-or-nothing at the
/// transaction level: a driver error from any insert, or a commit failure, discards the
/// entire batch.
use crate::common::{
    AlbumAttributes, AlbumDiscogStore, AlbumStore, ArtistAttributes, ArtistStore, GenreAttributes, GenreStore, SongAttributes, SongDiscogStore, SongStore,
};
use crate::config::Config;
use crate::errors::{Result, ShellacError};
use crate::sqlite::{AlbumDiscogTable, AlbumTable, ArtistTable, GenreTable, Session, SongDiscogTable, SongTable};
use crate::tags::{LoftyTagReader, TagData, TagReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Per-call accounting for `add_path`. `scanned` counts regular files visited,
/// `imported` those whose records were written, `skipped` those whose tags could not be
/// extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddPathSummary {
    pub scanned: usize,
    pub imported: usize,
    pub skipped: usize,
}

/// Handle on a media library stored at a database path. Holds at most one open session.
pub struct Library {
    db_path: PathBuf,
    session: Option<Session>,
    tags: Box<dyn TagReader>,
}

impl Library {
    pub fn new(db_path: impl Into<PathBuf>) -> Library {
        Library {
            db_path: db_path.into(),
            session: None,
            tags: Box::new(LoftyTagReader),
        }
    }

    pub fn from_config(config: &Config) -> Library {
        Library::new(config.library_database_path())
    }

    /// Replace the metadata extractor. Tests use this to ingest without real audio data.
    pub fn with_tag_reader(db_path: impl Into<PathBuf>, tags: Box<dyn TagReader>) -> Library {
        Library {
            db_path: db_path.into(),
            session: None,
            tags,
        }
    }

    /// Open a session against the library database. Opening while a session is already
    /// active is a sequencing error.
    pub fn open(&mut self) -> Result<()> {
        if self.session.is_some() {
            warn!("library session already opened");
            return Err(ShellacError::SessionAlreadyOpen);
        }
        self.session = Some(Session::open(&self.db_path)?);
        Ok(())
    }

    /// Close the current session. Closing with none active is a sequencing error.
    pub fn close(&mut self) -> Result<()> {
        if self.session.take().is_none() {
            warn!("no open library session to close");
            return Err(ShellacError::SessionNotOpen);
        }
        Ok(())
    }

    pub fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(ShellacError::SessionNotOpen)
    }

    /// Create all six library tables in one transaction, parents before children and
    /// link tables last. A failure mid-sequence rolls the whole batch back.
    pub fn create_library(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(ShellacError::SessionNotOpen)?;
        let tx = session.transaction()?;
        GenreTable::new(&tx).create_table()?;
        ArtistTable::new(&tx).create_table()?;
        AlbumTable::new(&tx).create_table()?;
        SongTable::new(&tx).create_table()?;
        AlbumDiscogTable::new(&tx).create_table()?;
        SongDiscogTable::new(&tx).create_table()?;
        tx.commit()?;
        info!("created library tables at {}", self.db_path.display());
        Ok(())
    }

    /// Drop all six library tables in one transaction, then discard the cached prepared
    /// statements so none outlives the schema it was compiled against.
    ///
    /// Children go before parents: with foreign keys enforced, dropping a table
    /// implicitly deletes its rows, which referencing rows would veto.
    pub fn delete_library(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(ShellacError::SessionNotOpen)?;
        let tx = session.transaction()?;
        SongDiscogTable::new(&tx).drop_table()?;
        AlbumDiscogTable::new(&tx).drop_table()?;
        SongTable::new(&tx).drop_table()?;
        AlbumTable::new(&tx).drop_table()?;
        ArtistTable::new(&tx).drop_table()?;
        GenreTable::new(&tx).drop_table()?;
        tx.commit()?;
        session.flush_statements();
        info!("deleted library tables at {}", self.db_path.display());
        Ok(())
    }

    /// Walk the directory tree rooted at `root` and ingest every readable audio file,
    /// all within one transaction.
    ///
    /// For each file the records are created in a fixed order (genre, artist, album,
    /// song, album discography, song discography) so that every natural-key subquery
    /// finds its parent rows. Extraction failures skip the file and continue the walk;
    /// insert failures abort and roll back the batch.
    pub fn add_path(&mut self, root: &Path) -> Result<AddPathSummary> {
        let tags = &self.tags;
        let session = self.session.as_mut().ok_or(ShellacError::SessionNotOpen)?;
        let tx = session.transaction()?;

        let genres = GenreTable::new(&tx);
        let artists = ArtistTable::new(&tx);
        let albums = AlbumTable::new(&tx);
        let songs = SongTable::new(&tx);
        let album_discogs = AlbumDiscogTable::new(&tx);
        let song_discogs = SongDiscogTable::new(&tx);

        let mut summary = AddPathSummary::default();
        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("cannot visit path under {}: {}", root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            summary.scanned += 1;

            let path = entry.path();
            let data = match tags.read_tags(path) {
                Ok(data) => data,
                Err(e) => {
                    debug!("skipping {}: {}", path.display(), e);
                    summary.skipped += 1;
                    continue;
                }
            };

            let (genre, artist, album, song) = derive_attributes(path, data);
            genres.create_genre(&genre)?;
            artists.create_artist(&artist)?;
            albums.create_album(&album)?;
            songs.create_song(&song)?;
            album_discogs.create_album_discog(&album)?;
            song_discogs.create_song_discog(&song, &album)?;
            summary.imported += 1;
        }

        tx.commit()?;
        info!(
            "added {} of {} files under {} to the library ({} skipped)",
            summary.imported,
            summary.scanned,
            root.display(),
            summary.skipped
        );
        Ok(summary)
    }
}

/// Derive the per-entity attribute records for one file from its extracted tags.
fn derive_attributes(path: &Path, data: TagData) -> (GenreAttributes, ArtistAttributes, AlbumAttributes, SongAttributes) {
    let genre = GenreAttributes { name: data.genre.clone() };
    let artist = ArtistAttributes {
        name: data.artist.clone(),
        sort: data.artist_sort.clone(),
    };
    let album = AlbumAttributes {
        name: data.album,
        sort: data.album_sort,
        artist_name: data.artist.clone(),
        artist_sort: data.artist_sort.clone(),
        genre_name: data.genre.clone(),
        release_date: data.year.clone(),
        album_artist: data.album_artist,
        album_artist_sort: data.album_artist_sort,
    };
    let song = SongAttributes {
        file_path: path.to_string_lossy().into_owned(),
        file_base: path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
        file_dir: path.parent().map(|d| d.to_string_lossy().into_owned()).unwrap_or_default(),
        artist_name: data.artist,
        artist_sort: data.artist_sort,
        name: data.title,
        genre_name: data.genre,
        release_date: data.year,
        track_number: data.track,
        disc_number: data.disc,
        duration_in_millis: data.duration_in_millis,
        lyrics: data.lyrics,
        comments: data.comment,
    };
    (genre, artist, album, song)
}
