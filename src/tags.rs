/// The tags module abstracts over embedded-metadata extraction. It exposes a single
/// `TagReader` capability that turns a file path into a flat tag record, with a
/// lofty-backed implementation covering every supported audio format.
use crate::errors::{Result, ShellacError};
use std::path::Path;

pub const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".m4a", ".ogg", ".opus", ".flac"];

/// Flat tag record produced by a `TagReader`. Missing textual tags come back as empty
/// strings; missing numeric tags as None.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagData {
    pub title: String,
    pub artist: String,
    pub artist_sort: String,
    pub album: String,
    pub album_sort: String,
    pub album_artist: String,
    pub album_artist_sort: String,
    pub genre: String,
    pub year: String,
    pub track: Option<i64>,
    pub disc: Option<i64>,
    pub duration_in_millis: Option<i64>,
    pub lyrics: String,
    pub comment: String,
}

/// Extracts embedded metadata from an audio file. Implemented by the lofty-backed
/// reader; tests substitute stubs so ingestion can be exercised without real audio data.
pub trait TagReader {
    fn read_tags(&self, path: &Path) -> Result<TagData>;
}

/// Tag reader backed by lofty's format-guessing probe.
#[derive(Debug, Default)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read_tags(&self, path: &Path) -> Result<TagData> {
        use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
        use lofty::probe::Probe;
        use lofty::tag::ItemKey;

        let extension = path.extension().and_then(|s| s.to_str()).map(|s| format!(".{}", s.to_lowercase())).unwrap_or_default();
        if !SUPPORTED_AUDIO_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ShellacError::UnsupportedFiletype(extension));
        }

        let unreadable = |reason: String| ShellacError::UnreadableTags {
            path: path.to_path_buf(),
            reason,
        };

        let tagged_file = Probe::open(path)
            .map_err(|e| unreadable(format!("failed to open file: {e}")))?
            .guess_file_type()
            .map_err(|e| unreadable(format!("failed to guess file type: {e}")))?
            .read()
            .map_err(|e| unreadable(format!("failed to read file: {e}")))?;

        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
            .ok_or_else(|| unreadable("no tags found".to_string()))?;

        let get = |key: &ItemKey| tag.get_string(key).unwrap_or_default().to_string();

        let duration_ms = tagged_file.properties().duration().as_millis() as i64;

        Ok(TagData {
            title: tag.title().map(|s| s.to_string()).unwrap_or_default(),
            artist: tag.artist().map(|s| s.to_string()).unwrap_or_default(),
            artist_sort: get(&ItemKey::TrackArtistSortOrder),
            album: tag.album().map(|s| s.to_string()).unwrap_or_default(),
            album_sort: get(&ItemKey::AlbumTitleSortOrder),
            album_artist: get(&ItemKey::AlbumArtist),
            album_artist_sort: get(&ItemKey::AlbumArtistSortOrder),
            genre: tag.genre().map(|s| s.to_string()).unwrap_or_default(),
            year: {
                let year = get(&ItemKey::Year);
                if year.is_empty() {
                    get(&ItemKey::RecordingDate)
                } else {
                    year
                }
            },
            track: _parse_position(tag.get_string(&ItemKey::TrackNumber)),
            disc: _parse_position(tag.get_string(&ItemKey::DiscNumber)),
            duration_in_millis: Some(duration_ms),
            lyrics: get(&ItemKey::Lyrics),
            comment: tag.comment().map(|s| s.to_string()).unwrap_or_default(),
        })
    }
}

/// Parse a track/disc position, tolerating the "n/total" form some taggers write.
fn _parse_position(value: Option<&str>) -> Option<i64> {
    let value = value?.trim();
    let number = match value.split_once('/') {
        Some((n, _total)) => n,
        None => value,
    };
    number.trim().parse().ok()
}
