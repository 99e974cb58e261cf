pub mod common;
pub mod config;
pub mod errors;
pub mod library;
pub mod sqlite;
pub mod tags;

pub use common::{
    Album, AlbumAttributes, AlbumDiscogStore, AlbumStore, Artist, ArtistAttributes, ArtistStore, Genre, GenreAttributes, GenreStore, Predicates, Song,
    SongAttributes, SongDiscogStore, SongStore,
};
pub use config::Config;
pub use errors::{Result, ShellacError};
pub use library::{AddPathSummary, Library};
pub use tags::{LoftyTagReader, TagData, TagReader};

#[cfg(test)]
mod testing;

#[cfg(test)]
mod common_test;
#[cfg(test)]
mod tags_test;
