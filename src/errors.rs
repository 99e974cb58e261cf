use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellacError {
    #[error("shellac error: {0}")]
    Generic(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("library session already opened")]
    SessionAlreadyOpen,
    #[error("no open library session")]
    SessionNotOpen,
    #[error("{0} is not a supported audio filetype")]
    UnsupportedFiletype(String),
    #[error("cannot read tags from {path}: {reason}")]
    UnreadableTags { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, ShellacError>;
