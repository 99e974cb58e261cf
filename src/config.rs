/// Configuration for the library: where the catalog database lives. Parsed from TOML,
/// defaulting to a per-user data directory.
use crate::errors::{Result, ShellacError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DATABASE_FILENAME: &str = "library.sqlite3";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub library_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    library_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            library_dir: default_library_dir(),
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> Result<Config> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| ShellacError::Config(format!("failed to parse config file: {e}")))?;
        Ok(Config {
            library_dir: file.library_dir.unwrap_or_else(default_library_dir),
        })
    }

    pub fn load(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)?;
        Config::parse(&content)
    }

    pub fn library_database_path(&self) -> PathBuf {
        self.library_dir.join(DATABASE_FILENAME)
    }
}

fn default_library_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("shellac")
}
