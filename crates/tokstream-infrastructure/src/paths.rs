//! Where tokstream keeps its files.
//!
//! ```text
//! ~/.config/tokstream/
//! └── config.toml
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

pub struct TokstreamPaths;

impl TokstreamPaths {
    const APP_DIR: &'static str = "tokstream";
    const CONFIG_FILE: &'static str = "config.toml";

    /// `~/.config/tokstream/`
    pub fn config_dir() -> Result<PathBuf, PathError> {
        let home = dirs::home_dir().ok_or(PathError::HomeDirNotFound)?;
        Ok(Self::config_dir_in(&home))
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(Self::CONFIG_FILE))
    }

    fn config_dir_in(home: &Path) -> PathBuf {
        home.join(".config").join(Self::APP_DIR)
    }
}
