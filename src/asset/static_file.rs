//! Direct-file assets.

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::Config;
use crate::digest::digest_reader;
use crate::error::AssetError;
use crate::utils::fs::open_stat;

/// A single source file served as-is.
#[derive(Debug)]
pub struct StaticAsset {
    logical: String,
    source_path: PathBuf,
    mtime: SystemTime,
    digest: String,
}

impl StaticAsset {
    /// Stat and fingerprint a source file. Directories are rejected.
    pub fn build(config: &Config, logical: &str, path: &Path) -> Result<Self, AssetError> {
        let (file, meta) = open_stat(path).map_err(|e| AssetError::io(path, &e))?;
        if meta.is_dir() {
            return Err(AssetError::IsDirectory {
                path: path.to_path_buf(),
            });
        }
        let mtime = meta.modified().map_err(|e| AssetError::io(path, &e))?;
        let digest =
            digest_reader(config, BufReader::new(file)).map_err(|e| AssetError::io(path, &e))?;
        Ok(Self {
            logical: logical.to_string(),
            source_path: path.to_path_buf(),
            mtime,
            digest,
        })
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn mtime(&self) -> SystemTime {
        self.mtime
    }

    pub fn logical(&self) -> &str {
        &self.logical
    }

    /// Stale iff the file is gone, or its mtime moved strictly past the
    /// recorded one AND its content digest actually changed. An mtime bump
    /// with identical bytes is not staleness.
    pub fn stale(&self, config: &Config) -> bool {
        let Ok((file, meta)) = open_stat(&self.source_path) else {
            return true;
        };
        let Ok(modified) = meta.modified() else {
            return true;
        };
        if modified <= self.mtime {
            return false;
        }
        match digest_reader(config, BufReader::new(file)) {
            Ok(current) => current != self.digest,
            Err(_) => true,
        }
    }
}
