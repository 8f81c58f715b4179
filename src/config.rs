//! Server configuration.

use std::path::{Path, PathBuf};

use crate::utils::path::normalize_path;

/// Configuration shared by the file server and the precompiler.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute source directory all logical names resolve under.
    pub root: PathBuf,
    /// Scratch directory for compiled intermediates. Defaults to `root/tmp`.
    pub temp_dir: PathBuf,
    /// Cache-busting salt mixed into every digest.
    pub version: String,
    /// Run registered compressors after the processor chain.
    pub compressed: bool,
}

impl Config {
    /// Build a config rooted at `root`, resolved to an absolute path.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = normalize_path(root.as_ref());
        let temp_dir = root.join("tmp");
        Self {
            root,
            temp_dir,
            version: String::new(),
            compressed: false,
        }
    }

    /// Override the scratch directory. Relative paths land under the root.
    pub fn with_temp_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.temp_dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.root.join(dir)
        };
        self
    }

    /// Set the cache-busting version salt.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Enable or disable the compressor stage.
    pub fn with_compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }
}
