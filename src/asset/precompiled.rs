//! Manifest-loaded assets.

use std::path::{Path, PathBuf};

/// An asset known only through a compile manifest: a logical name, the
/// on-disk path of its compiled output, and the recorded digest. It is
/// never considered stale.
#[derive(Debug)]
pub struct PrecompiledAsset {
    logical: String,
    path: PathBuf,
    digest: String,
}

impl PrecompiledAsset {
    pub fn new(logical: impl Into<String>, path: PathBuf, digest: impl Into<String>) -> Self {
        Self {
            logical: logical.into(),
            path,
            digest: digest.into(),
        }
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn logical(&self) -> &str {
        &self.logical
    }
}
