//! Compile manifest: rooted logical name → digest.
//!
//! Written as `manifest.json` at the compile destination and read back by
//! [`crate::server::CompiledServer`]. A flat JSON object with sorted keys so
//! output is deterministic.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/// Name of the manifest file within the compile destination.
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(flatten)]
    entries: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, logical: impl Into<String>, digest: impl Into<String>) {
        self.entries.insert(logical.into(), digest.into());
    }

    pub fn get(&self, logical: &str) -> Option<&str> {
        self.entries.get(logical).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a manifest file.
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let json = fs::read_to_string(path).map_err(|e| AssetError::io(path, &e))?;
        serde_json::from_str(&json).map_err(|e| AssetError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write `manifest.json` into `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<(), AssetError> {
        fs::create_dir_all(dir).map_err(|e| AssetError::io(dir, &e))?;
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| AssetError::Manifest {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&path, json).map_err(|e| AssetError::io(&path, &e))
    }
}
