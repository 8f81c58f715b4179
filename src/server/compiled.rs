//! Manifest-backed server over a precompiled tree.

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::asset::{Asset, PrecompiledAsset};
use crate::error::AssetError;
use crate::manifest::{MANIFEST_FILE, Manifest};
use crate::utils::path::clean_logical;

use super::AssetServer;

/// Serves exactly the assets recorded in `manifest.json`; it cannot compile.
pub struct CompiledServer {
    precompiled: FxHashMap<String, Arc<Asset>>,
}

impl CompiledServer {
    /// Load the manifest under `root` and materialize one precompiled asset
    /// per entry.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, AssetError> {
        let root = root.as_ref();
        let manifest = Manifest::load(&root.join(MANIFEST_FILE))?;
        let mut precompiled = FxHashMap::default();
        for (logical, digest) in manifest.iter() {
            let path = root.join(logical.trim_start_matches('/'));
            let asset = PrecompiledAsset::new(logical.clone(), path, digest.clone());
            precompiled.insert(logical.clone(), Arc::new(Asset::Precompiled(asset)));
        }
        Ok(Self { precompiled })
    }

    pub fn len(&self) -> usize {
        self.precompiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.precompiled.is_empty()
    }
}

impl AssetServer for CompiledServer {
    fn get_asset(&self, logical: &str) -> Result<Arc<Asset>, AssetError> {
        let key = clean_logical(logical);
        self.precompiled
            .get(&key)
            .cloned()
            .ok_or(AssetError::NotPrecompiled { logical: key })
    }
}
