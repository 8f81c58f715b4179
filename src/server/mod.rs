//! Asset servers.
//!
//! [`FileServer`] resolves and builds assets on demand with a memoized,
//! staleness-aware cache; [`CompiledServer`] serves a precompiled tree from
//! its manifest. Both speak [`AssetServer`], which is all the HTTP adapter
//! needs.

mod compiled;
mod resolver;

pub use compiled::CompiledServer;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::asset::{Asset, ProcessedAsset, StaticAsset};
use crate::config::Config;
use crate::error::AssetError;
use crate::pipeline::Pipeline;
use crate::utils::path::{clean_logical, ext_of, path_ext};

/// The capability both server variants expose.
pub trait AssetServer: Send + Sync {
    /// Look up (building if necessary) the asset for a logical name.
    fn get_asset(&self, logical: &str) -> Result<Arc<Asset>, AssetError>;

    /// URL path for an asset, optionally with its digest fingerprint woven
    /// into the filename. Meant for URL generation in templates.
    fn asset_path(&self, logical: &str, digest: bool) -> Result<String, AssetError> {
        let asset = self.get_asset(logical)?;
        if digest {
            Ok(fingerprint_name(asset.logical(), asset.digest()))
        } else {
            Ok(asset.logical().to_string())
        }
    }
}

/// Insert `-<digest>` ahead of the extension: `/foo/bar.js` becomes
/// `/foo/bar-<digest>.js`. Shared by URL generation and the precompiler's
/// output naming.
pub fn fingerprint_name(logical: &str, digest: &str) -> String {
    let ext = ext_of(logical);
    let stem = &logical[..logical.len() - ext.len()];
    format!("{stem}-{digest}{ext}")
}

/// Cache slot for one logical name. The slot has its own lock so builds of
/// distinct assets proceed in parallel while concurrent requests for the
/// same asset collapse onto a single build.
#[derive(Default)]
struct AssetEntry {
    state: Mutex<EntryState>,
}

#[derive(Default)]
struct EntryState {
    asset: Option<Arc<Asset>>,
    error: Option<AssetError>,
}

/// On-the-fly asset server over a source root.
pub struct FileServer {
    config: Config,
    pipeline: Pipeline,
    entries: Mutex<FxHashMap<String, Arc<AssetEntry>>>,
}

impl FileServer {
    pub fn new(config: Config, pipeline: Pipeline) -> Self {
        Self {
            config,
            pipeline,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Cache lookup with per-entry single flight.
    ///
    /// Lock discipline: the entries map lock is taken first, the entry lock
    /// is acquired under it, then the map lock is released before any build
    /// work happens. `stack` lists the logical names currently being built
    /// on this call chain, so require cycles fail instead of self-deadlocking
    /// on an entry lock already held a few frames up.
    pub(crate) fn get_cached(
        &self,
        logical: &str,
        stack: &mut Vec<String>,
    ) -> Result<Arc<Asset>, AssetError> {
        let key = clean_logical(logical);
        if stack.contains(&key) {
            return Err(AssetError::Cycle {
                chain: format!("{} -> {key}", stack.join(" -> ")),
            });
        }

        let entry = {
            let mut map = self.entries.lock();
            Arc::clone(map.entry(key.clone()).or_default())
        };
        let mut state = entry.state.lock();

        if let Some(err) = &state.error {
            return Err(err.clone());
        }
        if let Some(asset) = &state.asset
            && !asset.stale(&self.config)
        {
            return Ok(Arc::clone(asset));
        }

        stack.push(key.clone());
        let built = self.build(&key, stack);
        stack.pop();

        match built {
            Ok(asset) => {
                let asset = Arc::new(asset);
                state.asset = Some(Arc::clone(&asset));
                Ok(asset)
            }
            Err(err) => {
                // Record the error for waiters already queued on this entry,
                // then evict the key so the next lookup retries from scratch.
                state.error = Some(err.clone());
                drop(state);
                self.entries.lock().remove(&key);
                Err(err)
            }
        }
    }

    /// Resolve and construct the asset for a cleaned logical name.
    ///
    /// The processed path is taken when a processor is registered for the
    /// resolved source's extension, and always for `.js` and `.css` so the
    /// require pipeline and compressors apply to them.
    fn build(&self, key: &str, stack: &mut Vec<String>) -> Result<Asset, AssetError> {
        let resolved = resolver::resolve(&self.config, &self.pipeline, key)?;
        let source_ext = path_ext(&resolved);
        let logical_ext = ext_of(key);
        if self.pipeline.processor(&source_ext).is_some()
            || matches!(logical_ext, ".js" | ".css")
        {
            ProcessedAsset::build(self, key, &resolved, stack).map(Asset::Processed)
        } else {
            StaticAsset::build(&self.config, key, &resolved).map(Asset::Static)
        }
    }
}

impl AssetServer for FileServer {
    fn get_asset(&self, logical: &str) -> Result<Arc<Asset>, AssetError> {
        self.get_cached(logical, &mut Vec::new())
    }
}
