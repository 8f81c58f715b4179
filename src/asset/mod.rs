//! Asset variants.
//!
//! Every asset exposes the same five operations: a hex digest, the on-disk
//! pathname of its *compiled* content, a modification time, its logical
//! name, and a staleness probe.

mod precompiled;
mod processed;
mod static_file;

pub use precompiled::PrecompiledAsset;
pub use processed::ProcessedAsset;
pub use static_file::StaticAsset;

use std::path::Path;
use std::time::SystemTime;

use crate::config::Config;

/// A servable asset.
#[derive(Debug)]
pub enum Asset {
    /// A file served directly from the source tree.
    Static(StaticAsset),
    /// A file run through the directive/processor pipeline.
    Processed(ProcessedAsset),
    /// An opaque record loaded from a compile manifest.
    Precompiled(PrecompiledAsset),
}

impl Asset {
    /// 32-char lowercase hex fingerprint.
    pub fn digest(&self) -> &str {
        match self {
            Asset::Static(a) => a.digest(),
            Asset::Processed(a) => a.digest(),
            Asset::Precompiled(a) => a.digest(),
        }
    }

    /// Path of the compiled content on disk (the source file itself for
    /// static assets).
    pub fn pathname(&self) -> &Path {
        match self {
            Asset::Static(a) => a.source_path(),
            Asset::Processed(a) => a.compiled_path(),
            Asset::Precompiled(a) => a.path(),
        }
    }

    /// Last known modification time.
    pub fn mtime(&self) -> SystemTime {
        match self {
            Asset::Static(a) => a.mtime(),
            Asset::Processed(a) => a.mtime(),
            Asset::Precompiled(_) => SystemTime::now(),
        }
    }

    /// The rooted logical name this asset was looked up under.
    pub fn logical(&self) -> &str {
        match self {
            Asset::Static(a) => a.logical(),
            Asset::Processed(a) => a.logical(),
            Asset::Precompiled(a) => a.logical(),
        }
    }

    /// Whether the compiled content no longer reflects the sources.
    pub fn stale(&self, config: &Config) -> bool {
        match self {
            Asset::Static(a) => a.stale(config),
            Asset::Processed(a) => a.stale(config),
            Asset::Precompiled(_) => false,
        }
    }
}
