//! Domain errors for asset resolution and building.
//!
//! Build errors are memoized per cache entry and handed to every caller that
//! collapsed onto the same build, so the type is `Clone`; I/O causes are
//! carried as rendered text rather than live `io::Error` values.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AssetError {
    /// The logical name does not resolve to any file under the root.
    #[error("asset not found: {logical}: {message}")]
    NotFound { logical: String, message: String },

    /// The resolved path is a directory.
    #[error("cannot serve a directory: {}", path.display())]
    IsDirectory { path: PathBuf },

    /// I/O failure while scanning require directives.
    #[error("failed reading directives from {}: {message}", path.display())]
    Directive { path: PathBuf, message: String },

    /// A transitively required asset failed to build.
    #[error("failed building required asset {logical}: {source}")]
    Dependency {
        logical: String,
        source: Box<AssetError>,
    },

    /// The require graph loops back on itself.
    #[error("require cycle detected: {chain}")]
    Cycle { chain: String },

    /// A registered processor or compressor returned an error.
    #[error("processor for {ext} failed on {}: {message}", path.display())]
    Processor {
        ext: String,
        path: PathBuf,
        message: String,
    },

    /// Any other filesystem failure.
    #[error("i/o error at {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// The manifest file exists but cannot be parsed.
    #[error("failed to parse manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    /// Manifest-backed servers only know what was compiled.
    #[error("asset not precompiled: {logical}")]
    NotPrecompiled { logical: String },

    /// Registering a second processor/compressor for an extension is a
    /// programmer bug, fatal at startup.
    #[error("a {kind} is already registered for {ext}")]
    AlreadyRegistered { kind: &'static str, ext: String },
}

impl AssetError {
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
