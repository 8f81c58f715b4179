//! Processor/compressor registry.
//!
//! A [`Pipeline`] maps file extensions to transforms. Processors run
//! unconditionally on matching assets; compressors run only when the server
//! is configured with `compressed = true`. Aliases declare that a request
//! for one extension may be satisfied by a sibling file with another
//! (`.css` → `.scss`).
//!
//! Pipelines are assembled once at startup and treated as immutable
//! afterwards; duplicate processor registration is a startup error.

pub mod image;
pub mod minify;
pub mod sass;

use std::collections::hash_map::Entry;
use std::path::Path;

use anyhow::Result;
use rustc_hash::FxHashMap;

use crate::debug;
use crate::error::AssetError;
use crate::utils::exec;

/// A transform from one file to another, keyed by extension.
///
/// Implementations must write `output` and must not modify `input`; the
/// caller swaps `output` into place atomically.
pub trait Processor: Send + Sync {
    fn process(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Plain functions and closures are processors.
impl<F> Processor for F
where
    F: Fn(&Path, &Path) -> Result<()> + Send + Sync,
{
    fn process(&self, input: &Path, output: &Path) -> Result<()> {
        self(input, output)
    }
}

/// Registry of processors, compressors and extension aliases.
///
/// Extensions are keyed with their leading dot (`".js"`).
#[derive(Default)]
pub struct Pipeline {
    processors: FxHashMap<String, Box<dyn Processor>>,
    compressors: FxHashMap<String, Box<dyn Processor>>,
    aliases: FxHashMap<String, Vec<String>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("processors", &self.processors.keys().collect::<Vec<_>>())
            .field("compressors", &self.compressors.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor for an extension. At most one per extension.
    pub fn register_processor(
        &mut self,
        ext: &str,
        processor: impl Processor + 'static,
    ) -> Result<&mut Self, AssetError> {
        match self.processors.entry(ext.to_string()) {
            Entry::Occupied(_) => Err(AssetError::AlreadyRegistered {
                kind: "processor",
                ext: ext.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Box::new(processor));
                Ok(self)
            }
        }
    }

    /// Register a compressor for an extension. At most one per extension.
    pub fn register_compressor(
        &mut self,
        ext: &str,
        compressor: impl Processor + 'static,
    ) -> Result<&mut Self, AssetError> {
        match self.compressors.entry(ext.to_string()) {
            Entry::Occupied(_) => Err(AssetError::AlreadyRegistered {
                kind: "compressor",
                ext: ext.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Box::new(compressor));
                Ok(self)
            }
        }
    }

    /// Declare that requests for `canonical` may resolve to `alias` files.
    /// Aliases are tried in registration order.
    pub fn register_alias(&mut self, canonical: &str, alias: &str) -> &mut Self {
        self.aliases
            .entry(canonical.to_string())
            .or_default()
            .push(alias.to_string());
        self
    }

    pub fn processor(&self, ext: &str) -> Option<&dyn Processor> {
        self.processors.get(ext).map(Box::as_ref)
    }

    pub fn compressor(&self, ext: &str) -> Option<&dyn Processor> {
        self.compressors.get(ext).map(Box::as_ref)
    }

    pub fn aliases_for(&self, ext: &str) -> &[String] {
        self.aliases.get(ext).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reverse alias lookup: the canonical extension a source extension
    /// compiles to (`".scss"` → `".css"`), used for precompile output names.
    pub fn canonical_for(&self, alias_ext: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(_, aliased)| aliased.iter().any(|a| a == alias_ext))
            .map(|(canonical, _)| canonical.as_str())
    }

    /// Default toolchain: SCSS compilation, image optimization and JS/CSS
    /// minification.
    ///
    /// External tools are probed at startup; missing binaries are skipped
    /// with a debug log rather than failing the server. The minifiers are
    /// native and registered as compressors, so they only run for
    /// `compressed` servers.
    pub fn standard() -> Self {
        let mut pipeline = Self::new();
        pipeline.register_alias(".css", ".scss");

        if exec::available("sass", &["--version"]) {
            pipeline
                .register_processor(".scss", sass::Sass)
                .expect("duplicate registration in standard pipeline");
        } else {
            debug!("pipeline"; "sass not found, .scss sources served raw");
        }

        if exec::available("optipng", &["--version"]) {
            pipeline
                .register_processor(".png", image::OptiPng)
                .and_then(|p| p.register_processor(".gif", image::OptiPng))
                .expect("duplicate registration in standard pipeline");
        } else if exec::available("pngcrush", &["-h"]) {
            pipeline
                .register_processor(".png", image::PngCrush)
                .expect("duplicate registration in standard pipeline");
        } else {
            debug!("pipeline"; "no png optimizer found, images served as-is");
        }

        if exec::available("jpegoptim", &["--version"]) {
            pipeline
                .register_processor(".jpg", image::JpegOptim)
                .and_then(|p| p.register_processor(".jpeg", image::JpegOptim))
                .expect("duplicate registration in standard pipeline");
        }

        pipeline
            .register_compressor(".js", minify::JsMinify)
            .and_then(|p| p.register_compressor(".css", minify::CssMinify))
            .expect("duplicate registration in standard pipeline");

        pipeline
    }
}
