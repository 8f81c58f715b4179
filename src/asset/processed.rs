//! Pipeline-built assets.
//!
//! A processed asset is the concatenation of its `//= require` dependencies
//! and its own source, materialized under the temp directory and run through
//! the registered processor (and, for compressed servers, compressor).

use std::fs::{self, File};
use std::io;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::SystemTime;

use regex::bytes::Regex;
use tempfile::NamedTempFile;

use crate::config::Config;
use crate::digest::digest_string;
use crate::error::AssetError;
use crate::pipeline::Processor;
use crate::server::FileServer;
use crate::utils::path::{ext_of, path_ext};

use super::{Asset, StaticAsset};

/// Header lines of the form `//= require <name>`.
static REQUIRE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^//=\s*require\s+(\S+)").unwrap());

/// An asset built by concatenating its dependencies ahead of its source and
/// running the result through the processor pipeline.
#[derive(Debug)]
pub struct ProcessedAsset {
    static_child: StaticAsset,
    dependencies: Vec<Arc<Asset>>,
    digest: String,
    mtime: SystemTime,
    compiled_path: PathBuf,
}

impl ProcessedAsset {
    /// Build the asset for `logical` from `resolved`, pulling dependencies
    /// through the server's cache. `stack` carries the chain of in-progress
    /// builds for cycle detection.
    pub(crate) fn build(
        server: &FileServer,
        logical: &str,
        resolved: &Path,
        stack: &mut Vec<String>,
    ) -> Result<Self, AssetError> {
        let config = server.config();
        let static_child = StaticAsset::build(config, logical, resolved)?;
        let logical_ext = ext_of(logical);

        let names = scan_directives(resolved, logical_ext)?;
        let mut dependencies = Vec::with_capacity(names.len());
        let mut mtime = static_child.mtime();
        for name in names {
            let dep = server
                .get_cached(&name, stack)
                .map_err(|e| AssetError::Dependency {
                    logical: name.clone(),
                    source: Box::new(e),
                })?;
            if dep.mtime() > mtime {
                mtime = dep.mtime();
            }
            dependencies.push(dep);
        }

        // With no dependencies the asset is fingerprinted by its content
        // alone; otherwise the digest aggregates the whole chain in order.
        let digest = if dependencies.is_empty() {
            static_child.digest().to_string()
        } else {
            let mut joined = String::from(static_child.digest());
            for dep in &dependencies {
                joined.push_str(dep.digest());
            }
            digest_string(config, &joined)
        };

        let compiled_path = config.temp_dir.join(format!("{digest}{logical_ext}"));
        concatenate(&compiled_path, &dependencies, static_child.source_path())
            .map_err(|e| AssetError::io(&compiled_path, &e))?;

        let source_ext = path_ext(resolved);
        if let Some(processor) = server.pipeline().processor(&source_ext) {
            apply(processor, &compiled_path).map_err(|message| AssetError::Processor {
                ext: source_ext.clone(),
                path: compiled_path.clone(),
                message,
            })?;
        }
        if config.compressed
            && let Some(compressor) = server.pipeline().compressor(logical_ext)
        {
            apply(compressor, &compiled_path).map_err(|message| AssetError::Processor {
                ext: logical_ext.to_string(),
                path: compiled_path.clone(),
                message,
            })?;
        }

        Ok(Self {
            static_child,
            dependencies,
            digest,
            mtime,
            compiled_path,
        })
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn compiled_path(&self) -> &Path {
        &self.compiled_path
    }

    pub fn mtime(&self) -> SystemTime {
        self.mtime
    }

    pub fn logical(&self) -> &str {
        self.static_child.logical()
    }

    /// Stale iff the underlying source or any dependency is stale.
    pub fn stale(&self, config: &Config) -> bool {
        self.static_child.stale(config) || self.dependencies.iter().any(|d| d.stale(config))
    }
}

/// Scan the header of a source file for require directives.
///
/// Blank lines and `//`-prefixed lines continue the header; the first other
/// line ends it. `//` lines that are not require directives are skipped.
/// Scanning is byte-based so binary sources fall through harmlessly.
/// Captured names without an extension inherit `logical_ext`.
fn scan_directives(path: &Path, logical_ext: &str) -> Result<Vec<String>, AssetError> {
    let file = File::open(path).map_err(|e| AssetError::Directive {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut reader = io::BufReader::new(file);
    let mut line = Vec::new();
    let mut names = Vec::new();
    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| AssetError::Directive {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        if n == 0 {
            break;
        }
        let trimmed = line.trim_ascii();
        if !trimmed.is_empty() && !trimmed.starts_with(b"//") {
            break;
        }
        if let Some(caps) = REQUIRE.captures(&line) {
            let mut name = String::from_utf8_lossy(&caps[1]).into_owned();
            if ext_of(&name).is_empty() {
                name.push_str(logical_ext);
            }
            names.push(name);
        }
    }
    Ok(names)
}

/// Write `dep1 \n dep2 \n ... primary` to `target`, one newline after every
/// dependency and none after the primary.
fn concatenate(target: &Path, dependencies: &[Arc<Asset>], primary: &Path) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(target)?;
    for dep in dependencies {
        io::copy(&mut File::open(dep.pathname())?, &mut out)?;
        io::Write::write_all(&mut out, b"\n")?;
    }
    io::copy(&mut File::open(primary)?, &mut out)?;
    Ok(())
}

/// Run a transform over `target` through a sibling temp file, renaming the
/// result into place. The temp file is removed if the transform fails.
fn apply(processor: &dyn Processor, target: &Path) -> Result<(), String> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let staging = NamedTempFile::new_in(dir).map_err(|e| e.to_string())?;
    processor
        .process(target, staging.path())
        .map_err(|e| format!("{e:#}"))?;
    staging.persist(target).map_err(|e| e.to_string())?;
    Ok(())
}
