//! Precompilation into a deployable tree.
//!
//! A producer walks the source root feeding a bounded channel; a worker per
//! CPU builds each asset through the cache and writes the four output
//! variants. The first worker error is kept and returned after every worker
//! finishes; `manifest.json` is only written on full success.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use anyhow::{Context, Result};
use crossbeam::channel;
use flate2::Compression;
use flate2::write::GzEncoder;
use parking_lot::Mutex;

use crate::log;
use crate::manifest::Manifest;
use crate::server::{AssetServer, FileServer, fingerprint_name};
use crate::utils::path::{normalize_path, path_ext, slashed};

impl FileServer {
    /// Compile every source under the root into `dest`.
    ///
    /// Each source yields four outputs: the plain file, its gzip, and both
    /// again under a digest-fingerprinted name. Gzip uses best compression
    /// so front-end servers can hand the `.gz` variants out directly.
    pub fn compile(&self, dest: &Path) -> Result<()> {
        let dest = normalize_path(dest);
        fs::create_dir_all(&dest)
            .with_context(|| format!("failed to create {}", dest.display()))?;

        let (tx, rx) = channel::bounded::<PathBuf>(256);
        let manifest = Mutex::new(Manifest::new());
        let first_error: Mutex<Option<anyhow::Error>> = Mutex::new(None);
        let compiled = AtomicUsize::new(0);
        let workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(4);

        let record_error = |err: anyhow::Error| {
            let mut slot = first_error.lock();
            if slot.is_none() {
                *slot = Some(err);
            }
        };

        thread::scope(|scope| {
            for _ in 0..workers {
                let rx = rx.clone();
                let dest = &dest;
                let manifest = &manifest;
                let compiled = &compiled;
                let record_error = &record_error;
                scope.spawn(move || {
                    for source in rx.iter() {
                        match self.compile_asset(dest, &source, manifest) {
                            Ok(()) => {
                                compiled.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(err) => record_error(err),
                        }
                    }
                });
            }
            drop(rx);

            for entry in jwalk::WalkDir::new(&self.config().root).sort(true) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        record_error(err.into());
                        continue;
                    }
                };
                if entry.file_type().is_dir() {
                    continue;
                }
                let path = entry.path();
                // Compiled intermediates and prior outputs are not sources.
                if path.starts_with(&self.config().temp_dir) || path.starts_with(&dest) {
                    continue;
                }
                if tx.send(path).is_err() {
                    break;
                }
            }
            drop(tx);
        });

        if let Some(err) = first_error.into_inner() {
            return Err(err);
        }
        manifest.into_inner().save(&dest)?;
        log!("compile"; "{} assets -> {}", compiled.load(Ordering::Relaxed), dest.display());
        Ok(())
    }

    fn compile_asset(
        &self,
        dest: &Path,
        source: &Path,
        manifest: &Mutex<Manifest>,
    ) -> Result<()> {
        // Sources whose extension aliases a canonical one compile under the
        // canonical name: foo.scss is addressed and written as foo.css.
        let source_ext = path_ext(source);
        let out_ext = self
            .pipeline()
            .canonical_for(&source_ext)
            .unwrap_or(&source_ext);

        let rel = source
            .strip_prefix(&self.config().root)
            .with_context(|| format!("{} is outside the root", source.display()))?;
        let rel = slashed(rel);
        let stem = &rel[..rel.len() - source_ext.len()];
        let logical = format!("/{stem}{out_ext}");

        let asset = self
            .get_asset(&logical)
            .with_context(|| format!("failed compiling {}", source.display()))?;

        let dst = dest.join(&logical[1..]);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        let fingerprinted = dst.with_file_name(fingerprint_name(
            &dst.file_name().unwrap_or_default().to_string_lossy(),
            asset.digest(),
        ));
        write_variants(asset.pathname(), &dst, &fingerprinted)
            .with_context(|| format!("failed writing outputs for {logical}"))?;

        manifest.lock().insert(logical, asset.digest());
        Ok(())
    }
}

/// One streaming pass over the compiled content, fanning every chunk to the
/// plain, fingerprinted, and both gzipped sinks.
fn write_variants(src: &Path, dst: &Path, fingerprinted: &Path) -> std::io::Result<()> {
    let mut input = File::open(src)?;
    let mut plain = File::create(dst)?;
    let mut named = File::create(fingerprinted)?;
    let mut plain_gz = GzEncoder::new(
        File::create(with_gz(dst))?,
        Compression::best(),
    );
    let mut named_gz = GzEncoder::new(
        File::create(with_gz(fingerprinted))?,
        Compression::best(),
    );

    let mut buf = [0u8; 8192];
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        plain.write_all(&buf[..n])?;
        named.write_all(&buf[..n])?;
        plain_gz.write_all(&buf[..n])?;
        named_gz.write_all(&buf[..n])?;
    }
    plain_gz.finish()?;
    named_gz.finish()?;
    Ok(())
}

fn with_gz(path: &Path) -> PathBuf {
    let mut out = path.as_os_str().to_owned();
    out.push(".gz");
    PathBuf::from(out)
}
