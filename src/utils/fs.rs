//! Filesystem primitives.

use std::fs::{File, Metadata};
use std::io;
use std::path::Path;

/// Open a file and stat it through the same handle.
///
/// Closing happens on every exit path; the handle is returned so callers can
/// keep reading (e.g. to digest the contents) without re-opening.
pub fn open_stat(path: &Path) -> io::Result<(File, Metadata)> {
    let file = File::open(path)?;
    let meta = file.metadata()?;
    Ok((file, meta))
}
