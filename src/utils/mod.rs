//! Shared helpers: path handling, filesystem primitives, subprocess
//! execution, MIME lookup.

pub mod exec;
pub mod fs;
pub mod mime;
pub mod path;
