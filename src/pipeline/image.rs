//! Image optimization via external tools.
//!
//! Each optimizer is a thin subprocess shim; the standard pipeline probes
//! for the binaries at startup and skips whichever are absent.

use std::fs;
use std::path::Path;

use anyhow::Result;

use crate::utils::exec::Cmd;

/// `optipng` for PNG and GIF sources.
pub struct OptiPng;

impl super::Processor for OptiPng {
    fn process(&self, input: &Path, output: &Path) -> Result<()> {
        Cmd::new("optipng")
            .args(["-quiet", "-clobber", "-out"])
            .arg(output)
            .arg(input)
            .run()?;
        Ok(())
    }
}

/// `pngcrush` fallback when optipng is unavailable.
pub struct PngCrush;

impl super::Processor for PngCrush {
    fn process(&self, input: &Path, output: &Path) -> Result<()> {
        Cmd::new("pngcrush").arg(input).arg(output).run()?;
        Ok(())
    }
}

/// `jpegoptim` optimizes in place, so copy first and strip the copy.
pub struct JpegOptim;

impl super::Processor for JpegOptim {
    fn process(&self, input: &Path, output: &Path) -> Result<()> {
        fs::copy(input, output)?;
        Cmd::new("jpegoptim")
            .args(["--strip-all", "-q"])
            .arg(output)
            .run()?;
        Ok(())
    }
}
