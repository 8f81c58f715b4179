//! SCSS compilation via the `sass` CLI.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::utils::exec::Cmd;

/// Compiles SCSS to CSS by shelling out to `sass`.
///
/// The pipeline hands us an intermediate named after the logical (`.css`)
/// extension, while `sass` infers syntax from the input filename; compile
/// through a sibling `.scss` staging copy so the compiler parses SCSS.
pub struct Sass;

impl super::Processor for Sass {
    fn process(&self, input: &Path, output: &Path) -> Result<()> {
        let staging = input.with_extension("stage.scss");
        fs::copy(input, &staging)
            .with_context(|| format!("failed to stage {}", input.display()))?;
        let result = Cmd::new("sass")
            .arg("--no-source-map")
            .arg(&staging)
            .arg(output)
            .run();
        let _ = fs::remove_file(&staging);
        result?;
        Ok(())
    }
}
