//! Logical name to source path resolution.

use std::fs;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::AssetError;
use crate::pipeline::Pipeline;
use crate::utils::path::ext_of;

/// Map a cleaned logical name to a file under the root: a direct hit wins,
/// otherwise each alias of the logical extension is substituted in
/// registration order. The error carries the last stat failure.
pub(crate) fn resolve(
    config: &Config,
    pipeline: &Pipeline,
    logical: &str,
) -> Result<PathBuf, AssetError> {
    let rel = logical.trim_start_matches('/');
    let direct = config.root.join(rel);
    let mut last_err = match fs::metadata(&direct) {
        Ok(_) => return Ok(direct),
        Err(e) => e,
    };

    let ext = ext_of(logical);
    if !ext.is_empty() {
        let stem = &rel[..rel.len() - ext.len()];
        for alias in pipeline.aliases_for(ext) {
            let candidate = config.root.join(format!("{stem}{alias}"));
            match fs::metadata(&candidate) {
                Ok(_) => return Ok(candidate),
                Err(e) => last_err = e,
            }
        }
    }

    Err(AssetError::NotFound {
        logical: logical.to_string(),
        message: last_err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn direct_hit() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path());
        fs::write(dir.path().join("app.js"), "x").unwrap();
        let found = resolve(&config, &Pipeline::new(), "/app.js").unwrap();
        assert_eq!(found, config.root.join("app.js"));
    }

    #[test]
    fn alias_substitution_on_extension() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path());
        fs::write(dir.path().join("style.scss"), "x").unwrap();
        let mut pipeline = Pipeline::new();
        pipeline.register_alias(".css", ".scss");
        let found = resolve(&config, &pipeline, "/style.css").unwrap();
        assert_eq!(found, config.root.join("style.scss"));
    }

    #[test]
    fn aliases_tried_in_registration_order() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path());
        fs::write(dir.path().join("style.scss"), "scss").unwrap();
        fs::write(dir.path().join("style.sass"), "sass").unwrap();
        let mut pipeline = Pipeline::new();
        pipeline
            .register_alias(".css", ".sass")
            .register_alias(".css", ".scss");
        let found = resolve(&config, &pipeline, "/style.css").unwrap();
        assert_eq!(found, config.root.join("style.sass"));
    }

    #[test]
    fn direct_hit_beats_alias() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path());
        fs::write(dir.path().join("style.css"), "css").unwrap();
        fs::write(dir.path().join("style.scss"), "scss").unwrap();
        let mut pipeline = Pipeline::new();
        pipeline.register_alias(".css", ".scss");
        let found = resolve(&config, &pipeline, "/style.css").unwrap();
        assert_eq!(found, config.root.join("style.css"));
    }

    #[test]
    fn miss_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path());
        let err = resolve(&config, &Pipeline::new(), "/nope.js").unwrap_err();
        assert!(matches!(err, AssetError::NotFound { .. }));
    }
}
