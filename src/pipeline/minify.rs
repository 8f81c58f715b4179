//! JS and CSS minification.
//!
//! Registered as compressors in the standard pipeline, so they only run for
//! servers with `compressed = true`. JavaScript goes through oxc, CSS
//! through lightningcss.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

/// JavaScript minifier backed by oxc.
///
/// Identifiers are never mangled: the compressor sees one file of the
/// require-concatenation at a time, and top-level names are the interface
/// between those files. Sources are parsed as plain scripts for the same
/// reason.
pub struct JsMinify;

impl super::Processor for JsMinify {
    fn process(&self, input: &Path, output: &Path) -> Result<()> {
        let source = fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?;

        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, &source, SourceType::cjs()).parse();
        if !parsed.errors.is_empty() {
            return Err(anyhow!(
                "javascript parse failed in {}: {}",
                input.display(),
                parsed.errors[0]
            ));
        }

        let mut program = parsed.program;
        let _ = Minifier::new(MinifierOptions {
            mangle: None,
            compress: Some(CompressOptions::smallest()),
        })
        .build(&allocator, &mut program);

        let code = Codegen::new()
            .with_options(CodegenOptions {
                minify: true,
                comments: CommentOptions::disabled(),
                ..CodegenOptions::default()
            })
            .build(&program)
            .code;
        fs::write(output, code)
            .with_context(|| format!("failed to write {}", output.display()))?;
        Ok(())
    }
}

/// CSS minifier backed by lightningcss.
pub struct CssMinify;

impl super::Processor for CssMinify {
    fn process(&self, input: &Path, output: &Path) -> Result<()> {
        let source = fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?;

        // Hand the parser the real filename so its diagnostics point at the
        // intermediate that actually failed.
        let options = ParserOptions {
            filename: input.display().to_string(),
            ..ParserOptions::default()
        };
        let stylesheet = StyleSheet::parse(&source, options)
            .map_err(|e| anyhow!("css parse failed in {}: {e}", input.display()))?;
        let css = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .map_err(|e| anyhow!("css print failed in {}: {e}", input.display()))?;
        fs::write(output, css.code)
            .with_context(|| format!("failed to write {}", output.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Processor;
    use tempfile::TempDir;

    fn run(processor: &dyn Processor, name: &str, source: &str) -> String {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join(name);
        let output = dir.path().join(format!("min-{name}"));
        fs::write(&input, source).unwrap();
        processor.process(&input, &output).unwrap();
        // input untouched
        assert_eq!(fs::read_to_string(&input).unwrap(), source);
        fs::read_to_string(&output).unwrap()
    }

    #[test]
    fn js_minification_shrinks_to_one_line() {
        let source =
            "window.counter = ( window.counter || 0 ) + 1 ;\nconsole.log( window.counter ) ;\n";
        let out = run(&JsMinify, "app.js", source);
        assert!(out.len() < source.len());
        assert!(!out.contains('\n'));
        assert!(out.contains("window.counter"));
    }

    #[test]
    fn js_parse_error_names_the_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bad.js");
        fs::write(&input, "function {{{").unwrap();
        let err = JsMinify
            .process(&input, &dir.path().join("out.js"))
            .unwrap_err();
        assert!(err.to_string().contains("bad.js"));
    }

    #[test]
    fn css_minification_shrinks() {
        let source = "body {\n    color : red ;\n}\n";
        let out = run(&CssMinify, "app.css", source);
        assert!(out.len() < source.len());
        assert!(out.contains("red"));
    }
}
