use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use anyhow::Result;
use tempfile::TempDir;

use crate::config::Config;
use crate::error::AssetError;
use crate::pipeline::Pipeline;

use super::{AssetServer, FileServer, fingerprint_name};

fn stub_server(pipeline: Pipeline) -> (TempDir, FileServer) {
    let dir = TempDir::new().unwrap();
    let server = FileServer::new(Config::new(dir.path()), pipeline);
    (dir, server)
}

fn stub_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn touch(path: &Path, when: SystemTime) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(when).unwrap();
}

#[test]
fn fingerprint_name_inserts_digest_before_extension() {
    assert_eq!(fingerprint_name("/foo/bar.js", "00ff"), "/foo/bar-00ff.js");
    assert_eq!(fingerprint_name("bar.js", "00ff"), "bar-00ff.js");
    assert_eq!(fingerprint_name("/noext", "00ff"), "/noext-00ff");
}

#[test]
fn single_file_keeps_content_digest() {
    let (dir, server) = stub_server(Pipeline::new());
    stub_file(&dir, "foo.js", "asdf");

    let asset = server.get_asset("foo.js").unwrap();
    assert_eq!(asset.digest(), "912ec803b2ce49e4a541068d495ab570");
    assert_eq!(asset.logical(), "/foo.js");
    // .js always takes the processed path: served from the temp dir.
    assert!(asset.pathname().starts_with(&server.config().temp_dir));
    assert_eq!(fs::read_to_string(asset.pathname()).unwrap(), "asdf");
}

#[test]
fn repeated_lookups_hit_the_same_entry() {
    let (dir, server) = stub_server(Pipeline::new());
    stub_file(&dir, "foo/bar.js", "body");

    let a = server.get_asset("foo/bar.js").unwrap();
    let b = server.get_asset("/foo/bar.js").unwrap();
    let c = server.get_asset("foo/./bar.js").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
}

#[test]
fn version_salt_changes_every_digest() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("foo.js"), "asdf").unwrap();
    let plain = FileServer::new(Config::new(dir.path()), Pipeline::new());
    let salted = FileServer::new(
        Config::new(dir.path()).with_version("2024-01"),
        Pipeline::new(),
    );

    let a = plain.get_asset("foo.js").unwrap();
    let b = salted.get_asset("foo.js").unwrap();
    assert_ne!(a.digest(), b.digest());
}

#[test]
fn dependencies_concatenate_depth_first() {
    let (dir, server) = stub_server(Pipeline::new());
    stub_file(&dir, "foo.js", "//= require bar\nfoo");
    stub_file(&dir, "bar.js", "//= require baz.js\nbar");
    stub_file(&dir, "baz.js", "baz");

    let asset = server.get_asset("foo.js").unwrap();
    assert_eq!(
        fs::read_to_string(asset.pathname()).unwrap(),
        "baz\n//= require baz.js\nbar\n//= require bar\nfoo"
    );
    assert!(!asset.stale(server.config()));
}

#[test]
fn aggregate_digest_covers_dependencies() {
    let (dir, server) = stub_server(Pipeline::new());
    stub_file(&dir, "foo.js", "//= require bar\nfoo");
    stub_file(&dir, "bar.js", "bar");

    let with_dep = server.get_asset("foo.js").unwrap().digest().to_string();
    // A same-content file with no requires fingerprints differently.
    let (dir2, server2) = stub_server(Pipeline::new());
    stub_file(&dir2, "foo.js", "//= require bar\nfoo");
    stub_file(&dir2, "bar.js", "different");
    let other = server2.get_asset("foo.js").unwrap().digest().to_string();
    assert_ne!(with_dep, other);
}

#[test]
fn dependency_change_goes_stale_and_rebuilds() {
    let (dir, server) = stub_server(Pipeline::new());
    stub_file(&dir, "foo.js", "//= require bar\nfoo");
    stub_file(&dir, "bar.js", "bar");

    let before = server.get_asset("foo.js").unwrap();
    let old_digest = before.digest().to_string();

    // Same contents, newer mtime: still fresh.
    let future = SystemTime::now() + Duration::from_secs(5);
    touch(&dir.path().join("bar.js"), future);
    assert!(!before.stale(server.config()));

    // New contents with a strictly newer mtime: stale, rebuilt on lookup.
    stub_file(&dir, "bar.js", "bar2");
    touch(&dir.path().join("bar.js"), future);
    assert!(before.stale(server.config()));

    let after = server.get_asset("foo.js").unwrap();
    assert_ne!(after.digest(), old_digest);
    assert_eq!(
        fs::read_to_string(after.pathname()).unwrap(),
        "bar2\n//= require bar\nfoo"
    );
}

#[test]
fn missing_dependency_fails_the_build() {
    let (dir, server) = stub_server(Pipeline::new());
    stub_file(&dir, "foo.js", "//= require missing\nfoo");

    let err = server.get_asset("foo.js").unwrap_err();
    let AssetError::Dependency { logical, source } = err else {
        panic!("expected dependency error, got {err}");
    };
    assert_eq!(logical, "missing.js");
    assert!(matches!(*source, AssetError::NotFound { .. }));
}

#[test]
fn require_cycles_error_instead_of_deadlocking() {
    let (dir, server) = stub_server(Pipeline::new());
    stub_file(&dir, "a.js", "//= require b\na");
    stub_file(&dir, "b.js", "//= require a\nb");

    let err = server.get_asset("a.js").unwrap_err();
    assert!(err.to_string().contains("cycle"), "{err}");
}

#[test]
fn build_errors_are_evicted_for_retry() {
    let (dir, server) = stub_server(Pipeline::new());

    let err = server.get_asset("late.js").unwrap_err();
    assert!(matches!(err, AssetError::NotFound { .. }));

    // The failed entry was evicted, so creating the file heals the lookup.
    stub_file(&dir, "late.js", "here now");
    let asset = server.get_asset("late.js").unwrap();
    assert_eq!(fs::read_to_string(asset.pathname()).unwrap(), "here now");
}

#[test]
fn directories_are_rejected() {
    let (dir, server) = stub_server(Pipeline::new());
    fs::create_dir(dir.path().join("sub")).unwrap();

    let err = server.get_asset("/sub").unwrap_err();
    assert!(matches!(err, AssetError::IsDirectory { .. }));
    assert!(server.get_asset("/").is_err());
}

#[test]
fn processors_transform_the_compiled_output() {
    let mut pipeline = Pipeline::new();
    pipeline
        .register_processor(".js", |input: &Path, output: &Path| -> Result<()> {
            let body = fs::read_to_string(input)?;
            fs::write(output, body.to_uppercase())?;
            Ok(())
        })
        .unwrap();
    let (dir, server) = stub_server(pipeline);
    stub_file(&dir, "app.js", "abc");

    let asset = server.get_asset("app.js").unwrap();
    assert_eq!(fs::read_to_string(asset.pathname()).unwrap(), "ABC");
    // The digest fingerprints the source, not the processed output.
    assert_eq!(asset.digest(), "900150983cd24fb0d6963f7d28e17f72");
}

#[test]
fn alias_sources_run_their_own_processor() {
    let mut pipeline = Pipeline::new();
    pipeline.register_alias(".css", ".scss");
    pipeline
        .register_processor(".scss", |input: &Path, output: &Path| -> Result<()> {
            let body = fs::read_to_string(input)?;
            fs::write(output, format!("compiled:{body}"))?;
            Ok(())
        })
        .unwrap();
    let (dir, server) = stub_server(pipeline);
    stub_file(&dir, "style.scss", "$x: 1");

    let asset = server.get_asset("style.css").unwrap();
    assert_eq!(asset.logical(), "/style.css");
    assert_eq!(
        fs::read_to_string(asset.pathname()).unwrap(),
        "compiled:$x: 1"
    );
}

#[test]
fn compressors_only_run_when_configured() {
    let compressor = |input: &Path, output: &Path| -> Result<()> {
        let body = fs::read_to_string(input)?;
        fs::write(output, format!("min:{body}"))?;
        Ok(())
    };

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.js"), "abc").unwrap();

    let mut plain_pipeline = Pipeline::new();
    plain_pipeline.register_compressor(".js", compressor).unwrap();
    let plain = FileServer::new(Config::new(dir.path()), plain_pipeline);
    let asset = plain.get_asset("app.js").unwrap();
    assert_eq!(fs::read_to_string(asset.pathname()).unwrap(), "abc");

    let mut pipeline = Pipeline::new();
    pipeline.register_compressor(".js", compressor).unwrap();
    let compressed = FileServer::new(
        Config::new(dir.path())
            .with_compressed(true)
            .with_temp_dir("tmp2"),
        pipeline,
    );
    let asset = compressed.get_asset("app.js").unwrap();
    assert_eq!(fs::read_to_string(asset.pathname()).unwrap(), "min:abc");
}

#[test]
fn failed_processor_surfaces_and_removes_nothing() {
    let mut pipeline = Pipeline::new();
    pipeline
        .register_processor(".js", |_: &Path, _: &Path| -> Result<()> {
            anyhow::bail!("boom")
        })
        .unwrap();
    let (dir, server) = stub_server(pipeline);
    stub_file(&dir, "app.js", "abc");

    let err = server.get_asset("app.js").unwrap_err();
    let AssetError::Processor { ext, message, .. } = err else {
        panic!("expected processor error, got {err}");
    };
    assert_eq!(ext, ".js");
    assert!(message.contains("boom"));
}

#[test]
fn concurrent_lookups_collapse_to_one_build() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let mut pipeline = Pipeline::new();
    pipeline
        .register_processor(".js", move |input: &Path, output: &Path| -> Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            fs::copy(input, output)?;
            Ok(())
        })
        .unwrap();
    let (dir, server) = stub_server(pipeline);
    stub_file(&dir, "app.js", "abc");

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let asset = server.get_asset("app.js").unwrap();
                assert_eq!(asset.digest(), "900150983cd24fb0d6963f7d28e17f72");
            });
        }
    });
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn distinct_keys_build_in_parallel_without_interference() {
    let (dir, server) = stub_server(Pipeline::new());
    for i in 0..16 {
        stub_file(&dir, &format!("file{i}.js"), &format!("body {i}"));
    }

    let server = &server;
    std::thread::scope(|scope| {
        for i in 0..16 {
            scope.spawn(move || {
                let asset = server.get_asset(&format!("file{i}.js")).unwrap();
                assert_eq!(
                    fs::read_to_string(asset.pathname()).unwrap(),
                    format!("body {i}")
                );
            });
        }
    });
}

#[test]
fn asset_path_generates_urls() {
    let (dir, server) = stub_server(Pipeline::new());
    stub_file(&dir, "foo.js", "asdf");

    assert_eq!(server.asset_path("foo.js", false).unwrap(), "/foo.js");
    assert_eq!(
        server.asset_path("foo.js", true).unwrap(),
        "/foo-912ec803b2ce49e4a541068d495ab570.js"
    );
    assert!(server.asset_path("absent.js", false).is_err());
}
