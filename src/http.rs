//! HTTP adapter over tiny_http.
//!
//! URLs address assets by logical name, optionally carrying a digest
//! fingerprint in the filename (`/foo-<32 hex>.js`). Fingerprinted
//! responses get year-long cache headers; plain ones must revalidate. All
//! lookup and build failures collapse to 404 so nothing about the source
//! tree leaks.
//!
//! The response decision is computed by [`plan`], a pure function over the
//! store and request headers; the tiny_http shell around it only does I/O.

use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use regex::Regex;
use tiny_http::{Header, Request, Response, Server, StatusCode};

use crate::server::AssetServer;
use crate::utils::mime;
use crate::utils::path::ext_of;
use crate::{debug, log};

/// One year, the lifetime handed out for fingerprinted URLs.
const FAR_FUTURE: Duration = Duration::from_secs(31_536_000);

/// `name-<32 hex>.ext` fingerprinted filenames.
static FINGERPRINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)-([a-f0-9]{32})(\.\w+)$").unwrap());

/// What a request should be answered with.
#[derive(Debug)]
pub(crate) enum ResponsePlan {
    NotFound,
    NotModified,
    File {
        path: PathBuf,
        headers: Vec<(&'static str, String)>,
    },
}

/// Accept connections forever, handling each request on a small pool so a
/// slow on-demand build does not block other clients.
pub fn serve(store: Arc<dyn AssetServer>, server: Server) {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("failed to create thread pool");

    for request in server.incoming_requests() {
        let store = Arc::clone(&store);
        pool.spawn(move || {
            if let Err(e) = handle_request(store.as_ref(), request) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

fn handle_request(store: &dyn AssetServer, request: Request) -> anyhow::Result<()> {
    let if_none_match = header_value(&request, "if-none-match");
    let if_modified_since = header_value(&request, "if-modified-since");
    let plan = plan(
        store,
        request.url(),
        if_none_match.as_deref(),
        if_modified_since.as_deref(),
    );

    match plan {
        ResponsePlan::NotFound => respond_not_found(request),
        ResponsePlan::NotModified => {
            request.respond(Response::empty(StatusCode(304)))?;
            Ok(())
        }
        ResponsePlan::File { path, headers } => {
            let Ok(file) = File::open(&path) else {
                return respond_not_found(request);
            };
            let mut response = Response::from_file(file);
            for (key, value) in &headers {
                response.add_header(make_header(key, value));
            }
            request.respond(response)?;
            Ok(())
        }
    }
}

/// Decide how to answer a request for `url`.
pub(crate) fn plan(
    store: &dyn AssetServer,
    url: &str,
    if_none_match: Option<&str>,
    if_modified_since: Option<&str>,
) -> ResponsePlan {
    let path = url.split('?').next().unwrap_or(url);
    let (dir, file) = path.rsplit_once('/').unwrap_or(("", path));
    let (file, expected_digest) = split_fingerprint(file);
    let logical = format!("{dir}/{file}");

    let asset = match store.get_asset(&logical) {
        Ok(asset) => asset,
        Err(err) => {
            debug!("serve"; "{logical}: {err}");
            return ResponsePlan::NotFound;
        }
    };
    if let Some(expected) = expected_digest.as_deref()
        && expected != asset.digest()
    {
        return ResponsePlan::NotFound;
    }

    let etag = format!("\"{}\"", asset.digest());
    if if_none_match == Some(etag.as_str()) {
        return ResponsePlan::NotModified;
    }
    let mtime = asset.mtime();
    if let Some(since) = if_modified_since
        && let Ok(since) = httpdate::parse_http_date(since)
        && unix_secs(mtime) <= unix_secs(since)
    {
        return ResponsePlan::NotModified;
    }

    let mut headers: Vec<(&'static str, String)> = Vec::with_capacity(5);
    if expected_digest.is_some() {
        headers.push(("Cache-Control", "public, max-age=31536000".to_string()));
        headers.push((
            "Expires",
            httpdate::fmt_http_date(SystemTime::now() + FAR_FUTURE),
        ));
    } else {
        headers.push(("Cache-Control", "public, must-revalidate".to_string()));
    }
    headers.push(("ETag", etag));
    headers.push(("Last-Modified", httpdate::fmt_http_date(mtime)));
    let ext = ext_of(&logical);
    headers.push((
        "Content-Type",
        mime::from_extension(ext.strip_prefix('.')).to_string(),
    ));

    ResponsePlan::File {
        path: asset.pathname().to_path_buf(),
        headers,
    }
}

/// Split a digest fingerprint out of a filename: `foo-<32 hex>.js` becomes
/// `("foo.js", Some(digest))`; anything else passes through unchanged.
fn split_fingerprint(file: &str) -> (String, Option<String>) {
    match FINGERPRINT.captures(file) {
        Some(caps) => (
            format!("{}{}", &caps[1], &caps[3]),
            Some(caps[2].to_string()),
        ),
        None => (file.to_string(), None),
    }
}

fn respond_not_found(request: Request) -> anyhow::Result<()> {
    let response = Response::from_string("404 Not Found")
        .with_status_code(StatusCode(404))
        .with_header(make_header("Content-Type", mime::types::PLAIN));
    request.respond(response)?;
    Ok(())
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.to_string())
}

fn make_header(key: &str, value: &str) -> Header {
    Header::from_bytes(key.as_bytes(), value.as_bytes()).expect("static header")
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
