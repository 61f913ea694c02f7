//! URL canonicalization for equality and near-equality checks.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::TARGET_DEDUP;

lazy_static! {
    static ref TRAILING_NUMERIC_SEGMENT: Regex = Regex::new(r"/\d+$").unwrap();
}

/// Parse a raw article URL, lowercased. `None` for empty or malformed URLs,
/// which the stages treat as URL-less.
fn parse_lowercase(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Url::parse(&trimmed.to_lowercase()) {
        Ok(parsed) if parsed.has_host() => Some(parsed),
        Ok(_) => {
            debug!(target: TARGET_DEDUP, "Ignoring URL without host: {}", raw);
            None
        }
        Err(e) => {
            debug!(target: TARGET_DEDUP, "Ignoring malformed URL {}: {}", raw, e);
            None
        }
    }
}

fn host_with_port(parsed: &Url) -> String {
    let host = parsed.host_str().unwrap_or_default();
    match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Canonical form used by the exact URL stage: lowercase scheme, host and path,
/// query and fragment dropped, one trailing slash removed.
pub fn canonical_url(raw: &str) -> Option<String> {
    let parsed = parse_lowercase(raw)?;
    let mut canonical = format!(
        "{}://{}{}",
        parsed.scheme(),
        host_with_port(&parsed),
        parsed.path()
    );
    if canonical.ends_with('/') {
        canonical.pop();
    }
    Some(canonical)
}

/// Whether two URLs point at the same story: identical host and path, or
/// identical once a trailing numeric path segment is dropped from a
/// substantial path.
pub fn urls_similar(url1: &str, url2: &str, min_path_len: usize) -> bool {
    let (Some(parsed1), Some(parsed2)) = (parse_lowercase(url1), parse_lowercase(url2)) else {
        return false;
    };

    if host_with_port(&parsed1) != host_with_port(&parsed2) {
        return false;
    }

    let path1 = parsed1.path().trim_end_matches('/');
    let path2 = parsed2.path().trim_end_matches('/');
    if path1 == path2 {
        return true;
    }

    let stem1 = TRAILING_NUMERIC_SEGMENT.replace(path1, "");
    let stem2 = TRAILING_NUMERIC_SEGMENT.replace(path2, "");
    stem1 == stem2 && stem1.len() > min_path_len
}
