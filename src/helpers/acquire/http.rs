//! HTTP plumbing for snapshot sources
//!
//! A blocking `ureq` agent with a configurable timeout, plus the index-page
//! scraping used to enumerate backups on browsable sources.

use crate::core::error::{Result, TrondError};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// Default HTTP timeout in seconds
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Get HTTP timeout from environment variable or use default.
/// Cached (only reads env var once).
///
/// Applies to connecting and to each read, never to a whole transfer:
/// snapshots run to hundreds of gigabytes.
fn get_http_timeout() -> Duration {
    static TIMEOUT: OnceLock<Duration> = OnceLock::new();
    *TIMEOUT.get_or_init(|| {
        let secs = std::env::var("TROND_HTTP_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        // Clamp to reasonable range (5-300 seconds)
        Duration::from_secs(secs.clamp(5, 300))
    })
}

fn agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let timeout = get_http_timeout();
        ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .user_agent(concat!("trond/", env!("CARGO_PKG_VERSION")))
            .build()
    })
}

/// Issue a GET and require a 200 response.
pub fn get(url: &str) -> Result<ureq::Response> {
    let response = agent().get(url).call().map_err(|e| match e {
        ureq::Error::Status(status, _) => TrondError::HttpStatus {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(t) => TrondError::Transport {
            url: url.to_string(),
            reason: t.to_string(),
        },
    })?;

    if response.status() != 200 {
        return Err(TrondError::HttpStatus {
            url: url.to_string(),
            status: response.status(),
        });
    }
    Ok(response)
}

/// Fetch content from a URL as a string.
pub fn http_get(url: &str) -> Result<String> {
    get(url)?.into_string().map_err(TrondError::from)
}

fn href_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']*)["']"#)
            .expect("href pattern is valid")
    })
}

/// Extract every `<a href>` from an HTML page, resolved against `base`.
///
/// Unresolvable hrefs are dropped.
pub fn extract_links(base: &str, html: &str) -> Result<Vec<String>> {
    let base_url = url::Url::parse(base).map_err(|e| TrondError::Transport {
        url: base.to_string(),
        reason: format!("invalid base URL: {}", e),
    })?;

    Ok(href_pattern()
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .filter_map(|m| base_url.join(m.as_str()).ok())
        .map(|u| u.to_string())
        .collect())
}

/// Fetch an index page and return its links as absolute URLs.
pub fn fetch_links(url: &str) -> Result<Vec<String>> {
    let body = http_get(url)?;
    extract_links(url, &body)
}

/// Last non-empty path segment of a URL, ignoring a trailing slash.
///
/// `http://host/backup20250101/` gives `backup20250101`; `http://host/`
/// gives `None`.
pub fn last_path_segment(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    parsed
        .path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(|s| s.to_string())
}
