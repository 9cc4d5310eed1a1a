//! URL resolution and origin scoping.
//!
//! Everything here is a pure function over [`Url`] values; the crawler calls
//! into it from many tasks at once.

use crate::error::ConfigError;
use url::Url;

const SKIPPED_PREFIXES: [&str; 4] = ["javascript:", "mailto:", "tel:", "data:"];

/// Parse a seed URL, rejecting anything the crawler cannot fetch.
pub fn normalize(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !is_crawlable_scheme(url.scheme()) {
        return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::MissingHost(raw.to_string()));
    }

    url.set_fragment(None);
    Ok(url)
}

/// Join `reference` against `base`, dropping the fragment.
///
/// Returns `None` for references that never name a fetchable document:
/// empty strings, in-page anchors and `javascript:`/`mailto:`/`tel:`/`data:`.
pub fn resolve(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with('#') {
        return None;
    }

    let lowered = reference.to_ascii_lowercase();
    if SKIPPED_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return None;
    }

    let mut resolved = base.join(reference).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}

/// True when `url` is http(s) and shares the origin's host and port.
///
/// Comparison is strict equality on the network location: no subdomain
/// matching and no path prefixing. The `url` crate drops default ports while
/// parsing, so `http://h:80/` and `http://h/` compare equal.
pub fn is_in_scope(url: &Url, origin: &Url) -> bool {
    is_crawlable_scheme(url.scheme())
        && url.host_str().is_some()
        && url.host_str() == origin.host_str()
        && url.port() == origin.port()
}

fn is_crawlable_scheme(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}
