//! Link extraction from fetched page bodies.
//!
//! Two passes feed one set: a structural pass over the parsed markup, and a
//! permissive regex pass over the raw text that picks up links embedded in
//! scripts, inline styles or markup too broken to parse.

use crate::scope;
use html_escape::decode_html_entities;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::trace;
use url::Url;

/// Turns page content into the absolute URLs it references.
pub trait LinkExtractor: Send + Sync {
    fn extract(&self, content: &str, source: &Url) -> HashSet<Url>;
}

/// Default extractor: `scraper` for markup plus regex fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupExtractor;

impl LinkExtractor for MarkupExtractor {
    fn extract(&self, content: &str, source: &Url) -> HashSet<Url> {
        extract_links(content, source)
    }
}

static STRUCTURAL_SELECTORS: LazyLock<Vec<(Selector, &'static str)>> = LazyLock::new(|| {
    [
        ("a[href]", "href"),
        ("area[href]", "href"),
        ("link[href]", "href"),
        ("script[src]", "src"),
        ("img[src]", "src"),
        ("iframe[src]", "src"),
        ("source[src]", "src"),
    ]
    .into_iter()
    .filter_map(|(css, attr)| Selector::parse(css).ok().map(|s| (s, attr)))
    .collect()
});

static ABSOLUTE_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>()\[\]{}\\^`|]+"#).ok());

// Quoted root-relative paths, e.g. fetch("/api/items") or '/static/app.css'.
// Protocol-relative `//host` is left to the structural pass.
static ROOT_RELATIVE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"["'](/(?:[^/"'\s<>][^"'\s<>]*)?)["']"#).ok());

/// Extract every URL referenced by `content`, resolved against `source`.
///
/// Never fails. Malformed markup yields whatever the structural pass could
/// recover plus the pattern pass.
pub fn extract_links(content: &str, source: &Url) -> HashSet<Url> {
    let mut links = structural_links(content, source);
    let structural = links.len();
    links.extend(pattern_links(content, source));
    trace!(
        "{}: {} structural, {} total links",
        source,
        structural,
        links.len()
    );
    links
}

fn structural_links(content: &str, source: &Url) -> HashSet<Url> {
    let document = Html::parse_document(content);
    let mut links = HashSet::new();

    for (selector, attr) in STRUCTURAL_SELECTORS.iter() {
        for element in document.select(selector) {
            if let Some(value) = element.value().attr(attr)
                && let Some(url) = scope::resolve(source, value)
            {
                links.insert(url);
            }
        }
    }

    links
}

fn pattern_links(content: &str, source: &Url) -> HashSet<Url> {
    let mut links = HashSet::new();

    if let Some(re) = ABSOLUTE_URL.as_ref() {
        for m in re.find_iter(content) {
            let decoded = decode_html_entities(m.as_str());
            let candidate = decoded.trim_end_matches(['.', ',', ';', ':', '!', '?']);
            if let Some(url) = scope::resolve(source, candidate) {
                links.insert(url);
            }
        }
    }

    if let Some(re) = ROOT_RELATIVE.as_ref() {
        for caps in re.captures_iter(content) {
            if let Some(path) = caps.get(1)
                && let Some(url) = scope::resolve(source, &decode_html_entities(path.as_str()))
            {
                links.insert(url);
            }
        }
    }

    links
}
