// Plain-text crawl report

use std::collections::BTreeMap;
use trawl_scanner::{CrawlOutcome, DiscoveredRecord};
use url::Url;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Path plus query string, for listing pages of a single origin.
pub fn display_path(url: &str) -> String {
    let path = extract_url_path(url);
    match Url::parse(url).ok().and_then(|u| u.query().map(String::from)) {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    }
}

fn colorize_status(status_code: u16, color: bool) -> String {
    if !color {
        return status_code.to_string();
    }
    match status_code {
        100..=199 => format!("\x1b[37m{}\x1b[0m", status_code), // White
        200..=299 => format!("\x1b[32m{}\x1b[0m", status_code), // Green
        300..=399 => format!("\x1b[36m{}\x1b[0m", status_code), // Cyan
        400..=499 => format!("\x1b[33m{}\x1b[0m", status_code), // Orange/Yellow
        500..=599 => format!("\x1b[31m{}\x1b[0m", status_code), // Red
        _ => format!("{}", status_code),
    }
}

/// Generate a crawl report from a finished crawl
pub fn generate_crawl_report(outcome: &CrawlOutcome, color: bool) -> String {
    let stats = &outcome.stats;
    let mut report = String::new();

    report.push_str(RULE);
    report.push('\n');
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Seed: {}\n", outcome.seed));
    report.push_str(&format!("  Pages fetched: {}\n", stats.fetched));
    report.push_str(&format!("  Failed fetches: {}\n", stats.failed));
    report.push_str(&format!("  Links recorded: {}\n", outcome.graph.edge_count()));
    report.push_str(&format!("  Nodes in graph: {}\n", outcome.graph.node_count()));
    report.push_str(&format!("  Levels crawled: {}\n", stats.levels));
    let per_depth: Vec<String> = outcome
        .pages_per_depth()
        .iter()
        .enumerate()
        .map(|(depth, count)| format!("{}={}", depth, count))
        .collect();
    if !per_depth.is_empty() {
        report.push_str(&format!("  Pages per depth: {}\n", per_depth.join(", ")));
    }
    if stats.cancelled {
        report.push_str("  Crawl was cancelled before completion\n");
    }
    report.push('\n');
    report.push_str(RULE);
    report.push('\n');

    let mut by_depth: BTreeMap<usize, Vec<(&String, &DiscoveredRecord)>> = BTreeMap::new();
    for (url, record) in &outcome.records {
        by_depth.entry(record.depth).or_default().push((url, record));
    }

    for (depth, pages) in &by_depth {
        report.push_str(&format!("## Depth {}\n", depth));
        report.push_str(&format!("  {} pages found\n\n", pages.len()));

        for (url, record) in pages {
            let mut line = format!(
                "  {} {}",
                colorize_status(record.status_code, color),
                display_path(url)
            );

            // Only show MIME type if it's not HTML
            if let Some(ref content_type) = record.content_type
                && !content_type.starts_with("text/html")
            {
                if color {
                    line.push_str(&format!(" \x1b[90m{}\x1b[0m", content_type));
                } else {
                    line.push_str(&format!(" {}", content_type));
                }
            }

            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    let unfetched: Vec<&str> = outcome
        .graph
        .nodes()
        .into_iter()
        .filter(|url| !outcome.records.contains_key(*url))
        .collect();
    if !unfetched.is_empty() {
        report.push_str(&format!("## Referenced but not fetched ({})\n", unfetched.len()));
        for url in unfetched {
            report.push_str(&format!("  {}\n", display_path(url)));
        }
        report.push('\n');
    }

    report
}
