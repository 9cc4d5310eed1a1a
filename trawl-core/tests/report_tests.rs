// Tests for crawl report generation

mod common;

use trawl_core::report::{display_path, extract_url_path, generate_crawl_report};

// ============================================================================
// URL Path Extraction Tests
// ============================================================================

#[test]
fn test_extract_url_path_root() {
    assert_eq!(extract_url_path("http://example.com/"), "/");
}

#[test]
fn test_extract_url_path_empty_path() {
    assert_eq!(extract_url_path("http://example.com"), "/");
}

#[test]
fn test_extract_url_path_nested() {
    assert_eq!(extract_url_path("http://example.com/api/v1/users"), "/api/v1/users");
}

#[test]
fn test_extract_url_path_drops_query() {
    assert_eq!(extract_url_path("http://example.com/search?q=test"), "/search");
}

#[test]
fn test_extract_url_path_invalid_url() {
    assert_eq!(extract_url_path("not a url"), "not a url");
}

#[test]
fn test_display_path_keeps_query() {
    assert_eq!(display_path("http://example.com/search?q=test"), "/search?q=test");
    assert_eq!(display_path("http://example.com/"), "/");
}

// ============================================================================
// Report Tests
// ============================================================================

#[test]
fn test_report_summary_counts() {
    let outcome = common::sample_outcome();
    let report = generate_crawl_report(&outcome, false);

    assert!(report.contains("Seed: http://site.test/"));
    assert!(report.contains("Pages fetched: 3"));
    assert!(report.contains("Failed fetches: 0"));
    assert!(report.contains("Links recorded: 5"));
    assert!(report.contains("Nodes in graph: 4"));
    assert!(report.contains("Levels crawled: 2"));
    assert!(report.contains("Pages per depth: 0=1, 1=2"));
    assert!(!report.contains("cancelled"));
}

#[test]
fn test_report_groups_pages_by_depth() {
    let outcome = common::sample_outcome();
    let report = generate_crawl_report(&outcome, false);

    let depth0 = report.find("## Depth 0").unwrap();
    let depth1 = report.find("## Depth 1").unwrap();
    assert!(depth0 < depth1);
    assert!(report.contains("  1 pages found"));
    assert!(report.contains("  2 pages found"));
    assert!(report.contains("  200 /a\n"));
}

#[test]
fn test_report_shows_only_non_html_content_types() {
    let outcome = common::sample_outcome();
    let report = generate_crawl_report(&outcome, false);

    assert!(report.contains("  200 /b?page=2 application/json"));
    assert!(!report.contains("text/html"));
}

#[test]
fn test_report_lists_unfetched_nodes() {
    let outcome = common::sample_outcome();
    let report = generate_crawl_report(&outcome, false);

    assert!(report.contains("## Referenced but not fetched (1)"));
    assert!(report.contains("  /c\n"));
}

#[test]
fn test_report_plain_has_no_ansi() {
    let outcome = common::sample_outcome();
    let report = generate_crawl_report(&outcome, false);
    assert!(!report.contains("\x1b["));
}

#[test]
fn test_report_colored_status() {
    let outcome = common::sample_outcome();
    let report = generate_crawl_report(&outcome, true);
    assert!(report.contains("\x1b[32m200\x1b[0m"));
}

#[test]
fn test_report_failed_seed() {
    let outcome = common::failed_seed_outcome();
    let report = generate_crawl_report(&outcome, false);

    assert!(report.contains("Pages fetched: 0"));
    assert!(report.contains("Failed fetches: 1"));
    assert!(!report.contains("## Depth"));
    assert!(!report.contains("Pages per depth"));
    assert!(report.contains("## Referenced but not fetched (1)"));
}

#[test]
fn test_report_marks_cancelled_crawl() {
    let mut outcome = common::sample_outcome();
    outcome.stats.cancelled = true;
    let report = generate_crawl_report(&outcome, false);
    assert!(report.contains("Crawl was cancelled before completion"));
}
