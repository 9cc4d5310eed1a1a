// Shared fixtures for trawl-core integration tests

use std::collections::BTreeMap;
use trawl_scanner::{CrawlOutcome, CrawlStats, DiscoveredRecord, DiscoveryGraph};

fn record(status_code: u16, content_type: Option<&str>, depth: usize) -> DiscoveredRecord {
    DiscoveredRecord {
        status_code,
        content_type: content_type.map(String::from),
        depth,
    }
}

/// Seed links to /a and /b, /a links to /b and /c, /b links back to the
/// seed. /c was referenced from the last level and never fetched.
#[allow(dead_code)]
pub fn sample_outcome() -> CrawlOutcome {
    let seed = "http://site.test/";
    let a = "http://site.test/a";
    let b = "http://site.test/b?page=2";
    let c = "http://site.test/c";

    let mut records = BTreeMap::new();
    records.insert(seed.to_string(), record(200, Some("text/html; charset=utf-8"), 0));
    records.insert(a.to_string(), record(200, Some("text/html"), 1));
    records.insert(b.to_string(), record(200, Some("application/json"), 1));

    let mut graph = DiscoveryGraph::new();
    graph.add_node(seed);
    graph.add_edge(seed, a, 0);
    graph.add_edge(seed, b, 0);
    graph.add_edge(a, b, 1);
    graph.add_edge(a, c, 1);
    graph.add_edge(b, seed, 1);

    CrawlOutcome {
        seed: seed.to_string(),
        records,
        graph,
        stats: CrawlStats {
            fetched: 3,
            failed: 0,
            skipped: 0,
            levels: 2,
            cancelled: false,
        },
    }
}

/// A crawl whose seed failed: no records, a single node.
#[allow(dead_code)]
pub fn failed_seed_outcome() -> CrawlOutcome {
    let seed = "http://down.test/";
    let mut graph = DiscoveryGraph::new();
    graph.add_node(seed);

    CrawlOutcome {
        seed: seed.to_string(),
        records: BTreeMap::new(),
        graph,
        stats: CrawlStats {
            fetched: 0,
            failed: 1,
            skipped: 0,
            levels: 1,
            cancelled: false,
        },
    }
}
