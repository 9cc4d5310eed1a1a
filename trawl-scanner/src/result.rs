use crate::graph::DiscoveryGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata for a page that was fetched with status 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredRecord {
    pub status_code: u16,
    pub content_type: Option<String>,
    pub depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Pages committed with a record.
    pub fetched: usize,
    /// Network errors, timeouts and non-200 responses.
    pub failed: usize,
    /// Tasks that did no work: already visited, out of scope, or cancelled.
    pub skipped: usize,
    pub levels: usize,
    pub cancelled: bool,
}

/// Everything a finished crawl hands to the result sink.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub seed: String,
    pub records: BTreeMap<String, DiscoveredRecord>,
    pub graph: DiscoveryGraph,
    pub stats: CrawlStats,
}

impl CrawlOutcome {
    pub fn visited(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Record count per depth, indexed by depth.
    pub fn pages_per_depth(&self) -> Vec<usize> {
        let mut counts = Vec::new();
        for record in self.records.values() {
            if counts.len() <= record.depth {
                counts.resize(record.depth + 1, 0);
            }
            counts[record.depth] += 1;
        }
        counts
    }
}
