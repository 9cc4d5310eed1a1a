pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod graph;
pub mod result;
pub mod scope;

pub use config::CrawlConfig;
pub use crawler::{Crawler, ProgressCallback};
pub use error::{ConfigError, CrawlError};
pub use extract::{LinkExtractor, MarkupExtractor, extract_links};
pub use fetch::{FetchClient, FetchFailure, FetchResponse, FetcherOptions, HttpFetcher};
pub use graph::DiscoveryGraph;
pub use result::{CrawlOutcome, CrawlStats, DiscoveredRecord};
