use crate::config::CrawlConfig;
use crate::error::Result;
use crate::extract::{LinkExtractor, MarkupExtractor};
use crate::fetch::FetchClient;
use crate::graph::DiscoveryGraph;
use crate::result::{CrawlOutcome, CrawlStats, DiscoveredRecord};
use crate::scope;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Called with `(depth, url)` just before a page is fetched.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Level-synchronous breadth-first crawler.
///
/// Each depth level is one wave: every URL in the frontier gets its own task,
/// at most `workers` of them fetch at once, and the next level starts only
/// after the whole wave has been joined.
pub struct Crawler {
    config: CrawlConfig,
    client: Arc<dyn FetchClient>,
    extractor: Arc<dyn LinkExtractor>,
    progress_callback: Option<ProgressCallback>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct CrawlState {
    visited: HashSet<String>,
    records: BTreeMap<String, DiscoveredRecord>,
    graph: DiscoveryGraph,
    stats: CrawlStats,
}

impl Crawler {
    pub fn new(config: CrawlConfig, client: Arc<dyn FetchClient>) -> Self {
        Self {
            config,
            client,
            extractor: Arc::new(MarkupExtractor),
            progress_callback: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Share an abort signal with the caller. Cancelling it stops new waves
    /// and abandons in-flight fetches; nothing already committed is lost.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub async fn crawl(&self) -> Result<CrawlOutcome> {
        self.config.validate()?;

        let seed = self.config.seed.clone();
        let max_depth = self.config.max_depth;
        info!(
            "Starting crawl of {} (max depth {}, {} workers)",
            seed, max_depth, self.config.workers
        );

        let state = Arc::new(Mutex::new(CrawlState::default()));
        state.lock().await.graph.add_node(seed.as_str());

        let worker = Worker {
            client: self.client.clone(),
            extractor: self.extractor.clone(),
            state: state.clone(),
            semaphore: Arc::new(Semaphore::new(self.config.workers)),
            cancel: self.cancel.clone(),
            origin: seed.clone(),
            timeout: self.config.timeout,
            progress_callback: self.progress_callback.clone(),
        };

        let mut frontier = BTreeSet::from([seed.to_string()]);
        let mut depth = 0;

        while depth <= max_depth && !frontier.is_empty() && !self.cancel.is_cancelled() {
            info!("Level {}: {} URL(s) in frontier", depth, frontier.len());

            let mut tasks = JoinSet::new();
            for url in std::mem::take(&mut frontier) {
                tasks.spawn(worker.clone().visit(url, depth));
            }

            // Barrier: the wave is over once every task has been joined.
            let mut discovered = BTreeSet::new();
            while let Some(joined) = tasks.join_next().await {
                discovered.extend(joined?);
            }

            let mut guard = state.lock().await;
            guard.stats.levels += 1;
            frontier = discovered
                .into_iter()
                .filter(|url| !guard.visited.contains(url))
                .collect();
            debug!(
                "Level {} done: {} visited so far, {} new URL(s)",
                depth,
                guard.visited.len(),
                frontier.len()
            );
            drop(guard);

            depth += 1;
        }

        let cancelled = self.cancel.is_cancelled();
        if cancelled {
            warn!("Crawl cancelled at depth {}", depth);
        } else if frontier.is_empty() {
            info!("Crawl exhausted: no new in-scope URLs after depth {}", depth.saturating_sub(1));
        } else {
            info!(
                "Depth limit {} reached; {} URL(s) left unvisited",
                max_depth,
                frontier.len()
            );
        }

        let mut guard = state.lock().await;
        let CrawlState {
            records,
            graph,
            mut stats,
            ..
        } = std::mem::take(&mut *guard);
        stats.cancelled = cancelled;

        info!(
            "Crawl complete. Fetched {} page(s), {} failure(s), {} edge(s)",
            stats.fetched,
            stats.failed,
            graph.edge_count()
        );

        Ok(CrawlOutcome {
            seed: seed.to_string(),
            records,
            graph,
            stats,
        })
    }
}

/// Everything a single fetch task needs, cloned into each task.
#[derive(Clone)]
struct Worker {
    client: Arc<dyn FetchClient>,
    extractor: Arc<dyn LinkExtractor>,
    state: Arc<Mutex<CrawlState>>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    origin: Url,
    timeout: Duration,
    progress_callback: Option<ProgressCallback>,
}

impl Worker {
    /// Fetch one URL and return the in-scope links it contributes to the
    /// next level. Failures contribute nothing and leave no trace in the
    /// visited set, records or graph.
    async fn visit(self, url: String, depth: usize) -> BTreeSet<String> {
        let permit = tokio::select! {
            _ = self.cancel.cancelled() => None,
            permit = self.semaphore.clone().acquire_owned() => permit.ok(),
        };
        let Some(_permit) = permit else {
            self.skip().await;
            return BTreeSet::new();
        };

        let parsed = match Url::parse(&url) {
            Ok(parsed) if scope::is_in_scope(&parsed, &self.origin) => parsed,
            _ => {
                debug!("Skipping out-of-scope {}", url);
                self.skip().await;
                return BTreeSet::new();
            }
        };

        if self.state.lock().await.visited.contains(&url) {
            self.skip().await;
            return BTreeSet::new();
        }

        if let Some(ref callback) = self.progress_callback {
            callback(depth, url.clone());
        }

        let fetched = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("Abandoning {} (cancelled)", url);
                self.skip().await;
                return BTreeSet::new();
            }
            fetched = tokio::time::timeout(self.timeout, self.client.get(&parsed, self.timeout)) => fetched,
        };

        let response = match fetched {
            Ok(Ok(response)) if response.status == 200 => response,
            Ok(Ok(response)) => {
                debug!("{} returned HTTP {}", url, response.status);
                self.fail().await;
                return BTreeSet::new();
            }
            Ok(Err(e)) => {
                warn!("Fetch failed for {}: {}", url, e);
                self.fail().await;
                return BTreeSet::new();
            }
            Err(_) => {
                warn!("Fetch timed out for {}", url);
                self.fail().await;
                return BTreeSet::new();
            }
        };

        let links: BTreeSet<String> = self
            .extractor
            .extract(&response.body, &parsed)
            .into_iter()
            .filter(|link| scope::is_in_scope(link, &self.origin))
            .map(String::from)
            .collect();

        // Single commit point: visited entry, record and edges land together.
        let mut state = self.state.lock().await;
        if !state.visited.insert(url.clone()) {
            state.stats.skipped += 1;
            return BTreeSet::new();
        }
        state.records.insert(
            url.clone(),
            DiscoveredRecord {
                status_code: response.status,
                content_type: response.content_type,
                depth,
            },
        );
        state.stats.fetched += 1;
        for link in &links {
            state.graph.add_edge(&url, link, depth);
        }
        debug!("[depth {}] {} -> {} in-scope link(s)", depth, url, links.len());

        links
    }

    async fn skip(&self) {
        self.state.lock().await.stats.skipped += 1;
    }

    async fn fail(&self) {
        self.state.lock().await.stats.failed += 1;
    }
}
