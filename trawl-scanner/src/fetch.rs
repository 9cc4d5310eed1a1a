use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = concat!("Trawl/", env!("CARGO_PKG_VERSION"));

/// A completed HTTP exchange. Any status code, including 4xx/5xx, is a
/// response rather than a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Why a fetch produced no response at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("request timed out")]
    Timeout,

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("could not resolve host: {0}")]
    Dns(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Other(String),
}

/// Transport used by the crawler. Implementations must be cheap to share
/// between tasks and must honour `timeout`.
#[async_trait]
pub trait FetchClient: Send + Sync {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<FetchResponse, FetchFailure>;
}

#[derive(Debug, Clone)]
pub struct FetcherOptions {
    pub user_agent: String,
    pub accept_invalid_certs: bool,
    pub max_redirects: usize,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
            max_redirects: 5,
        }
    }
}

/// `reqwest`-backed [`FetchClient`].
///
/// The `Client` is a pooled handle; every `get` builds its own request and
/// the response is dropped on every return path.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(options: &FetcherOptions) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(options.user_agent.as_str())
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(options.max_redirects))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FetchClient for HttpFetcher {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<FetchResponse, FetchFailure> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchFailure::Timeout
            } else {
                FetchFailure::Body(e.to_string())
            }
        })?;

        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}

fn classify(error: reqwest::Error) -> FetchFailure {
    let detail = error_chain(&error);
    let lowered = detail.to_lowercase();

    if error.is_timeout() {
        FetchFailure::Timeout
    } else if error.is_redirect() {
        FetchFailure::TooManyRedirects
    } else if lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("ssl") {
        FetchFailure::Tls(detail)
    } else if error.is_connect() {
        if lowered.contains("dns") || lowered.contains("resolve") {
            FetchFailure::Dns(detail)
        } else {
            FetchFailure::Connect(detail)
        }
    } else {
        FetchFailure::Other(detail)
    }
}

// reqwest's Display only shows the outermost layer; the useful part
// (hyper/rustls/io) is further down the source chain.
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}
