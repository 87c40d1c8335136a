//! Bounded-concurrency HTTP downloader with resume, retry, and progress
//! events. This is the only concurrent subsystem of the pipeline: requests
//! fan out up to a global in-flight cap with a fairness cap per host,
//! every download lands through a temp sibling and an atomic rename, and
//! transient failures retry with jittered exponential backoff.

mod pool;

pub use pool::{FetchOutcome, FetchPool};

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Static configuration of the pool: concurrency caps, retry policy, and
/// per-attempt timeouts.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Global cap on in-flight requests.
    pub max_in_flight: usize,
    /// Cap on in-flight requests per remote host.
    pub per_host: usize,
    /// Total attempts per request (first try included).
    pub attempts: u32,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
    pub connect_timeout: Duration,
    /// Per-attempt deadline for the whole response.
    pub read_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            per_host: 4,
            attempts: 4,
            backoff_min: Duration::from_millis(250),
            backoff_max: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(120),
        }
    }
}

/// The payload class a request expects; responses outside the class's
/// content-type allow list are retained but flagged suspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    Json,
    Html,
    /// PDS3 catalog text; archives serve it under several plain-text
    /// types.
    Pds3Text,
}

impl RequestClass {
    fn allows(&self, content_type: &str) -> bool {
        let essence = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match self {
            RequestClass::Json => matches!(essence.as_str(), "application/json" | "text/json"),
            RequestClass::Html => matches!(essence.as_str(), "text/html" | "application/xhtml+xml"),
            RequestClass::Pds3Text => {
                matches!(essence.as_str(), "text/plain" | "application/octet-stream" | "text/x-pds")
            }
        }
    }
}

/// One download: where from, where to, and what to expect.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub dest: PathBuf,
    /// Size the upstream advertises, when known; used for the resume
    /// check.
    pub expected_len: Option<u64>,
    pub class: RequestClass,
}

/// Progress events emitted while the pool runs.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    Started { url: Url },
    Progress { url: Url, bytes: u64 },
    Completed { url: Url, dest: PathBuf },
    Failed { url: Url, error: String },
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered {status}")]
    Status { url: Url, status: reqwest::StatusCode },

    #[error("i/o on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("canceled")]
    Canceled,
}

impl FetchError {
    /// Transient errors are worth another attempt: transport failures,
    /// 5xx, and 429. Any other HTTP status is terminal.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}
