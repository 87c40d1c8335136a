//! The explicit context threaded through every phase: configuration,
//! stores, the fetch pool, and the cancellation token. Nothing here is a
//! process-wide singleton; the driver owns the context's lifetime.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use extract::OdeEndpoints;
use fetch::{FetchConfig, FetchPool};
use stores::{FileStore, RegistryStore};
use tokio_util::sync::CancellationToken;
use transform::StacTree;

/// Configuration flags, global to all subcommands.
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Root directory of the local storage tree.
    #[arg(long, global = true, env = "PDS_ROOT", default_value = "pds-data")]
    pub root: PathBuf,

    /// Base URL of the ODE service.
    #[arg(
        long = "ode-url",
        global = true,
        env = "PDS_ODE_URL",
        default_value = "https://oderest.rsl.wustl.edu/live2/"
    )]
    pub ode_url: url::Url,

    /// Global cap on in-flight downloads.
    #[arg(long, global = true, default_value_t = 8)]
    pub max_in_flight: usize,

    /// Cap on in-flight downloads per remote host.
    #[arg(long, global = true, default_value_t = 4)]
    pub per_host: usize,

    /// Attempts per request, first try included.
    #[arg(long, global = true, default_value_t = 4)]
    pub retries: u32,

    /// Lower bound of the retry backoff, in milliseconds.
    #[arg(long, global = true, default_value_t = 250)]
    pub backoff_min_ms: u64,

    /// Upper bound of the retry backoff, in milliseconds.
    #[arg(long, global = true, default_value_t = 30_000)]
    pub backoff_max_ms: u64,

    /// Connect timeout per attempt, in seconds.
    #[arg(long, global = true, default_value_t = 10)]
    pub connect_timeout: u64,

    /// Read deadline per attempt, in seconds.
    #[arg(long, global = true, default_value_t = 120)]
    pub read_timeout: u64,
}

pub struct Context {
    pub registry: RegistryStore,
    pub files: FileStore,
    pub tree: StacTree,
    pub pool: FetchPool,
    pub endpoints: OdeEndpoints,
    pub cancel: CancellationToken,
}

impl Context {
    pub fn new(config: &ConfigArgs) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.root)
            .with_context(|| format!("failed to create storage root {}", config.root.display()))?;

        let fetch_config = FetchConfig {
            max_in_flight: config.max_in_flight.max(1),
            per_host: config.per_host.max(1),
            attempts: config.retries.max(1),
            backoff_min: Duration::from_millis(config.backoff_min_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
            connect_timeout: Duration::from_secs(config.connect_timeout),
            read_timeout: Duration::from_secs(config.read_timeout),
        };
        let pool = FetchPool::new(fetch_config).context("failed to build the fetch pool")?;

        let files = FileStore::open(&config.root);
        let cancel = CancellationToken::new();

        // Ctrl-C requests cooperative cancellation: in-flight downloads
        // finish to a safe boundary, queued work is abandoned.
        let ctrl_c_cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, finishing in-flight work");
                ctrl_c_cancel.cancel();
            }
        });

        Ok(Self {
            registry: RegistryStore::open(&config.root),
            tree: StacTree::new(files.clone()),
            files,
            pool,
            endpoints: OdeEndpoints::new(config.ode_url.clone()),
            cancel,
        })
    }
}
