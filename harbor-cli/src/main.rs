use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tokio::signal;
use tokio::sync::watch;
use tracing::info;

use harbor_store::{HttpStore, RedundancyConfig, RemotePath, RemoteStore};
use harbor_sync::{FingerprintKind, Promoter, PromotionConfig, SyncConfig, SyncEngine};

mod config;

use config::FileConfig;

const DEFAULT_API_ADDR: &str = "127.0.0.1:9980";
const DEFAULT_AGENT: &str = "harborsync";
const DEFAULT_STAGING_DIR: &str = "fuse/staging";
const DEFAULT_PROD_DIR: &str = "fuse/prod";

#[derive(Parser)]
#[command(name = "harborsync")]
#[command(about = "Mirror a local directory into a replicated remote store", long_about = None)]
#[command(version)]
struct Cli {
    /// Optional TOML config file; flags override file values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Remote store API address
    #[arg(long)]
    api_addr: Option<String>,

    /// Remote store API password
    #[arg(long)]
    api_password: Option<String>,

    /// User agent sent on store requests
    #[arg(long)]
    agent: Option<String>,

    /// Per-request timeout for store calls, in seconds
    #[arg(long)]
    api_timeout_secs: Option<u64>,

    /// Remote namespace for fresh uploads
    #[arg(long)]
    staging_dir: Option<String>,

    /// Remote namespace for promoted directories
    #[arg(long)]
    prod_dir: Option<String>,

    /// Keep old remote objects instead of deleting before re-upload
    #[arg(long)]
    archive: bool,

    /// Show what would be uploaded without changing the remote store
    #[arg(long)]
    dry_run: bool,

    /// Erasure coding data pieces
    #[arg(long)]
    data_pieces: Option<u32>,

    /// Erasure coding parity pieces
    #[arg(long)]
    parity_pieces: Option<u32>,

    /// Seconds between staging health checks
    #[arg(long)]
    check_interval_secs: Option<u64>,

    /// Promote once aggregate minimum redundancy strictly exceeds this
    #[arg(long)]
    redundancy_threshold: Option<f64>,

    /// Staging category directory to monitor for promotion (repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Fingerprint function for change detection
    #[arg(long, value_enum)]
    fingerprint: Option<FingerprintArg>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Local directory to synchronize
    directory: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FingerprintArg {
    /// File size (cheap, not collision-safe)
    Size,
    /// blake3 content hash
    Blake3,
}

impl From<FingerprintArg> for FingerprintKind {
    fn from(value: FingerprintArg) -> Self {
        match value {
            FingerprintArg::Size => FingerprintKind::Size,
            FingerprintArg::Blake3 => FingerprintKind::Blake3,
        }
    }
}

struct Settings {
    sync: SyncConfig,
    api_addr: String,
    api_password: Option<String>,
    agent: String,
    api_timeout: Duration,
}

fn resolve(cli: Cli, file: FileConfig) -> Result<Settings> {
    let fingerprint = match cli.fingerprint {
        Some(arg) => FingerprintKind::from(arg),
        None => match file.fingerprint.as_deref() {
            None | Some("size") => FingerprintKind::Size,
            Some("blake3") => FingerprintKind::Blake3,
            Some(other) => bail!("unknown fingerprint function in config file: {other}"),
        },
    };

    let categories = if cli.categories.is_empty() {
        file.categories.unwrap_or_default()
    } else {
        cli.categories
    };

    let sync = SyncConfig {
        root: cli.directory,
        staging_dir: cli
            .staging_dir
            .or(file.staging_dir)
            .unwrap_or_else(|| DEFAULT_STAGING_DIR.to_string()),
        prod_dir: cli
            .prod_dir
            .or(file.prod_dir)
            .unwrap_or_else(|| DEFAULT_PROD_DIR.to_string()),
        archive: cli.archive || file.archive.unwrap_or(false),
        dry_run: cli.dry_run || file.dry_run.unwrap_or(false),
        redundancy: RedundancyConfig {
            data_pieces: cli
                .data_pieces
                .or(file.data_pieces)
                .unwrap_or(RedundancyConfig::default().data_pieces),
            parity_pieces: cli
                .parity_pieces
                .or(file.parity_pieces)
                .unwrap_or(RedundancyConfig::default().parity_pieces),
        },
        fingerprint,
        promotion: PromotionConfig {
            interval: Duration::from_secs(
                cli.check_interval_secs.or(file.check_interval_secs).unwrap_or(5),
            ),
            threshold: cli
                .redundancy_threshold
                .or(file.redundancy_threshold)
                .unwrap_or(1.0),
            categories,
        },
    };

    Ok(Settings {
        sync,
        api_addr: cli
            .api_addr
            .or(file.api_addr)
            .unwrap_or_else(|| DEFAULT_API_ADDR.to_string()),
        api_password: cli.api_password.or(file.api_password),
        agent: cli
            .agent
            .or(file.agent)
            .unwrap_or_else(|| DEFAULT_AGENT.to_string()),
        api_timeout: Duration::from_secs(
            cli.api_timeout_secs.or(file.api_timeout_secs).unwrap_or(30),
        ),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .init();

    let file = FileConfig::load_if_present(cli.config.as_ref())?;
    let settings = resolve(cli, file)?;

    let store: Arc<dyn RemoteStore> = Arc::new(
        HttpStore::with_timeout(
            &settings.api_addr,
            settings.api_password.clone(),
            &settings.agent,
            settings.api_timeout,
        )
        .context("failed to build store client")?,
    );

    let mut engine = SyncEngine::new(settings.sync.clone(), store.clone())
        .context("failed to initialize sync engine")?;

    info!(root = %engine.root().display(), "reconciling against remote store");
    engine
        .reconcile()
        .await
        .context("startup reconciliation failed")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let promoter = Promoter::new(
        settings.sync.promotion.clone(),
        RemotePath::new(&settings.sync.staging_dir)?,
        RemotePath::new(&settings.sync.prod_dir)?,
        store,
    );
    let promoter_handle = tokio::spawn(promoter.run(shutdown_rx.clone()));
    let dispatcher_handle = tokio::spawn(engine.run(shutdown_rx));

    signal::ctrl_c()
        .await
        .context("failed to listen for interrupt signal")?;
    info!("caught interrupt, shutting down");

    // Both loops finish their in-flight work and exit; dropping the
    // engine releases the watcher's OS resources.
    let _ = shutdown_tx.send(true);
    dispatcher_handle
        .await
        .context("dispatcher task panicked")??;
    promoter_handle.await.context("promoter task panicked")?;

    info!("shutdown complete");
    Ok(())
}
