// crates/quill-daemon/src/main.rs
//
// Binary entrypoint for the Quill daemon.
//
// Parses CLI arguments, loads configuration, initializes tracing, opens the
// store, wires the federation components and serves HTTP until interrupted.

mod config;

use std::sync::Arc;

use clap::Parser;
use config::QuillConfig;

use quill_federation::{CachedTrustProber, FederationClient, HttpTrustProber};
use quill_rpc::{AppContext, HttpConfig, QuillHttpServer};
use quill_store::RocksStore;

/// Quill daemon: serves one federated blog instance.
#[derive(Parser, Debug)]
#[command(name = "quilld", version = "0.1.0", about = "Quill instance daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.quill/config.toml")]
    config: String,

    /// HTTP port, overriding the config file.
    #[arg(long)]
    port: Option<u16>,

    /// Public origin of this instance, overriding the config file.
    #[arg(long)]
    origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load before tracing is up so log_level can seed the filter; the
    // outcome is reported right after.
    let config_path = expand_tilde(&args.config);
    let loaded = QuillConfig::load(&config_path);
    let mut quill_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => QuillConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&quill_config.log_level)),
        )
        .init();

    match loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", config_path),
        Err(e) => tracing::warn!("{}. Using defaults.", e),
    }

    quill_config.apply_env(|key| std::env::var(key).ok());
    if let Some(port) = args.port {
        quill_config.http_port = port;
    }
    if let Some(origin) = args.origin {
        quill_config.origin = origin;
    }
    quill_config.validate()?;

    tracing::info!("Quill daemon v0.1.0");
    tracing::info!("Origin: {} (remotes over {})", quill_config.origin, quill_config.scheme);
    tracing::info!("Data directory: {}", quill_config.data_dir);
    tracing::info!(
        "HTTP endpoint: {}:{}",
        quill_config.http_host,
        quill_config.http_port
    );
    if quill_config.admin_secret.is_empty() {
        tracing::warn!(
            "No admin secret configured (set admin_secret or {}); admin actions are disabled",
            config::ENV_ADMIN_SECRET
        );
    }

    // ---------------------------------------------------------------
    // Storage
    // ---------------------------------------------------------------
    let data_dir = expand_tilde(&quill_config.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let db_path = format!("{}/rocksdb", data_dir);
    let store = Arc::new(RocksStore::open(&db_path)?);
    tracing::info!("RocksStore opened at {}", db_path);

    // ---------------------------------------------------------------
    // Federation wiring
    // ---------------------------------------------------------------
    let client = FederationClient::new(
        &quill_config.scheme,
        &quill_config.origin,
        quill_config.request_timeout(),
    )?;
    let probe_ttl = quill_config.probe_cache_ttl();
    let prober = Arc::new(CachedTrustProber::new(
        Arc::new(HttpTrustProber::new(client.clone())),
        probe_ttl,
    ));
    if !probe_ttl.is_zero() {
        spawn_probe_cache_sweeper(prober.clone(), probe_ttl);
    }

    let ctx = AppContext::wire(
        store,
        prober,
        client,
        &quill_config.admin_secret,
        quill_config.max_concurrent_pushes,
    );

    let server = QuillHttpServer::new(
        HttpConfig {
            host: quill_config.http_host.clone(),
            port: quill_config.http_port,
        },
        ctx,
    );

    tokio::select! {
        result = server.start() => {
            if let Err(e) = result {
                tracing::error!("HTTP server stopped: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, exiting");
        }
    }

    Ok(())
}

/// Periodically drop expired probe outcomes so the cache stays bounded by
/// the number of origins seen within one TTL.
fn spawn_probe_cache_sweeper(prober: Arc<CachedTrustProber>, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            prober.purge_expired().await;
        }
    });
}

/// Expand a leading `~/` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
