//! CinderKV Server Binary
//!
//! Starts the TCP server for CinderKV.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use cinderkv::config::AofSyncStrategy;
use cinderkv::network::{Server, ShutdownHandle};
use cinderkv::{Config, Engine};
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing_subscriber::{fmt, EnvFilter};

/// When the append-only log is fsynced
#[derive(Clone, Copy, Debug, ValueEnum)]
enum SyncMode {
    /// After every record
    Always,
    /// After every `--sync-count` records
    EveryN,
}

/// CinderKV Server
#[derive(Parser, Debug)]
#[command(name = "cinderkv-server")]
#[command(about = "In-memory key-value store with an append-only log")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./cinderkv_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    listen: String,

    /// Worker threads serving connections
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Accepted connections allowed to wait for a worker
    #[arg(long, default_value = "1024")]
    max_pending: usize,

    /// Keep everything in memory; no append-only log
    #[arg(long)]
    no_persistence: bool,

    /// AOF fsync policy
    #[arg(long, value_enum, default_value = "every-n")]
    sync: SyncMode,

    /// Records between fsyncs for `--sync every-n`
    #[arg(long, default_value = "100")]
    sync_count: usize,

    /// Close connections idle this long (milliseconds, 0 = never)
    #[arg(long, default_value = "5000")]
    read_timeout_ms: u64,

    /// Give up on a blocked reply after this long (milliseconds, 0 = never)
    #[arg(long, default_value = "5000")]
    write_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cinderkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("CinderKV Server v{}", cinderkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let strategy = match args.sync {
        SyncMode::Always => AofSyncStrategy::EveryWrite,
        SyncMode::EveryN => AofSyncStrategy::EveryNRecords {
            count: args.sync_count,
        },
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .worker_threads(args.workers)
        .max_pending_connections(args.max_pending)
        .persistence(!args.no_persistence)
        .aof_sync_strategy(strategy)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    // Open engine
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Engine initialized with {} keys (durable: {})",
        engine.key_count(),
        engine.is_durable()
    );
    if engine.is_durable() {
        tracing::info!("Appending to {}", engine.config().aof_path().display());
    }

    // SIGINT / SIGTERM flip the shared shutdown flag
    let flag = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&flag)) {
            tracing::error!("Failed to install signal handler: {}", e);
            std::process::exit(1);
        }
    }

    let server = match Server::bind(config, engine) {
        Ok(server) => server.with_shutdown(ShutdownHandle::from_flag(flag)),
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
