//! Configuration for CinderKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{CinderError, Result};

/// Main configuration for a CinderKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Persistence Configuration
    // -------------------------------------------------------------------------
    /// Root directory for data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── appendonly.aof   (append-only command log)
    pub data_dir: PathBuf,

    /// Whether mutations are recorded to the append-only log at all
    pub persistence: bool,

    /// Sync strategy: how often to fsync the append-only log
    pub aof_sync_strategy: AofSyncStrategy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Number of worker threads serving connections
    pub worker_threads: usize,

    /// Accepted connections allowed to wait for a free worker
    pub max_pending_connections: usize,

    /// Close a connection after this much silence (milliseconds, 0 = never)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// AOF sync strategy
///
/// Every record is handed to the OS before `append` returns; the strategy
/// only decides when the file is additionally fsynced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AofSyncStrategy {
    /// fsync after every record (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced records
    EveryNRecords { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./cinderkv_data"),
            persistence: true,
            aof_sync_strategy: AofSyncStrategy::EveryNRecords { count: 100 },
            listen_addr: "127.0.0.1:6379".to_string(),
            worker_threads: 4,
            max_pending_connections: 1024,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Name of the append-only log inside `data_dir`
    pub const AOF_FILENAME: &'static str = "appendonly.aof";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Full path of the append-only log
    pub fn aof_path(&self) -> PathBuf {
        self.data_dir.join(Self::AOF_FILENAME)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(CinderError::Config(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        if self.max_pending_connections == 0 {
            return Err(CinderError::Config(
                "max_pending_connections must be at least 1".to_string(),
            ));
        }
        if let AofSyncStrategy::EveryNRecords { count: 0 } = self.aof_sync_strategy {
            return Err(CinderError::Config(
                "sync count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Enable or disable the append-only log
    pub fn persistence(mut self, enabled: bool) -> Self {
        self.config.persistence = enabled;
        self
    }

    /// Set the AOF sync strategy
    pub fn aof_sync_strategy(mut self, strategy: AofSyncStrategy) -> Self {
        self.config.aof_sync_strategy = strategy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the capacity of the pending-connection queue
    pub fn max_pending_connections(mut self, count: usize) -> Self {
        self.config.max_pending_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
