//! Engine Module
//!
//! The storage engine that owns the keyspace and the append-only log.
//!
//! ## Responsibilities
//! - Serialize every operation behind one lock
//! - Expire keys lazily, the moment they are looked at
//! - Log each state change after applying it, before returning
//! - Rebuild state from the log on startup

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::aof::{AofRecovery, AofWriter, Record};
use crate::config::Config;
use crate::error::{CinderError, Result};
use crate::keyspace::{Keyspace, ValueKind};

/// Longest TTL accepted; larger values are clamped (about 100 years)
const MAX_EXPIRE_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;

/// Reply token for [`Engine::ping`]
const PONG: &str = "PONG";

/// Remaining lifetime of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Whole seconds left, rounded up
    Remaining(u64),

    /// The key exists and never expires
    Persistent,

    /// The key does not exist
    Missing,
}

impl Ttl {
    /// Wire form: seconds, `-1` for no expiration, `-2` for a missing key
    pub fn as_code(&self) -> i64 {
        match self {
            Ttl::Remaining(secs) => i64::try_from(*secs).unwrap_or(i64::MAX),
            Ttl::Persistent => -1,
            Ttl::Missing => -2,
        }
    }
}

/// The main storage engine
///
/// ## Concurrency Model: One Exclusive Lock
///
/// - Every public method takes `state` for its whole effect, including the
///   log write, and releases it before returning
/// - Composite operations (`incr` = read + `set`, `mset` = repeated `set`,
///   lazy expiry = `del` inside a read) call the unlocked `State` methods
///   under the one guard instead of re-locking
/// - Nothing here does network I/O, so the lock is never held across it
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Keyspace and log writer
    state: Mutex<State>,
}

/// Everything the engine lock protects
struct State {
    keyspace: Keyspace,

    /// `None` while replaying, or when running without durability
    aof: Option<AofWriter>,
}

impl Engine {
    /// Open an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Recover and replay the log if it exists
    /// 3. Open the log for appending
    ///
    /// Failing to read or open the log is not fatal: the engine warns and
    /// serves from memory only.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let mut state = State {
            keyspace: Keyspace::new(),
            aof: None,
        };

        if config.persistence {
            match Self::bootstrap(&config, &mut state) {
                Ok(writer) => state.aof = Some(writer),
                Err(e) => warn!(
                    "AOF unavailable at {}: {}; continuing without durability",
                    config.aof_path().display(),
                    e
                ),
            }
        }

        Ok(Self {
            config,
            state: Mutex::new(state),
        })
    }

    /// Open with a data directory (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Engine with no append-only log
    pub fn in_memory() -> Self {
        Self {
            config: Config::builder().persistence(false).build(),
            state: Mutex::new(State {
                keyspace: Keyspace::new(),
                aof: None,
            }),
        }
    }

    /// Replay the existing log into `state`, then open it for appending
    fn bootstrap(config: &Config, state: &mut State) -> Result<AofWriter> {
        fs::create_dir_all(&config.data_dir)?;
        let aof_path = config.aof_path();

        if aof_path.exists() {
            let (records, result) = AofRecovery::recover(&aof_path)?;

            if let Some(reason) = &result.stop_reason {
                warn!(
                    "AOF tail discarded ({} bytes, truncated={}): {}",
                    result.bytes_discarded, result.was_truncated, reason
                );
            }

            for record in records {
                if let Err(e) = state.apply(record) {
                    debug!("Skipping AOF record that no longer applies: {}", e);
                }
            }

            info!(
                "AOF replay: {} records, {} keys loaded",
                result.records_recovered,
                state.keyspace.len()
            );
        } else {
            info!("No AOF found at {}; starting empty", aof_path.display());
        }

        AofWriter::open(&aof_path, config.aof_sync_strategy)
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// Set `key` to `value`, replacing a list at the same key
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.state.lock().set(key, value)
    }

    /// Get the string at `key`
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.state.lock().get(key)
    }

    /// Delete `key` of either kind; true if it existed
    pub fn del(&self, key: &str) -> bool {
        self.state.lock().del(key)
    }

    /// Add one to the integer at `key` (absent counts as 0)
    pub fn incr(&self, key: &str) -> Result<i64> {
        self.state.lock().incr_by(key, 1)
    }

    /// Subtract one from the integer at `key` (absent counts as 0)
    pub fn decr(&self, key: &str) -> Result<i64> {
        self.state.lock().incr_by(key, -1)
    }

    /// Set each pair in order, each logged as its own `SET`
    pub fn mset(&self, pairs: &[(String, String)]) -> Result<()> {
        let mut state = self.state.lock();
        for (key, value) in pairs {
            state.set(key, value)?;
        }
        Ok(())
    }

    /// Get several keys; missing keys and list keys come back as `None`
    pub fn mget<S: AsRef<str>>(&self, keys: &[S]) -> Vec<Option<String>> {
        let mut state = self.state.lock();
        keys.iter()
            .map(|key| state.get(key.as_ref()).ok().flatten())
            .collect()
    }

    // =========================================================================
    // Expiration
    // =========================================================================

    /// Expire `key` after `seconds`; false if the key does not exist
    pub fn expire(&self, key: &str, seconds: i64) -> bool {
        self.state.lock().expire(key, seconds)
    }

    /// Remaining lifetime of `key`
    pub fn ttl(&self, key: &str) -> Ttl {
        self.state.lock().ttl(key)
    }

    /// Remove the expiration of `key`; true if one was removed
    pub fn persist(&self, key: &str) -> bool {
        self.state.lock().persist(key)
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// Push `value` onto the front of the list at `key`
    pub fn lpush(&self, key: &str, value: &str) -> Result<()> {
        self.state.lock().lpush(key, value)
    }

    /// Push `value` onto the back of the list at `key`
    pub fn rpush(&self, key: &str, value: &str) -> Result<()> {
        self.state.lock().rpush(key, value)
    }

    /// Pop the first element of the list at `key`
    pub fn lpop(&self, key: &str) -> Result<Option<String>> {
        self.state.lock().lpop(key)
    }

    /// Pop the last element of the list at `key`
    pub fn rpop(&self, key: &str) -> Result<Option<String>> {
        self.state.lock().rpop(key)
    }

    /// Elements `start..=stop` of the list at `key`
    pub fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        self.state.lock().lrange(key, start, stop)
    }

    // =========================================================================
    // Misc
    // =========================================================================

    /// Liveness check
    pub fn ping(&self) -> &'static str {
        PONG
    }

    /// Force the log to disk
    pub fn sync(&self) -> Result<()> {
        match self.state.lock().aof.as_mut() {
            Some(aof) => aof.sync(),
            None => Ok(()),
        }
    }

    /// Close the engine gracefully, syncing the log
    pub fn close(self) -> Result<()> {
        self.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Kind of value at `key`, if it exists
    pub fn kind(&self, key: &str) -> Option<ValueKind> {
        self.state.lock().kind(key)
    }

    /// Whether mutations are currently being logged
    pub fn is_durable(&self) -> bool {
        self.state.lock().aof.is_some()
    }

    /// Number of keys held, including elapsed ones not yet purged
    pub fn key_count(&self) -> usize {
        self.state.lock().keyspace.len()
    }

    /// Records appended to the log since the engine opened
    pub fn records_written(&self) -> u64 {
        self.state
            .lock()
            .aof
            .as_ref()
            .map_or(0, AofWriter::records_written)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl State {
    /// Purge `key` if its deadline has passed, logging the implicit `DEL`
    fn resolve(&mut self, key: &str) {
        self.resolve_at(key, Instant::now());
    }

    fn resolve_at(&mut self, key: &str, now: Instant) {
        if self.keyspace.purge_if_expired(key, now) {
            debug!("Key {} expired", key);
            self.log(Record::Del { key: key.to_string() });
        }
    }

    /// Append a record; on failure fall back to memory-only operation
    fn log(&mut self, record: Record) {
        let Some(aof) = self.aof.as_mut() else {
            return;
        };

        if let Err(e) = aof.append(&record) {
            error!(
                "AOF append to {} failed: {}; continuing without durability",
                aof.path().display(),
                e
            );
            self.aof = None;
        }
    }

    /// Re-run a logged mutation
    fn apply(&mut self, record: Record) -> Result<()> {
        match record {
            Record::Set { key, value } => self.set(&key, &value),
            Record::Del { key } => {
                self.del(&key);
                Ok(())
            }
            Record::Expire { key, seconds } => {
                self.expire(&key, seconds);
                Ok(())
            }
            Record::Persist { key } => {
                self.persist(&key);
                Ok(())
            }
            Record::LPush { key, value } => self.lpush(&key, &value),
            Record::RPush { key, value } => self.rpush(&key, &value),
            Record::LPop { key } => self.lpop(&key).map(|_| ()),
            Record::RPop { key } => self.rpop(&key).map(|_| ()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        check_entry(key, value)?;
        self.resolve(key);
        self.keyspace.set(key, value);
        self.log(Record::Set {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<String>> {
        self.resolve(key);
        Ok(self.keyspace.get(key)?.map(str::to_string))
    }

    fn del(&mut self, key: &str) -> bool {
        self.resolve(key);
        let existed = self.keyspace.remove(key);
        if existed {
            self.log(Record::Del { key: key.to_string() });
        }
        existed
    }

    fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64> {
        let current = match self.get(key)? {
            Some(value) => value.parse::<i64>().map_err(|_| CinderError::NotAnInteger)?,
            None => 0,
        };
        let next = current.checked_add(delta).ok_or(CinderError::NotAnInteger)?;
        self.set(key, &next.to_string())?;
        Ok(next)
    }

    fn expire(&mut self, key: &str, seconds: i64) -> bool {
        self.resolve(key);

        let now = Instant::now();
        let secs = seconds.clamp(0, MAX_EXPIRE_SECONDS) as u64;
        let deadline = now + Duration::from_secs(secs);

        let applied = self.keyspace.set_expiration(key, deadline);
        if applied {
            self.log(Record::Expire {
                key: key.to_string(),
                seconds,
            });
        }
        applied
    }

    fn ttl(&mut self, key: &str) -> Ttl {
        let now = Instant::now();
        self.resolve_at(key, now);

        if !self.keyspace.contains(key) {
            return Ttl::Missing;
        }

        match self.keyspace.expiration(key) {
            Some(deadline) => {
                // Not purged at `now`, so `left` is non-zero.
                let left = deadline.saturating_duration_since(now);
                Ttl::Remaining(left.as_secs() + u64::from(left.subsec_nanos() > 0))
            }
            None => Ttl::Persistent,
        }
    }

    fn persist(&mut self, key: &str) -> bool {
        self.resolve(key);
        let removed = self.keyspace.remove_expiration(key);
        if removed {
            self.log(Record::Persist { key: key.to_string() });
        }
        removed
    }

    fn lpush(&mut self, key: &str, value: &str) -> Result<()> {
        check_entry(key, value)?;
        self.resolve(key);
        self.keyspace.push_front(key, value)?;
        self.log(Record::LPush {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn rpush(&mut self, key: &str, value: &str) -> Result<()> {
        check_entry(key, value)?;
        self.resolve(key);
        self.keyspace.push_back(key, value)?;
        self.log(Record::RPush {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn lpop(&mut self, key: &str) -> Result<Option<String>> {
        self.resolve(key);
        let value = self.keyspace.pop_front(key)?;
        if value.is_some() {
            self.log(Record::LPop { key: key.to_string() });
        }
        Ok(value)
    }

    fn rpop(&mut self, key: &str) -> Result<Option<String>> {
        self.resolve(key);
        let value = self.keyspace.pop_back(key)?;
        if value.is_some() {
            self.log(Record::RPop { key: key.to_string() });
        }
        Ok(value)
    }

    fn lrange(&mut self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        self.resolve(key);
        self.keyspace.range(key, start, stop)
    }

    fn kind(&mut self, key: &str) -> Option<ValueKind> {
        self.resolve(key);
        self.keyspace.kind(key)
    }
}

/// Keys and values must survive a trip through the whitespace tokenizer
fn check_entry(key: &str, value: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CinderError::EmptyKey);
    }
    for token in [key, value] {
        if token.is_empty() || token.contains(char::is_whitespace) {
            return Err(CinderError::InvalidToken(token.to_string()));
        }
    }
    Ok(())
}
