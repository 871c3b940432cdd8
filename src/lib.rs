//! # CinderKV
//!
//! A single-node, in-memory key-value store with:
//! - String and list values with lazy key expiration
//! - An append-only command log replayed on startup for durability
//! - One exclusive engine lock serializing every operation
//! - A line-based text protocol served by a bounded worker pool
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │        (accept loop → bounded queue → worker pool)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ request lines
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Dispatcher                                 │
//! │        (tokenize → command table → reply rendering)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ typed operations
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Engine                                   │
//! │                 (single Mutex)                               │
//! └──────────┬───────────────────────────────┬──────────────────┘
//!            │                               │
//!            ▼                               ▼
//!   ┌─────────────────┐             ┌─────────────────┐
//!   │    Keyspace     │             │       AOF       │
//!   │ strings / lists │             │  (append, then  │
//!   │  / expirations  │             │  replay on boot)│
//!   └─────────────────┘             └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod aof;
pub mod keyspace;
pub mod protocol;
pub mod dispatcher;
pub mod network;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CinderError, Result};
pub use config::Config;
pub use engine::{Engine, Ttl};
pub use dispatcher::Dispatcher;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of CinderKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
