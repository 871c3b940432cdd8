//! Append-Only File (AOF) Module
//!
//! Provides durability by logging every state change as a text record.
//!
//! ## Responsibilities
//! - Append one record per mutation, after it is applied in memory
//! - Replay records in file order on startup
//! - Detect a torn or garbled tail and cut the file back to the last good record
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ SET user:1 alice\n                      │
//! │ LPUSH queue job-7\n                     │
//! │ EXPIRE user:1 60\n                      │
//! │ DEL user:1\n                            │
//! │ ...                                     │
//! └─────────────────────────────────────────┘
//! ```
//! No header, no checksum, no length prefix. Each line is a mutating command
//! in wire syntax.

mod record;
mod writer;
mod reader;
mod recovery;

pub use record::Record;
pub use writer::AofWriter;
pub use reader::AofReader;
pub use recovery::{AofRecovery, RecoveryResult};
