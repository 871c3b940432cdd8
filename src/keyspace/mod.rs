//! Keyspace Module
//!
//! The in-memory tables behind the engine.
//!
//! ## Responsibilities
//! - String values, list values, and expiration deadlines per key
//! - Keep a key in at most one of the string and list tables
//! - Never leave an expiration behind for a key that is gone
//!
//! ## Data Structure Choice
//! Plain `HashMap`s with `VecDeque` for lists:
//! - O(1) push/pop at both ends
//! - No internal locking; the engine holds the only lock
//! - Expiration is checked lazily by the caller with an explicit `now`

mod table;

pub use table::{normalize_range, Keyspace};

/// Kind of value held at a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A scalar string
    String,

    /// A double-ended list of strings
    List,
}
