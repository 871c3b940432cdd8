//! Keyspace implementation
//!
//! HashMap-backed tables with no locking of their own.

use std::collections::{HashMap, VecDeque};
use std::ops::Range;
use std::time::Instant;

use crate::error::{CinderError, Result};
use super::ValueKind;

/// String, list, and expiration tables for every live key
#[derive(Debug, Default)]
pub struct Keyspace {
    strings: HashMap<String, String>,
    lists: HashMap<String, VecDeque<String>>,
    expirations: HashMap<String, Instant>,
}

impl Keyspace {
    /// Create an empty keyspace
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Keys and Expiration
    // =========================================================================

    /// Kind of value at `key`, if any (expiration is not consulted)
    pub fn kind(&self, key: &str) -> Option<ValueKind> {
        if self.strings.contains_key(key) {
            Some(ValueKind::String)
        } else if self.lists.contains_key(key) {
            Some(ValueKind::List)
        } else {
            None
        }
    }

    /// Whether `key` holds a value of either kind
    pub fn contains(&self, key: &str) -> bool {
        self.kind(key).is_some()
    }

    /// Whether `key` has a deadline at or before `now`
    pub fn is_expired(&self, key: &str, now: Instant) -> bool {
        self.expirations
            .get(key)
            .map_or(false, |deadline| *deadline <= now)
    }

    /// Remove `key` entirely if its deadline has passed
    ///
    /// Returns true when something was purged.
    pub fn purge_if_expired(&mut self, key: &str, now: Instant) -> bool {
        if self.is_expired(key, now) {
            self.remove(key);
            true
        } else {
            false
        }
    }

    /// Remove `key` from every table; true if a value existed
    pub fn remove(&mut self, key: &str) -> bool {
        let had_string = self.strings.remove(key).is_some();
        let had_list = self.lists.remove(key).is_some();
        self.expirations.remove(key);
        had_string || had_list
    }

    /// Set a deadline for an existing key; false if the key is absent
    pub fn set_expiration(&mut self, key: &str, deadline: Instant) -> bool {
        if !self.contains(key) {
            return false;
        }
        self.expirations.insert(key.to_string(), deadline);
        true
    }

    /// Drop the deadline for `key`; true if there was one
    pub fn remove_expiration(&mut self, key: &str) -> bool {
        self.expirations.remove(key).is_some()
    }

    /// Deadline for `key`, if any
    pub fn expiration(&self, key: &str) -> Option<Instant> {
        self.expirations.get(key).copied()
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// Get the string at `key`
    pub fn get(&self, key: &str) -> Result<Option<&str>> {
        match self.strings.get(key) {
            Some(value) => Ok(Some(value.as_str())),
            None if self.lists.contains_key(key) => Err(CinderError::WrongType),
            None => Ok(None),
        }
    }

    /// Store a string, replacing a list at the same key
    ///
    /// A deadline already set on the key is left in place.
    pub fn set(&mut self, key: &str, value: &str) {
        self.lists.remove(key);
        self.strings.insert(key.to_string(), value.to_string());
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// Push to the front, creating the list; returns the new length
    pub fn push_front(&mut self, key: &str, value: &str) -> Result<usize> {
        let list = self.list_for_push(key)?;
        list.push_front(value.to_string());
        Ok(list.len())
    }

    /// Push to the back, creating the list; returns the new length
    pub fn push_back(&mut self, key: &str, value: &str) -> Result<usize> {
        let list = self.list_for_push(key)?;
        list.push_back(value.to_string());
        Ok(list.len())
    }

    /// Pop from the front; an emptied list is removed with its deadline
    pub fn pop_front(&mut self, key: &str) -> Result<Option<String>> {
        self.pop_with(key, VecDeque::pop_front)
    }

    /// Pop from the back; an emptied list is removed with its deadline
    pub fn pop_back(&mut self, key: &str) -> Result<Option<String>> {
        self.pop_with(key, VecDeque::pop_back)
    }

    /// Elements `start..=stop` (negative indices count from the end)
    pub fn range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        if self.strings.contains_key(key) {
            return Err(CinderError::WrongType);
        }

        let Some(list) = self.lists.get(key) else {
            return Ok(Vec::new());
        };

        Ok(normalize_range(list.len(), start, stop)
            .map(|range| list.range(range).cloned().collect())
            .unwrap_or_default())
    }

    /// Length of the list at `key` (0 when absent)
    pub fn list_len(&self, key: &str) -> usize {
        self.lists.get(key).map_or(0, VecDeque::len)
    }

    fn list_for_push(&mut self, key: &str) -> Result<&mut VecDeque<String>> {
        if self.strings.contains_key(key) {
            return Err(CinderError::WrongType);
        }
        Ok(self.lists.entry(key.to_string()).or_default())
    }

    fn pop_with(
        &mut self,
        key: &str,
        pop: fn(&mut VecDeque<String>) -> Option<String>,
    ) -> Result<Option<String>> {
        if self.strings.contains_key(key) {
            return Err(CinderError::WrongType);
        }

        let Some(list) = self.lists.get_mut(key) else {
            return Ok(None);
        };

        let value = pop(list);
        if list.is_empty() {
            self.lists.remove(key);
            self.expirations.remove(key);
        }

        Ok(value)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of live keys of either kind
    pub fn len(&self) -> usize {
        self.strings.len() + self.lists.len()
    }

    /// Whether no key holds a value
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys with a deadline
    pub fn expiration_count(&self) -> usize {
        self.expirations.len()
    }
}

/// Resolve inclusive, possibly negative bounds against a length
///
/// Negative indices count from the end. Bounds are clamped to the list, and
/// `None` means the range is empty.
pub fn normalize_range(len: usize, start: i64, stop: i64) -> Option<Range<usize>> {
    let len = i64::try_from(len).ok()?;

    let mut start = if start < 0 { start.saturating_add(len) } else { start };
    let mut stop = if stop < 0 { stop.saturating_add(len) } else { stop };

    if start < 0 {
        start = 0;
    }
    if stop >= len {
        stop = len - 1;
    }
    if start > stop {
        return None;
    }

    Some(start as usize..stop as usize + 1)
}
