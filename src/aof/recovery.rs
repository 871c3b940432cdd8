//! AOF Recovery
//!
//! Reads every usable record and repairs a damaged tail.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{CinderError, Result};
use super::{AofReader, Record};

/// Handles AOF recovery on startup
pub struct AofRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of records successfully recovered
    pub records_recovered: u64,

    /// Bytes after the last good record that were (or would be) dropped
    pub bytes_discarded: u64,

    /// Whether the file was cut back to the last good record
    pub was_truncated: bool,

    /// Why reading stopped early, if it did
    pub stop_reason: Option<String>,
}

impl AofRecovery {
    /// Recover records from a log file
    ///
    /// This will:
    /// 1. Read records in order until end of file or the first bad line
    /// 2. Truncate the file to the end of the last good record if a bad
    ///    line was found, so later appends stay reachable
    /// 3. Return the good records in order
    pub fn recover(path: &Path) -> Result<(Vec<Record>, RecoveryResult)> {
        let (records, mut result) = Self::scan(path)?;

        if result.bytes_discarded > 0 {
            let file = OpenOptions::new().write(true).open(path)?;
            let keep = file.metadata()?.len() - result.bytes_discarded;
            file.set_len(keep)?;
            file.sync_all()?;
            result.was_truncated = true;
        }

        Ok((records, result))
    }

    /// Verify integrity of a log file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let (_, result) = Self::scan(path)?;
        Ok(result)
    }

    fn scan(path: &Path) -> Result<(Vec<Record>, RecoveryResult)> {
        let file_len = std::fs::metadata(path)?.len();
        let mut reader = AofReader::open(path)?;
        let mut records = Vec::new();
        let mut result = RecoveryResult::default();

        loop {
            match reader.next_record() {
                Ok(Some(record)) => records.push(record),
                Ok(None) => break,
                Err(CinderError::MalformedRecord(reason)) => {
                    result.stop_reason = Some(reason);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        result.records_recovered = records.len() as u64;
        result.bytes_discarded = file_len.saturating_sub(reader.valid_offset());

        Ok((records, result))
    }
}
