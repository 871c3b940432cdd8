//! AOF Reader
//!
//! Reads records back from the log file in order.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{CinderError, Result};
use super::Record;

/// Reads records from the AOF
pub struct AofReader {
    /// Buffered log file
    reader: BufReader<File>,

    /// Byte offset just past the last record returned (or blank line skipped)
    valid_offset: u64,

    /// 1-based number of the line most recently read
    line_number: u64,
}

impl AofReader {
    /// Open a log file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;

        Ok(Self {
            reader: BufReader::new(file),
            valid_offset: 0,
            line_number: 0,
        })
    }

    /// Read the next record
    ///
    /// Returns `Ok(None)` at a clean end of file. A line that is unterminated,
    /// not UTF-8, or not a loggable command fails with `MalformedRecord`;
    /// [`valid_offset`](Self::valid_offset) still points at the end of the
    /// last good record.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = self.reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            if buf.last() != Some(&b'\n') {
                return Err(CinderError::MalformedRecord(format!(
                    "line {}: unterminated record ({} bytes)",
                    self.line_number, read
                )));
            }

            let line = std::str::from_utf8(&buf).map_err(|_| {
                CinderError::MalformedRecord(format!("line {}: invalid UTF-8", self.line_number))
            })?;

            if line.trim().is_empty() {
                self.valid_offset += read as u64;
                continue;
            }

            let record = Record::parse(line).map_err(|e| {
                CinderError::MalformedRecord(format!("line {}: {}", self.line_number, e))
            })?;

            self.valid_offset += read as u64;
            return Ok(Some(record));
        }
    }

    /// Byte offset of the end of the last good record
    pub fn valid_offset(&self) -> u64 {
        self.valid_offset
    }

    /// Number of lines read so far
    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}
