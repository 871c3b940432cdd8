//! AOF record definitions
//!
//! A record is a mutating command in the same text form clients send.

use std::fmt;

use crate::error::{CinderError, Result};
use crate::protocol::{parse_request, Command};

/// One logged mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Set { key: String, value: String },
    Del { key: String },
    Expire { key: String, seconds: i64 },
    Persist { key: String },
    LPush { key: String, value: String },
    RPush { key: String, value: String },
    LPop { key: String },
    RPop { key: String },
}

impl Record {
    /// Parse one log line (without its terminator)
    ///
    /// Uses the request tokenizer, so anything a client could not have sent
    /// is rejected. Only the verbs the engine writes are accepted.
    pub fn parse(line: &str) -> Result<Self> {
        let command = parse_request(line)
            .map_err(|e| CinderError::MalformedRecord(format!("{:?}: {}", line, e)))?;

        match command {
            Command::Set { key, value } => Ok(Record::Set { key, value }),
            Command::Del { key } => Ok(Record::Del { key }),
            Command::Expire { key, seconds } => Ok(Record::Expire { key, seconds }),
            Command::Persist { key } => Ok(Record::Persist { key }),
            Command::LPush { key, value } => Ok(Record::LPush { key, value }),
            Command::RPush { key, value } => Ok(Record::RPush { key, value }),
            Command::LPop { key } => Ok(Record::LPop { key }),
            Command::RPop { key } => Ok(Record::RPop { key }),
            other => Err(CinderError::MalformedRecord(format!(
                "{} is not a loggable command",
                other.command_type().name()
            ))),
        }
    }

    /// The key this record touches
    pub fn key(&self) -> &str {
        match self {
            Record::Set { key, .. }
            | Record::Del { key }
            | Record::Expire { key, .. }
            | Record::Persist { key }
            | Record::LPush { key, .. }
            | Record::RPush { key, .. }
            | Record::LPop { key }
            | Record::RPop { key } => key,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Set { key, value } => write!(f, "SET {} {}", key, value),
            Record::Del { key } => write!(f, "DEL {}", key),
            Record::Expire { key, seconds } => write!(f, "EXPIRE {} {}", key, seconds),
            Record::Persist { key } => write!(f, "PERSIST {}", key),
            Record::LPush { key, value } => write!(f, "LPUSH {} {}", key, value),
            Record::RPush { key, value } => write!(f, "RPUSH {} {}", key, value),
            Record::LPop { key } => write!(f, "LPOP {}", key),
            Record::RPop { key } => write!(f, "RPOP {}", key),
        }
    }
}
