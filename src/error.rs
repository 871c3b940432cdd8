//! Error types for CinderKV
//!
//! Provides a unified error type for all operations, plus the mapping from
//! client-facing errors to their wire text.

use thiserror::Error;

/// Result type alias using CinderError
pub type Result<T> = std::result::Result<T, CinderError>;

/// Unified error type for CinderKV operations
#[derive(Debug, Error)]
pub enum CinderError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("no command given")]
    EmptyCommand,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("wrong number of arguments for '{command}'")]
    WrongArity { command: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("request line longer than {limit} bytes")]
    RequestTooLong { limit: usize },

    #[error("connection queue is full")]
    ServerBusy,

    // -------------------------------------------------------------------------
    // Keyspace Errors
    // -------------------------------------------------------------------------
    #[error("value is not an integer")]
    NotAnInteger,

    #[error("operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("key must not be empty")]
    EmptyKey,

    #[error("argument {0:?} contains whitespace")]
    InvalidToken(String),

    // -------------------------------------------------------------------------
    // Append Log Errors
    // -------------------------------------------------------------------------
    #[error("malformed AOF record: {0}")]
    MalformedRecord(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CinderError {
    /// Render the error as the reply line a client sees (without CRLF)
    pub fn to_client_error(&self) -> String {
        match self {
            CinderError::EmptyCommand => "ERR no command given".to_string(),
            // The wire reply for unknown verbs never echoes the verb back.
            CinderError::UnknownCommand(_) => "ERR unknown command".to_string(),
            CinderError::WrongArity { command } => {
                format!("ERR wrong number of arguments for '{}'", command)
            }
            CinderError::Protocol(msg) => format!("ERR protocol error: {}", msg),
            CinderError::RequestTooLong { .. } => "ERR request line too long".to_string(),
            CinderError::ServerBusy => "ERR max number of clients reached".to_string(),
            CinderError::NotAnInteger => "ERR value is not an integer".to_string(),
            CinderError::WrongType => {
                "ERR operation against a key holding the wrong kind of value".to_string()
            }
            CinderError::EmptyKey => "ERR key must not be empty".to_string(),
            CinderError::InvalidToken(_) => "ERR argument contains whitespace".to_string(),
            _ => "ERR internal server error".to_string(),
        }
    }

    /// Whether the error was caused by the client rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CinderError::EmptyCommand
                | CinderError::UnknownCommand(_)
                | CinderError::WrongArity { .. }
                | CinderError::Protocol(_)
                | CinderError::RequestTooLong { .. }
                | CinderError::NotAnInteger
                | CinderError::WrongType
                | CinderError::EmptyKey
                | CinderError::InvalidToken(_)
        )
    }
}
