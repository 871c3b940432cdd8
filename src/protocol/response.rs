//! Response definitions
//!
//! Represents replies to clients.

use crate::error::CinderError;

/// Token rendered for an absent value
pub const NIL: &str = "(nil)";

/// A reply to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Fixed acknowledgement such as `OK` or `PONG`
    Status(&'static str),

    /// A single value, or `(nil)` when absent
    Value(Option<String>),

    /// Decimal integer (counts, TTLs, 1/0 booleans)
    Integer(i64),

    /// One line per element, in order; absent elements render as `(nil)`
    Lines(Vec<Option<String>>),

    /// `ERR ...` line; the connection stays open
    Error(String),

    /// Reply to `QUIT`; the transport closes the connection after sending it
    Bye,
}

impl Response {
    /// Create an OK response
    pub fn ok() -> Self {
        Response::Status("OK")
    }

    /// Create a `(nil)` response
    pub fn nil() -> Self {
        Response::Value(None)
    }

    /// Render a boolean as `1` / `0`
    pub fn boolean(value: bool) -> Self {
        Response::Integer(i64::from(value))
    }

    /// Create an ERROR response from an error
    pub fn error(err: &CinderError) -> Self {
        Response::Error(err.to_client_error())
    }

    /// Whether the transport should close the connection after this reply
    pub fn closes_connection(&self) -> bool {
        matches!(self, Response::Bye)
    }

    /// The reply as a list of lines (without CRLF)
    pub fn lines(&self) -> Vec<String> {
        match self {
            Response::Status(status) => vec![status.to_string()],
            Response::Value(value) => vec![value.clone().unwrap_or_else(|| NIL.to_string())],
            Response::Integer(n) => vec![n.to_string()],
            Response::Lines(items) => items
                .iter()
                .map(|item| item.clone().unwrap_or_else(|| NIL.to_string()))
                .collect(),
            Response::Error(message) => vec![message.clone()],
            Response::Bye => vec!["BYE".to_string()],
        }
    }
}
