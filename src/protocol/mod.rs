//! Protocol Module
//!
//! Defines the line-based text protocol for client-server communication.
//!
//! ## Request Format
//! ```text
//! VERB arg1 arg2 ...\r\n
//! ```
//! One command per line. The line is trimmed, split on whitespace, and
//! empty tokens are dropped. Verbs are case-insensitive.
//!
//! ## Reply Format
//! Every reply line ends in `\r\n`:
//! - `OK`, `PONG`, `BYE`: fixed acknowledgements
//! - `<value>` or `(nil)`: single values
//! - `<integer>`: counts, booleans (`1`/`0`), TTLs, counters
//! - one line per element for `MGET` and `LRANGE`
//! - `ERR <message>`: request errors; the connection stays open

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, NIL};
pub use codec::{
    tokenize, parse_request, encode_response, read_request, write_response, MAX_LINE_LEN,
};
