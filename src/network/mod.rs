//! Network Module
//!
//! TCP server, connection handling, and a blocking client.
//!
//! ## Architecture
//! - Single non-blocking acceptor thread
//! - Bounded queue feeding a fixed worker pool
//! - Commands routed through the Dispatcher

mod client;
mod connection;
mod pool;
mod server;

pub use client::Client;
pub use connection::Connection;
pub use pool::{ConnectionHandler, WorkerPool};
pub use server::{Server, ShutdownHandle};
