//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use crate::dispatcher::Dispatcher;
use crate::error::{CinderError, Result};
use crate::protocol::{read_request, write_response, Response};
use super::ShutdownHandle;

/// How often a blocked read wakes up to check for shutdown
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Command dispatcher over the shared engine
    dispatcher: Dispatcher,

    /// Server-wide shutdown flag
    shutdown: ShutdownHandle,

    /// Close the connection after this much silence (`None` = never)
    idle_timeout: Option<Duration>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O and the shutdown poll interval
    pub fn new(stream: TcpStream, dispatcher: Dispatcher, shutdown: ShutdownHandle) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(POLL_INTERVAL))?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            dispatcher,
            shutdown,
            idle_timeout: None,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 disables)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        self.idle_timeout = (read_ms > 0).then(|| Duration::from_millis(read_ms));

        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads request lines in a loop and sends replies.
    /// Returns when the client quits or disconnects, the connection idles
    /// out, the server shuts down, or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let mut buf = Vec::new();
        let mut last_activity = Instant::now();

        loop {
            let line = match read_request(&mut self.reader, &mut buf) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(CinderError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    // Poll tick: Windows reports TimedOut, Unix WouldBlock
                    if self.shutdown.is_shutdown() {
                        tracing::debug!("Closing {} for shutdown", self.peer_addr);
                        return Ok(());
                    }
                    if let Some(idle) = self.idle_timeout {
                        if last_activity.elapsed() >= idle {
                            tracing::debug!("Read timeout for client {}", self.peer_addr);
                            return Ok(());
                        }
                    }
                    continue;
                }
                Err(CinderError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Connection reset by client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e @ CinderError::RequestTooLong { .. }) => {
                    tracing::debug!("Oversized request from {}", self.peer_addr);
                    // Rest of the line is still unread: reply and hang up.
                    let _ = self.send_response(&Response::error(&e));
                    return Ok(());
                }
                Err(e @ CinderError::Protocol(_)) => {
                    self.reply(&Response::error(&e))?;
                    last_activity = Instant::now();
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            last_activity = Instant::now();
            tracing::trace!("Received from {}: {:?}", self.peer_addr, line.trim_end());

            let response = self.dispatcher.dispatch(&line);

            if !self.reply(&response)? {
                return Ok(());
            }

            if response.closes_connection() {
                tracing::debug!("Client {} quit", self.peer_addr);
                return Ok(());
            }
        }
    }

    /// Send a reply; `Ok(false)` means the client is already gone
    fn reply(&mut self, response: &Response) -> Result<bool> {
        match self.send_response(response) {
            Ok(()) => Ok(true),
            Err(CinderError::Io(ref e)) if is_disconnect(e.kind()) => {
                // The client disconnected before we could send the reply.
                tracing::debug!(
                    "Client {} disconnected before reply could be sent: {}",
                    self.peer_addr,
                    e
                );
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                Err(e)
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: &Response) -> Result<()> {
        write_response(&mut self.writer, response)
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
    )
}
