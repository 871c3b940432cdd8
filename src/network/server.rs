//! TCP Server
//!
//! Accepts connections and hands them to the worker pool.

use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::engine::Engine;
use crate::error::{CinderError, Result};
use crate::protocol::{write_response, Response};
use super::connection::Connection;
use super::pool::{ConnectionHandler, WorkerPool};

/// Pause between accept attempts while no client is waiting
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Cloneable flag that stops a running server
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Create a handle in the running state
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing flag (e.g. one registered with a signal handler)
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    /// Ask the server and its connections to stop
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// TCP server for CinderKV
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Bind the listening socket from `config.listen_addr`
    ///
    /// Port 0 picks a free port; see [`Server::local_addr`].
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(config.listen_addr.as_str()).map_err(|e| {
            CinderError::Config(format!("cannot listen on {}: {}", config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: ShutdownHandle::new(),
        })
    }

    /// Use an externally owned shutdown flag
    pub fn with_shutdown(mut self, shutdown: ShutdownHandle) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Address the server is actually listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops [`Server::run`] from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Serve clients until shutdown is requested (blocking)
    ///
    /// On return every worker has finished and the log has been synced.
    pub fn run(self) -> Result<()> {
        let addr = self.local_addr()?;
        info!(
            "Listening on {} ({} workers, queue {})",
            addr, self.config.worker_threads, self.config.max_pending_connections
        );

        let pool = WorkerPool::new(
            self.config.worker_threads,
            self.config.max_pending_connections,
            self.connection_handler(),
        )?;

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!("Accepted connection from {}", peer);
                    if let Err(e) = stream.set_nonblocking(false) {
                        warn!("Dropping connection from {}: {}", peer, e);
                        continue;
                    }
                    if let Err(stream) = pool.try_submit(stream) {
                        warn!("Rejecting {}: connection queue is full", peer);
                        reject_busy(stream);
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    // Transient failures such as EMFILE must not kill the server.
                    error!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        info!("Shutting down, waiting for {} workers", pool.size());
        pool.shutdown();

        if let Err(e) = self.engine.sync() {
            error!("Final sync failed: {}", e);
        }
        info!("Server stopped");

        Ok(())
    }

    fn connection_handler(&self) -> ConnectionHandler {
        let dispatcher = Dispatcher::new(Arc::clone(&self.engine));
        let shutdown = self.shutdown.clone();
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        Arc::new(move |stream: TcpStream| {
            let result = Connection::new(stream, dispatcher.clone(), shutdown.clone())
                .and_then(|mut conn| {
                    conn.set_timeouts(read_ms, write_ms)?;
                    conn.handle()
                });
            if let Err(e) = result {
                warn!("Connection ended with error: {}", e);
            }
        })
    }
}

/// Tell a client there is no room and close its socket
fn reject_busy(mut stream: TcpStream) {
    let reply = Response::error(&CinderError::ServerBusy);
    if let Err(e) = write_response(&mut stream, &reply) {
        debug!("Could not send busy reply: {}", e);
    }
    let _ = stream.flush();
}
