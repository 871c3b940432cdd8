//! Worker Pool
//!
//! A fixed set of threads pulling accepted connections off a bounded queue.

use std::net::TcpStream;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender, TrySendError};
use tracing::{debug, warn};

use crate::error::Result;

/// Work done for each accepted connection
pub type ConnectionHandler = Arc<dyn Fn(TcpStream) + Send + Sync>;

/// Fixed-size pool serving one connection per worker at a time
pub struct WorkerPool {
    /// Queue of accepted connections waiting for a worker
    sender: Option<Sender<TcpStream>>,

    /// Worker threads
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers sharing a queue of `capacity` pending connections
    pub fn new(size: usize, capacity: usize, handler: ConnectionHandler) -> Result<Self> {
        let (sender, receiver) = channel::bounded::<TcpStream>(capacity);

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let receiver = receiver.clone();
            let handler = Arc::clone(&handler);

            let worker = thread::Builder::new()
                .name(format!("cinderkv-worker-{}", id))
                .spawn(move || {
                    // Ends once the pool drops its sender and the queue drains.
                    for stream in receiver.iter() {
                        handler(stream);
                    }
                    debug!("Worker {} exiting", id);
                })?;
            workers.push(worker);
        }

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Queue a connection; hands it back if the queue is full or closed
    pub fn try_submit(&self, stream: TcpStream) -> std::result::Result<(), TcpStream> {
        let Some(sender) = &self.sender else {
            return Err(stream);
        };

        sender.try_send(stream).map_err(|e| match e {
            TrySendError::Full(stream) | TrySendError::Disconnected(stream) => stream,
        })
    }

    /// Number of worker threads
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Close the queue and wait for every worker to finish
    pub fn shutdown(mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("Worker thread panicked");
            }
        }
    }
}
