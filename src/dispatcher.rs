//! Dispatcher Module
//!
//! Turns request lines into engine calls and engine results into replies.
//! Nothing a client sends can make dispatch fail: every problem becomes an
//! `ERR` reply.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::engine::Engine;
use crate::error::{CinderError, Result};
use crate::protocol::{parse_request, Command, Response};

/// Routes commands to the engine
#[derive(Clone)]
pub struct Dispatcher {
    engine: Arc<Engine>,
}

impl Dispatcher {
    /// Create a dispatcher over a shared engine
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Handle one raw request line
    pub fn dispatch(&self, line: &str) -> Response {
        match parse_request(line) {
            Ok(command) => self.execute(command),
            Err(e) => Self::reject(e),
        }
    }

    /// Execute a parsed command
    pub fn execute(&self, command: Command) -> Response {
        trace!("Executing {:?}", command);
        match self.run(command) {
            Ok(response) => response,
            Err(e) => Self::reject(e),
        }
    }

    /// The engine this dispatcher drives
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    fn run(&self, command: Command) -> Result<Response> {
        let engine = &self.engine;

        let response = match command {
            Command::Set { key, value } => {
                engine.set(&key, &value)?;
                Response::ok()
            }
            Command::Get { key } => Response::Value(engine.get(&key)?),
            Command::Del { key } => Response::boolean(engine.del(&key)),
            Command::Incr { key } => Response::Integer(engine.incr(&key)?),
            Command::Decr { key } => Response::Integer(engine.decr(&key)?),
            Command::Expire { key, seconds } => Response::boolean(engine.expire(&key, seconds)),
            Command::Ttl { key } => Response::Integer(engine.ttl(&key).as_code()),
            Command::Persist { key } => Response::boolean(engine.persist(&key)),
            Command::MSet { pairs } => {
                engine.mset(&pairs)?;
                Response::ok()
            }
            Command::MGet { keys } => Response::Lines(engine.mget(&keys)),
            Command::LPush { key, value } => {
                engine.lpush(&key, &value)?;
                Response::ok()
            }
            Command::RPush { key, value } => {
                engine.rpush(&key, &value)?;
                Response::ok()
            }
            Command::LPop { key } => Response::Value(engine.lpop(&key)?),
            Command::RPop { key } => Response::Value(engine.rpop(&key)?),
            Command::LRange { key, start, stop } => Response::Lines(
                engine
                    .lrange(&key, start, stop)?
                    .into_iter()
                    .map(Some)
                    .collect(),
            ),
            Command::Ping => Response::Status(engine.ping()),
            Command::Quit => Response::Bye,
        };

        Ok(response)
    }

    fn reject(err: CinderError) -> Response {
        if err.is_client_error() {
            debug!("Request rejected: {}", err);
        } else {
            warn!("Request failed: {}", err);
        }
        Response::error(&err)
    }
}
