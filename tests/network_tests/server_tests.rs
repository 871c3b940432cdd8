//! Tests for the TCP Server
//!
//! These tests verify:
//! - Request/reply over real sockets, including multi-line replies
//! - QUIT closes only the calling connection
//! - A full connection queue is refused with an ERR line
//! - Idle connections time out and free their workers
//! - Graceful shutdown syncs the log

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cinderkv::config::{AofSyncStrategy, Config};
use cinderkv::network::{Client, Server, ShutdownHandle};
use cinderkv::Engine;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct TestServer {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    handle: JoinHandle<()>,
}

impl TestServer {
    fn start(config: Config, engine: Arc<Engine>) -> Self {
        let server = Server::bind(config, engine).unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle();
        let handle = thread::spawn(move || server.run().unwrap());
        Self { addr, shutdown, handle }
    }

    fn stop(self) {
        self.shutdown.shutdown();
        self.handle.join().unwrap();
    }
}

fn test_config() -> Config {
    Config::builder()
        .listen_addr("127.0.0.1:0")
        .persistence(false)
        .worker_threads(2)
        .build()
}

fn in_memory_server() -> TestServer {
    TestServer::start(test_config(), Arc::new(Engine::in_memory()))
}

fn read_line(reader: &mut BufReader<TcpStream>) -> String {
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    line
}

// =============================================================================
// Request / Reply Tests
// =============================================================================

#[test]
fn test_basic_commands() {
    let server = in_memory_server();
    let mut client = Client::connect(server.addr).unwrap();

    assert_eq!(client.send("PING").unwrap(), vec!["PONG"]);
    assert_eq!(client.send("SET greeting hello").unwrap(), vec!["OK"]);
    assert_eq!(client.send("GET greeting").unwrap(), vec!["hello"]);
    assert_eq!(client.send("INCR n").unwrap(), vec!["1"]);
    assert_eq!(client.send("BOGUS").unwrap(), vec!["ERR unknown command"]);
    assert_eq!(client.send("").unwrap(), vec!["ERR no command given"]);

    drop(client);
    server.stop();
}

#[test]
fn test_multi_line_replies() {
    let server = in_memory_server();
    let mut client = Client::connect(server.addr).unwrap();

    client.send("MSET a 1 b 2").unwrap();
    assert_eq!(client.send("MGET a nope b").unwrap(), vec!["1", "(nil)", "2"]);

    client.send("RPUSH q x").unwrap();
    client.send("RPUSH q y").unwrap();
    assert_eq!(client.send("LRANGE q 0 -1").unwrap(), vec!["x", "y"]);
    assert!(client.send("LRANGE empty 0 -1").unwrap().is_empty());

    // Still in step after the extra PINGs
    assert_eq!(client.send("GET a").unwrap(), vec!["1"]);

    drop(client);
    server.stop();
}

#[test]
fn test_raw_wire_format() {
    let server = in_memory_server();
    let mut stream = TcpStream::connect(server.addr).unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    stream.write_all(b"set k v\r\nget k\nGET missing\r\n").unwrap();

    assert_eq!(read_line(&mut reader), "OK\r\n");
    assert_eq!(read_line(&mut reader), "v\r\n");
    assert_eq!(read_line(&mut reader), "(nil)\r\n");

    drop(stream);
    server.stop();
}

#[test]
fn test_invalid_utf8_keeps_connection_open() {
    let server = in_memory_server();
    let mut stream = TcpStream::connect(server.addr).unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    stream.write_all(b"SET k \xff\r\nPING\r\n").unwrap();

    assert_eq!(read_line(&mut reader), "ERR protocol error: invalid UTF-8\r\n");
    assert_eq!(read_line(&mut reader), "PONG\r\n");

    drop(stream);
    server.stop();
}

#[test]
fn test_quit_closes_connection() {
    let server = in_memory_server();
    let mut stream = TcpStream::connect(server.addr).unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    stream.write_all(b"QUIT\r\n").unwrap();
    assert_eq!(read_line(&mut reader), "BYE\r\n");

    let mut rest = Vec::new();
    reader.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());

    // Other clients are unaffected
    let mut client = Client::connect(server.addr).unwrap();
    assert_eq!(client.send("PING").unwrap(), vec!["PONG"]);

    drop(client);
    server.stop();
}

#[test]
fn test_clients_share_state() {
    let server = in_memory_server();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let addr = server.addr;
            thread::spawn(move || {
                let mut client = Client::connect(addr).unwrap();
                for _ in 0..50 {
                    client.send("INCR shared").unwrap();
                }
                client.send("QUIT").unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let mut client = Client::connect(server.addr).unwrap();
    assert_eq!(client.send("GET shared").unwrap(), vec!["200"]);

    drop(client);
    server.stop();
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_full_queue_is_refused() {
    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .persistence(false)
        .worker_threads(1)
        .max_pending_connections(1)
        .build();
    let server = TestServer::start(config, Arc::new(Engine::in_memory()));

    // Occupies the only worker
    let mut busy = Client::connect(server.addr).unwrap();
    assert_eq!(busy.send("PING").unwrap(), vec!["PONG"]);

    // Fills the queue
    let _queued = TcpStream::connect(server.addr).unwrap();
    thread::sleep(Duration::from_millis(300));

    let refused = TcpStream::connect(server.addr).unwrap();
    let mut reader = BufReader::new(refused);
    assert_eq!(read_line(&mut reader), "ERR max number of clients reached\r\n");

    drop(busy);
    server.stop();
}

#[test]
fn test_idle_clients_release_workers() {
    // Default worker count and idle timeout
    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .persistence(false)
        .build();
    let workers = config.worker_threads;
    let server = TestServer::start(config, Arc::new(Engine::in_memory()));

    // Each silent client pins one worker until it idles out
    let idle: Vec<_> = (0..workers)
        .map(|_| TcpStream::connect(server.addr).unwrap())
        .collect();
    thread::sleep(Duration::from_millis(200));

    let mut waiting = TcpStream::connect(server.addr).unwrap();
    waiting.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    waiting.write_all(b"PING\r\n").unwrap();

    let mut reader = BufReader::new(waiting);
    assert_eq!(read_line(&mut reader), "PONG\r\n");

    drop(idle);
    server.stop();
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_shutdown_with_idle_client() {
    let server = in_memory_server();
    let mut client = Client::connect(server.addr).unwrap();
    client.send("PING").unwrap();

    // Returns even though the client never disconnects
    server.stop();

    assert!(client.send("PING").is_err());
}

#[test]
fn test_writes_survive_server_restart() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .listen_addr("127.0.0.1:0")
        .aof_sync_strategy(AofSyncStrategy::EveryNRecords { count: 1000 })
        .build();

    {
        let engine = Arc::new(Engine::open(config.clone()).unwrap());
        let server = TestServer::start(config.clone(), engine);
        let mut client = Client::connect(server.addr).unwrap();
        client.send("SET user alice").unwrap();
        client.send("RPUSH jobs build").unwrap();
        client.send("QUIT").unwrap();
        server.stop();
    }

    let engine = Arc::new(Engine::open(config.clone()).unwrap());
    let server = TestServer::start(config, engine);
    let mut client = Client::connect(server.addr).unwrap();

    assert_eq!(client.send("GET user").unwrap(), vec!["alice"]);
    assert_eq!(client.send("LRANGE jobs 0 -1").unwrap(), vec!["build"]);

    drop(client);
    server.stop();
}

#[test]
fn test_bind_failure_is_config_error() {
    let first = in_memory_server();
    let config = Config::builder()
        .listen_addr(first.addr.to_string())
        .persistence(false)
        .build();

    assert!(Server::bind(config, Arc::new(Engine::in_memory())).is_err());

    first.stop();
}
