//! Blocking Client
//!
//! Sends request lines and collects reply lines. Replies carry no length
//! prefix, so the number of lines to read is decided from the request:
//! `MGET` answers one line per key, `LRANGE` is followed by a `PING` and read
//! until the `PONG`, everything else answers one line.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{CinderError, Result};
use crate::protocol::{parse_request, Command};

/// A connection to a CinderKV server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            reader,
            writer: stream,
        })
    }

    /// Send one request line and return its reply lines
    pub fn send(&mut self, line: &str) -> Result<Vec<String>> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);

        match parse_request(line) {
            Ok(Command::MGet { keys }) => {
                self.write_line(line)?;
                self.read_lines(keys.len())
            }
            Ok(Command::LRange { .. }) => {
                self.write_line(line)?;
                self.write_line("PING")?;
                self.read_until_pong()
            }
            // Rejected requests and every other verb reply with one line.
            _ => {
                self.write_line(line)?;
                self.read_lines(1)
            }
        }
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\r\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_lines(&mut self, count: usize) -> Result<Vec<String>> {
        (0..count).map(|_| self.read_line()).collect()
    }

    fn read_until_pong(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line()?;
            if line == "PONG" {
                return Ok(lines);
            }
            lines.push(line);
        }
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(CinderError::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "server closed the connection",
            )));
        }
        let trimmed = line.trim_end_matches(&['\r', '\n'][..]).len();
        line.truncate(trimmed);
        Ok(line)
    }
}
