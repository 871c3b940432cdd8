//! CinderKV CLI Client
//!
//! Command-line interface for interacting with CinderKV.

use std::io::{self, BufRead, Write};

use clap::Parser;
use cinderkv::network::Client;

/// CinderKV CLI
#[derive(Parser, Debug)]
#[command(name = "cinderkv-cli")]
#[command(about = "CLI for the CinderKV key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    /// Command to run once (e.g. `SET greeting hello`); omit for a prompt
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() {
    let args = Args::parse();

    let mut client = match Client::connect(args.server.as_str()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Could not connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    if !args.command.is_empty() {
        let line = args.command.join(" ");
        if let Err(e) = run_line(&mut client, &line) {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        return;
    }

    let stdin = io::stdin();
    prompt(&args.server);
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        };

        if line.trim().is_empty() {
            prompt(&args.server);
            continue;
        }

        // The server drops idle connections, so retry once on a fresh one
        let result = run_line(&mut client, &line).or_else(|_| {
            client = Client::connect(args.server.as_str())?;
            run_line(&mut client, &line)
        });

        match result {
            Ok(true) => break,
            Ok(false) => prompt(&args.server),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Send one request and print its reply; `Ok(true)` once the server said BYE
fn run_line(client: &mut Client, line: &str) -> cinderkv::Result<bool> {
    let reply = client.send(line)?;
    for reply_line in &reply {
        println!("{}", reply_line);
    }
    Ok(reply.first().map(String::as_str) == Some("BYE"))
}

fn prompt(server: &str) {
    print!("{}> ", server);
    let _ = io::stdout().flush();
}
