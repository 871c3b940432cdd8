//! Command definitions
//!
//! Represents validated commands from clients, plus the fixed command table
//! (verb name and minimum arity) used to build them.

use crate::error::{CinderError, Result};

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Set,
    Get,
    Del,
    Incr,
    Decr,
    Expire,
    Ttl,
    Persist,
    MSet,
    MGet,
    LPush,
    RPush,
    LPop,
    RPop,
    LRange,
    Ping,
    Quit,
}

impl CommandType {
    /// Every command the server understands
    pub const ALL: [CommandType; 17] = [
        CommandType::Set,
        CommandType::Get,
        CommandType::Del,
        CommandType::Incr,
        CommandType::Decr,
        CommandType::Expire,
        CommandType::Ttl,
        CommandType::Persist,
        CommandType::MSet,
        CommandType::MGet,
        CommandType::LPush,
        CommandType::RPush,
        CommandType::LPop,
        CommandType::RPop,
        CommandType::LRange,
        CommandType::Ping,
        CommandType::Quit,
    ];

    /// Canonical (upper-case) verb
    pub fn name(&self) -> &'static str {
        match self {
            CommandType::Set => "SET",
            CommandType::Get => "GET",
            CommandType::Del => "DEL",
            CommandType::Incr => "INCR",
            CommandType::Decr => "DECR",
            CommandType::Expire => "EXPIRE",
            CommandType::Ttl => "TTL",
            CommandType::Persist => "PERSIST",
            CommandType::MSet => "MSET",
            CommandType::MGet => "MGET",
            CommandType::LPush => "LPUSH",
            CommandType::RPush => "RPUSH",
            CommandType::LPop => "LPOP",
            CommandType::RPop => "RPOP",
            CommandType::LRange => "LRANGE",
            CommandType::Ping => "PING",
            CommandType::Quit => "QUIT",
        }
    }

    /// Minimum number of arguments after the verb
    pub fn min_arity(&self) -> usize {
        match self {
            CommandType::Ping | CommandType::Quit => 0,
            CommandType::Get
            | CommandType::Del
            | CommandType::Incr
            | CommandType::Decr
            | CommandType::Ttl
            | CommandType::Persist
            | CommandType::MGet
            | CommandType::LPop
            | CommandType::RPop => 1,
            CommandType::Set
            | CommandType::Expire
            | CommandType::MSet
            | CommandType::LPush
            | CommandType::RPush => 2,
            CommandType::LRange => 3,
        }
    }

    /// Look up a verb, ignoring case
    pub fn from_verb(verb: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|command_type| command_type.name().eq_ignore_ascii_case(verb))
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { key: String, value: String },
    Get { key: String },
    Del { key: String },
    Incr { key: String },
    Decr { key: String },
    Expire { key: String, seconds: i64 },
    Ttl { key: String },
    Persist { key: String },
    MSet { pairs: Vec<(String, String)> },
    MGet { keys: Vec<String> },
    LPush { key: String, value: String },
    RPush { key: String, value: String },
    LPop { key: String },
    RPop { key: String },
    LRange { key: String, start: i64, stop: i64 },
    Ping,
    Quit,
}

impl Command {
    /// Build a command from already tokenized input
    ///
    /// The first token is the verb. Arguments beyond what a command consumes
    /// are ignored, except for `MSET` which needs an even count.
    pub fn from_tokens(tokens: &[&str]) -> Result<Self> {
        let (verb, args) = tokens.split_first().ok_or(CinderError::EmptyCommand)?;

        let command_type = CommandType::from_verb(verb)
            .ok_or_else(|| CinderError::UnknownCommand(verb.to_string()))?;

        let arity_ok = match command_type {
            CommandType::MSet => args.len() >= 2 && args.len() % 2 == 0,
            _ => args.len() >= command_type.min_arity(),
        };
        if !arity_ok {
            return Err(CinderError::WrongArity {
                command: command_type.name().to_string(),
            });
        }

        let arg = |i: usize| args[i].to_string();

        let command = match command_type {
            CommandType::Set => Command::Set { key: arg(0), value: arg(1) },
            CommandType::Get => Command::Get { key: arg(0) },
            CommandType::Del => Command::Del { key: arg(0) },
            CommandType::Incr => Command::Incr { key: arg(0) },
            CommandType::Decr => Command::Decr { key: arg(0) },
            CommandType::Expire => Command::Expire {
                key: arg(0),
                seconds: parse_integer(args[1])?,
            },
            CommandType::Ttl => Command::Ttl { key: arg(0) },
            CommandType::Persist => Command::Persist { key: arg(0) },
            CommandType::MSet => Command::MSet {
                pairs: args
                    .chunks_exact(2)
                    .map(|pair| (pair[0].to_string(), pair[1].to_string()))
                    .collect(),
            },
            CommandType::MGet => Command::MGet {
                keys: args.iter().map(|key| key.to_string()).collect(),
            },
            CommandType::LPush => Command::LPush { key: arg(0), value: arg(1) },
            CommandType::RPush => Command::RPush { key: arg(0), value: arg(1) },
            CommandType::LPop => Command::LPop { key: arg(0) },
            CommandType::RPop => Command::RPop { key: arg(0) },
            CommandType::LRange => Command::LRange {
                key: arg(0),
                start: parse_integer(args[1])?,
                stop: parse_integer(args[2])?,
            },
            CommandType::Ping => Command::Ping,
            CommandType::Quit => Command::Quit,
        };

        Ok(command)
    }

    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Set { .. } => CommandType::Set,
            Command::Get { .. } => CommandType::Get,
            Command::Del { .. } => CommandType::Del,
            Command::Incr { .. } => CommandType::Incr,
            Command::Decr { .. } => CommandType::Decr,
            Command::Expire { .. } => CommandType::Expire,
            Command::Ttl { .. } => CommandType::Ttl,
            Command::Persist { .. } => CommandType::Persist,
            Command::MSet { .. } => CommandType::MSet,
            Command::MGet { .. } => CommandType::MGet,
            Command::LPush { .. } => CommandType::LPush,
            Command::RPush { .. } => CommandType::RPush,
            Command::LPop { .. } => CommandType::LPop,
            Command::RPop { .. } => CommandType::RPop,
            Command::LRange { .. } => CommandType::LRange,
            Command::Ping => CommandType::Ping,
            Command::Quit => CommandType::Quit,
        }
    }
}

/// Parse a base-10 integer argument
fn parse_integer(token: &str) -> Result<i64> {
    token.parse::<i64>().map_err(|_| CinderError::NotAnInteger)
}
