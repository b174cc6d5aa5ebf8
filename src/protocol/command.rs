//! Line command parsing.
//!
//! One command per line, space-separated tokens. Unknown commands are
//! reported rather than silently ignored.

use std::str::FromStr;

use thiserror::Error;

/// Errors parsing a command line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command {0:?}")]
    Unknown(String),

    #[error("{command} needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("{command}: invalid number {value:?}")]
    InvalidNumber { command: &'static str, value: String },

    #[error("unsupported position {0:?}; only startpos is available")]
    UnsupportedPosition(String),

    #[error("position: expected \"moves\", found {0:?}")]
    ExpectedMoves(String),
}

/// A parsed protocol command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Identify the engine.
    Uci,

    IsReady,

    /// Forget the current game and tree.
    NewGame,

    /// Set the position to the start plus `moves`, in the domain's
    /// action notation.
    Position { moves: Vec<String> },

    /// Search the current position and report the best action.
    Go,

    /// Report the last best action again.
    Stop,

    /// Save the apprentice and exit.
    Quit,

    /// Run this many self-play turns.
    SelfPlay { turns: u32 },
}

impl Command {
    /// Parse one line; blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else {
            return Ok(None);
        };

        let command = match head {
            "uci" => Command::Uci,
            "isready" => Command::IsReady,
            "ucinewgame" => Command::NewGame,
            "go" => Command::Go,
            "stop" => Command::Stop,
            "quit" => Command::Quit,
            "position" => {
                match tokens.next() {
                    Some("startpos") => {}
                    Some(other) => return Err(CommandError::UnsupportedPosition(other.to_string())),
                    None => {
                        return Err(CommandError::MissingArgument {
                            command: "position",
                            what: "a start position",
                        })
                    }
                }
                let moves = match tokens.next() {
                    None => Vec::new(),
                    Some("moves") => tokens.map(str::to_string).collect(),
                    Some(other) => return Err(CommandError::ExpectedMoves(other.to_string())),
                };
                Command::Position { moves }
            }
            "selfplay" => {
                let value = tokens.next().ok_or(CommandError::MissingArgument {
                    command: "selfplay",
                    what: "a turn count",
                })?;
                let turns = value.parse().map_err(|_| CommandError::InvalidNumber {
                    command: "selfplay",
                    value: value.to_string(),
                })?;
                Command::SelfPlay { turns }
            }
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)?.ok_or(CommandError::MissingArgument {
            command: "line",
            what: "a command",
        })
    }
}
