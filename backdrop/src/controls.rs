//! Line-based keyboard controls read from stdin.

use bd_common::Viewport;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ToggleMute,
    CycleBrightness,
    Volume(f32),
    Resize(Viewport),
    Next,
    PauseAll,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("Expected a volume between 0 and 1, got {0:?}")]
    Volume(String),
    #[error("Expected WIDTHxHEIGHT, got {0:?}")]
    Resize(String),
}

pub const HELP: &str =
    "controls: m mute | b brightness | v <0..1> volume | r <W>x<H> resize | n next | p pause | q quit";

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Result<Self, CommandError>> {
        let mut parts = line.split_whitespace();
        let verb = parts.next()?;
        let arg = parts.next().unwrap_or("");

        let command = match verb {
            "m" | "mute" => Ok(Self::ToggleMute),
            "b" | "brightness" => Ok(Self::CycleBrightness),
            "n" | "next" => Ok(Self::Next),
            "p" | "pause" => Ok(Self::PauseAll),
            "q" | "quit" => Ok(Self::Quit),
            "v" | "volume" => arg
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Self::Volume)
                .ok_or_else(|| CommandError::Volume(arg.to_string())),
            "r" | "resize" => Viewport::parse(arg)
                .map(Self::Resize)
                .ok_or_else(|| CommandError::Resize(arg.to_string())),
            other => Err(CommandError::Unknown(other.to_string())),
        };
        Some(command)
    }
}

/// Forward parsed stdin commands until EOF or the receiver goes away.
pub fn spawn_stdin_reader(tx: mpsc::Sender<Command>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("stdin closed, controls disabled");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin, controls disabled");
                    return;
                }
            };
            match Command::parse(&line) {
                Some(Ok(command)) => {
                    if tx.send(command).await.is_err() {
                        return;
                    }
                }
                Some(Err(e)) => {
                    warn!("{e}");
                    eprintln!("{HELP}");
                }
                None => {}
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_letter_commands() {
        assert_eq!(Command::parse("m"), Some(Ok(Command::ToggleMute)));
        assert_eq!(Command::parse(" b "), Some(Ok(Command::CycleBrightness)));
        assert_eq!(Command::parse("q"), Some(Ok(Command::Quit)));
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn parses_arguments() {
        assert_eq!(Command::parse("v 0.25"), Some(Ok(Command::Volume(0.25))));
        assert_eq!(
            Command::parse("r 800x600"),
            Some(Ok(Command::Resize(Viewport::new(800, 600))))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            Command::parse("v loud"),
            Some(Err(CommandError::Volume("loud".into())))
        );
        assert_eq!(
            Command::parse("r 0x600"),
            Some(Err(CommandError::Resize("0x600".into())))
        );
        assert_eq!(
            Command::parse("x"),
            Some(Err(CommandError::Unknown("x".into())))
        );
    }
}
