//! Input sources: stdin commands and Ctrl-C.
//!
//! Both feed one [`InputEvent`] channel that the runner drains once per
//! tick. Stdin is read on a plain OS thread because a blocking read cannot
//! be cancelled, and a tokio blocking task would hold up runtime shutdown
//! until the next line arrives.
//!
//! Commands, one per line:
//!
//! ```text
//! food <x> <y>     drop food at (x, y)   (alias: feed)
//! quit             end the simulation    (alias: exit)
//! ```

use std::io::BufRead;
use std::num::ParseFloatError;
use std::thread;

use roost_core::InputEvent;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Why a command line could not be understood.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The first word is not a known command.
    #[error("unknown command `{command}`")]
    UnknownCommand {
        /// The unrecognized word.
        command: String,
    },

    /// `food` needs two coordinates.
    #[error("expected `food <x> <y>`")]
    MissingCoordinate,

    /// A coordinate is not a number.
    #[error("invalid coordinate `{value}`: {source}")]
    BadCoordinate {
        /// The offending text.
        value: String,
        /// The underlying parse error.
        source: ParseFloatError,
    },

    /// Extra words after a complete command.
    #[error("unexpected trailing input `{rest}`")]
    TrailingInput {
        /// The extra text.
        rest: String,
    },
}

fn coordinate(word: Option<&str>) -> Result<f32, ParseError> {
    let word = word.ok_or(ParseError::MissingCoordinate)?;
    word.parse::<f32>().map_err(|source| ParseError::BadCoordinate {
        value: word.to_owned(),
        source,
    })
}

/// Parse one command line.
///
/// Blank lines parse to `Ok(None)`. Commands are case-insensitive.
pub fn parse_command(line: &str) -> Result<Option<InputEvent>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    let event = match command.to_ascii_lowercase().as_str() {
        "food" | "feed" => {
            let x = coordinate(words.next())?;
            let y = coordinate(words.next())?;
            InputEvent::AddFood { x, y }
        }
        "quit" | "exit" => InputEvent::Shutdown,
        _ => {
            return Err(ParseError::UnknownCommand {
                command: command.to_owned(),
            });
        }
    };

    let rest: Vec<&str> = words.collect();
    if rest.is_empty() {
        Ok(Some(event))
    } else {
        Err(ParseError::TrailingInput {
            rest: rest.join(" "),
        })
    }
}

/// Forward parsed commands from `reader` until EOF or the channel closes.
///
/// Bad lines are logged and skipped.
pub fn forward_commands(reader: impl BufRead, tx: &mpsc::Sender<InputEvent>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "stdin read failed, input closed");
                return;
            }
        };
        match parse_command(&line) {
            Ok(Some(event)) => {
                if tx.blocking_send(event).is_err() {
                    debug!("simulation finished, input reader exiting");
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => warn!(line = %line, error = %e, "ignoring input"),
        }
    }
    info!("stdin closed; Ctrl-C still ends the simulation");
}

/// Read commands from stdin on a dedicated thread.
///
/// The thread is detached; it exits at EOF, on a read error, or on the
/// first send after the runner has dropped the receiver.
///
/// # Errors
///
/// Returns the OS error if the thread cannot be spawned.
pub fn spawn_stdin_reader(tx: mpsc::Sender<InputEvent>) -> std::io::Result<()> {
    let _detached = thread::Builder::new()
        .name("stdin-reader".to_owned())
        .spawn(move || forward_commands(std::io::stdin().lock(), &tx))?;
    Ok(())
}

/// Send [`InputEvent::Shutdown`] on Ctrl-C.
pub fn spawn_ctrl_c(tx: mpsc::Sender<InputEvent>) {
    let _task = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                let _ = tx.send(InputEvent::Shutdown).await;
            }
            Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    });
}
