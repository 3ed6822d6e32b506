//! Interactive command parsing.

use std::str::FromStr;

use crate::error::CommandParseError;

/// Largest `setup` offset, either direction (30 days, the coordinator's own limit)
pub const MAX_SETUP_DELAY_SECS: f64 = 30.0 * 24.0 * 60.0 * 60.0;

/// Latest `setup-at` target: 9999-12-31T23:59:59.999Z
pub const MAX_SETUP_AT_MILLIS: i64 = 253_402_300_799_999;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Load `file` and join the room
    Join(String),
    Leave,
    /// Start playback this many seconds from now (negative = already running)
    Setup { delay_secs: f64 },
    /// Start playback at an absolute coordinator time (epoch ms)
    SetupAt(i64),
    Reconfigure,
    Pause,
    Play,
    Resync,
    Sync,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "" => Err(CommandParseError::Empty),
            "join" => {
                if rest.is_empty() {
                    return Err(CommandParseError::MissingArgument {
                        command: "join",
                        argument: "a media file name",
                    });
                }
                Ok(Command::Join(rest.to_string()))
            }
            "leave" => Ok(Command::Leave),
            "setup" => {
                let arg = required(rest, "setup", "seconds from now")?;
                let delay_secs = arg
                    .parse::<f64>()
                    .ok()
                    .filter(|secs| secs.is_finite())
                    .ok_or_else(|| CommandParseError::InvalidNumber(arg.to_string()))?;
                if delay_secs.abs() > MAX_SETUP_DELAY_SECS {
                    return Err(CommandParseError::OutOfRange {
                        command: "setup",
                        value: arg.to_string(),
                        max: "2592000 seconds",
                    });
                }
                Ok(Command::Setup { delay_secs })
            }
            "setup-at" => {
                let arg = required(rest, "setup-at", "an epoch time in milliseconds")?;
                let target_time = arg
                    .parse::<i64>()
                    .ok()
                    .filter(|ms| *ms > 0)
                    .ok_or_else(|| CommandParseError::InvalidNumber(arg.to_string()))?;
                if target_time > MAX_SETUP_AT_MILLIS {
                    return Err(CommandParseError::OutOfRange {
                        command: "setup-at",
                        value: arg.to_string(),
                        max: "year 9999",
                    });
                }
                Ok(Command::SetupAt(target_time))
            }
            "reconfigure" => Ok(Command::Reconfigure),
            "pause" => Ok(Command::Pause),
            "play" => Ok(Command::Play),
            "resync" => Ok(Command::Resync),
            "sync" => Ok(Command::Sync),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}

/// Coordinator time `delay_secs` after `synced_now`, or `None` if it does
/// not fit in epoch milliseconds
pub fn setup_target_time(synced_now: i64, delay_secs: f64) -> Option<i64> {
    let delay_ms = (delay_secs * 1000.0).round();
    if !delay_ms.is_finite() || delay_ms.abs() >= i64::MAX as f64 {
        return None;
    }
    synced_now.checked_add(delay_ms as i64)
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, CommandParseError> {
    match rest.split_whitespace().next() {
        Some(arg) => Ok(arg),
        None => Err(CommandParseError::MissingArgument { command, argument }),
    }
}

pub const HELP: &str = "\
Commands:
  join <file>       load a media file and join the room
  leave             leave the room
  setup <secs>      start playback <secs> seconds from now
  setup-at <ms>     start playback at coordinator time <ms>
  reconfigure       reset the room to waiting
  pause | play      local pause / resume (resume corrects drift)
  resync            jump back onto the room's timeline
  sync              probe the coordinator clock now
  status            show room and clock state
  help              show this help
  quit              exit";
