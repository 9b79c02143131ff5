use std::str::FromStr;

use anyhow::{Error, Result, anyhow};
use dualplay_core::MediaPlayer;

/// A control command applied to the running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    /// Stop the current media and move on to the next one
    Stop,
    Seek(u64),
    Move(i32, i32),
    Resize(u32, u32),
    Front,
    Status,
}

/// A command scheduled at an elapsed time, written `MS:COMMAND` on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedCommand {
    pub at_ms: u64,
    pub command: Command,
}

/// Command handler for the application
pub struct CommandHandler;

impl CommandHandler {
    /// Parse a command string such as `seek 1500` or `move 10 20`
    pub fn parse(command_str: &str) -> Result<Command> {
        let mut parts = command_str.split_whitespace();
        let cmd = parts.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = parts.collect();

        let command = match cmd.as_str() {
            "pause" => Command::Pause,
            "resume" | "play" | "p" => Command::Resume,
            "stop" | "next" => Command::Stop,
            "seek" | "s" => {
                let [position] = args[..] else {
                    return Err(anyhow!("Seek command requires a position argument in milliseconds"));
                };
                let position = position
                    .parse::<u64>()
                    .map_err(|_| anyhow!("Invalid position: {}", position))?;
                Command::Seek(position)
            }
            "move" | "m" => {
                let [x, y] = args[..] else {
                    return Err(anyhow!("Move command requires x and y arguments"));
                };
                Command::Move(parse_arg(x, "x")?, parse_arg(y, "y")?)
            }
            "resize" | "r" => {
                let [width, height] = args[..] else {
                    return Err(anyhow!("Resize command requires width and height arguments"));
                };
                Command::Resize(parse_arg(width, "width")?, parse_arg(height, "height")?)
            }
            "front" | "raise" => Command::Front,
            "status" | "st" => Command::Status,
            "" => return Err(anyhow!("Empty command")),
            _ => return Err(anyhow!("Unknown command: {}", cmd)),
        };

        Ok(command)
    }

    /// Apply a command to the player, returning a status line for `status`
    pub fn execute(player: &mut dyn MediaPlayer, command: Command) -> Option<String> {
        match command {
            Command::Pause => player.pause(),
            Command::Resume => player.resume(),
            Command::Stop => player.stop(),
            Command::Seek(millis) => player.seek(millis),
            Command::Move(x, y) => player.move_to(x, y),
            Command::Resize(width, height) => player.resize(width, height),
            Command::Front => player.bring_to_front(),
            Command::Status => return Some(status_line(player)),
        }
        None
    }
}

fn parse_arg<T: FromStr>(value: &str, name: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| anyhow!("Invalid {}: {}", name, value))
}

fn format_time(seconds: Option<u64>) -> String {
    match seconds {
        Some(s) => format!("{:02}:{:02}", s / 60, s % 60),
        None => "--:--".to_string(),
    }
}

/// One-line summary of the player state
pub fn status_line(player: &dyn MediaPlayer) -> String {
    let geometry = player.geometry();
    format!(
        "[{}] {} {}/{} at {},{} {}x{}",
        player.provider(),
        if player.is_playing() { "playing" } else { "idle" },
        format_time(player.current_time()),
        format_time(player.total_time()),
        geometry.x,
        geometry.y,
        geometry.width,
        geometry.height
    )
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CommandHandler::parse(s)
    }
}

impl FromStr for TimedCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (at, command) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("Expected MS:COMMAND, got '{}'", s))?;
        let at_ms = at
            .trim()
            .parse::<u64>()
            .map_err(|_| anyhow!("Invalid time: {}", at))?;
        Ok(Self {
            at_ms,
            command: command.parse()?,
        })
    }
}
