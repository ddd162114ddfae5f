/// Line-based console commands
use crate::error::{PlayerError, Result};
use nova_core::TrackId;
use nova_playback::RepeatMode;
use std::str::FromStr;
use std::time::Duration;

/// Help text printed by `help`
pub const HELP: &str = "\
commands:
  play | pause | resume | stop
  next | prev | seek <ms> | goto <index>
  shuffle on|off | repeat none|one|all
  add <id> | playnext <id> | up <id> | down <id> | remove <id>
  sleep <secs>|end|off | bg | fg
  queue | history | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SleepSetting {
    After(Duration),
    EndOfTrack,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    Play,
    Pause,
    Resume,
    Stop,
    Next,
    Previous,
    Seek(u64),
    Goto(usize),
    Shuffle(bool),
    Repeat(RepeatMode),
    Add(TrackId),
    PlayNext(TrackId),
    MoveUp(TrackId),
    MoveDown(TrackId),
    Remove(TrackId),
    Sleep(SleepSetting),
    Background,
    Foreground,
    Queue,
    History,
    Help,
    Quit,
}

impl FromStr for PlayerCommand {
    type Err = PlayerError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(PlayerError::UnknownCommand(String::new()));
        };
        let arg = words.next();

        let command = match name {
            "play" => Self::Play,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "stop" => Self::Stop,
            "next" => Self::Next,
            "prev" | "previous" => Self::Previous,
            "seek" => Self::Seek(parse_number("seek", arg)?),
            "goto" => Self::Goto(parse_number("goto", arg)?),
            "shuffle" => match arg {
                Some("on") => Self::Shuffle(true),
                Some("off") => Self::Shuffle(false),
                _ => return Err(PlayerError::invalid_argument("shuffle", "expected on|off")),
            },
            "repeat" => match arg {
                Some("none") => Self::Repeat(RepeatMode::None),
                Some("one") => Self::Repeat(RepeatMode::One),
                Some("all") => Self::Repeat(RepeatMode::All),
                _ => {
                    return Err(PlayerError::invalid_argument(
                        "repeat",
                        "expected none|one|all",
                    ))
                }
            },
            "add" => Self::Add(parse_id("add", arg)?),
            "playnext" => Self::PlayNext(parse_id("playnext", arg)?),
            "up" => Self::MoveUp(parse_id("up", arg)?),
            "down" => Self::MoveDown(parse_id("down", arg)?),
            "remove" | "rm" => Self::Remove(parse_id("remove", arg)?),
            "sleep" => Self::Sleep(match arg {
                Some("end") => SleepSetting::EndOfTrack,
                Some("off") => SleepSetting::Off,
                _ => SleepSetting::After(Duration::from_secs(parse_number("sleep", arg)?)),
            }),
            "bg" => Self::Background,
            "fg" => Self::Foreground,
            "queue" | "q" => Self::Queue,
            "history" => Self::History,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(PlayerError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

fn parse_number<T: FromStr>(command: &'static str, arg: Option<&str>) -> Result<T> {
    let arg = arg.ok_or_else(|| PlayerError::invalid_argument(command, "missing number"))?;
    arg.parse()
        .map_err(|_| PlayerError::invalid_argument(command, format!("'{}' is not a number", arg)))
}

fn parse_id(command: &'static str, arg: Option<&str>) -> Result<TrackId> {
    arg.map(TrackId::new)
        .ok_or_else(|| PlayerError::invalid_argument(command, "missing track id"))
}
