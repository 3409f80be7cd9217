use crate::error::CardError;
use crate::model::{MAX_FOLDER, SHUFFLE_CARD};

pub const JUKEBOX_HELP: &str = "Commands: s=state, r=reset, v=volume, +=vol up, -=vol down, l=list songs, p=program mode, x=stop, h=shuffle, z=shuffle status, t=play/pause, n=next, b=previous";
pub const PROGRAMMING_HELP: &str =
    "Programming commands: 'auto', 'manual', 'read', or 'jukebox'";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Shuffle,
    Folder(u8),
    Track(i32),
}

impl CardAction {
    pub fn from_value(value: i64) -> Result<Self, CardError> {
        let narrowed = i32::try_from(value).map_err(|_| CardError::OutOfRange(i32::MAX))?;
        match narrowed {
            SHUFFLE_CARD => Ok(Self::Shuffle),
            n if n < 0 && n >= -i32::from(MAX_FOLDER) => u8::try_from(n.unsigned_abs())
                .map(Self::Folder)
                .map_err(|_| CardError::OutOfRange(n)),
            n if n > 0 => Ok(Self::Track(n)),
            n => Err(CardError::OutOfRange(n)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PlayPauseToggle,
    Next,
    Previous,
    ShuffleStart,
    SystemReset,
    PlayTrack(i32),
    PlayFolder(u8),
    VolumeUp,
    VolumeDown,
    VolumeQuery,
    ListSongs,
    Stop,
    StatusQuery,
    ShuffleStatusQuery,
    EnterProgramming,
    EnterJukebox,
}

impl Command {
    pub fn from_console_char(ch: char) -> Option<Self> {
        let command = match ch {
            's' => Self::StatusQuery,
            'r' => Self::SystemReset,
            'v' => Self::VolumeQuery,
            '+' => Self::VolumeUp,
            '-' => Self::VolumeDown,
            'l' => Self::ListSongs,
            'x' => Self::Stop,
            'h' => Self::ShuffleStart,
            't' => Self::PlayPauseToggle,
            'n' => Self::Next,
            'b' => Self::Previous,
            'z' => Self::ShuffleStatusQuery,
            'p' => Self::EnterProgramming,
            _ => return None,
        };
        Some(command)
    }

    pub fn drives_transport(self) -> bool {
        matches!(
            self,
            Self::PlayPauseToggle
                | Self::Next
                | Self::Previous
                | Self::ShuffleStart
                | Self::PlayTrack(_)
                | Self::PlayFolder(_)
                | Self::Stop
                | Self::VolumeUp
                | Self::VolumeDown
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Command(Command),
    CardValue(i64),
    Empty,
    Unknown(String),
}

pub fn parse_console_line(line: &str) -> ConsoleInput {
    let input = line.trim();
    if input.is_empty() {
        return ConsoleInput::Empty;
    }

    if input.eq_ignore_ascii_case("program") {
        return ConsoleInput::Command(Command::EnterProgramming);
    }
    if input.eq_ignore_ascii_case("jukebox") {
        return ConsoleInput::Command(Command::EnterJukebox);
    }

    let mut chars = input.chars();
    if let (Some(ch), None) = (chars.next(), chars.next())
        && let Some(command) = Command::from_console_char(ch)
    {
        return ConsoleInput::Command(command);
    }

    match input.parse::<i64>() {
        Ok(value) => ConsoleInput::CardValue(value),
        Err(_) => ConsoleInput::Unknown(input.to_string()),
    }
}
