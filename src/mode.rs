use crate::command::{Command, ConsoleInput, parse_console_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoWriter {
    AwaitingStart,
    Ready { next: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgrammingMode {
    None,
    Auto(AutoWriter),
    Manual,
    Read,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeState {
    #[default]
    Jukebox,
    Programming(ProgrammingMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submode {
    Auto,
    Manual,
    Read,
}

impl Submode {
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "auto" => Some(Self::Auto),
            "manual" => Some(Self::Manual),
            "read" => Some(Self::Read),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
            Self::Read => "read",
        }
    }
}

impl ModeState {
    pub fn is_jukebox(&self) -> bool {
        matches!(self, Self::Jukebox)
    }

    pub fn programming(&self) -> Option<ProgrammingMode> {
        match self {
            Self::Jukebox => None,
            Self::Programming(sub) => Some(*sub),
        }
    }

    pub fn accepts(&self, command: Command) -> bool {
        self.is_jukebox() || !command.drives_transport()
    }

    pub fn enter_programming(&mut self) -> String {
        if !self.is_jukebox() {
            return String::from("Already in programming mode");
        }

        *self = Self::Programming(ProgrammingMode::None);
        String::from(
            "PROGRAM: === PROGRAMMING MODE ACTIVATED ===\nWrite 'auto' for Automatic mode, 'manual' for Manual mode, or 'read' to read cards\nType 'jukebox' to return to jukebox mode",
        )
    }

    pub fn return_to_jukebox(&mut self) -> String {
        if self.is_jukebox() {
            return String::from("Already in jukebox mode");
        }

        *self = Self::Jukebox;
        String::from(
            "JUKEBOX: === JUKEBOX MODE ACTIVATED ===\nPlace an RFID card on the reader to play a song",
        )
    }

    pub fn select(&mut self, submode: Submode) -> Option<String> {
        if self.is_jukebox() {
            return None;
        }

        let (next, hint) = match submode {
            Submode::Auto => (
                ProgrammingMode::Auto(AutoWriter::AwaitingStart),
                "Please enter the starting number:",
            ),
            Submode::Manual => (
                ProgrammingMode::Manual,
                "Place the card on the reader and hold it there to write song number data to the card",
            ),
            Submode::Read => (
                ProgrammingMode::Read,
                "Place the card on the reader to read its number",
            ),
        };
        *self = Self::Programming(next);
        Some(format!(
            "Device is now in {} programming mode\n{hint}",
            submode.label()
        ))
    }

    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        let sub = self.programming()?;
        let input = line.trim();

        if input == "jukebox" {
            return Some(self.return_to_jukebox());
        }
        if let Some(submode) = Submode::parse(input) {
            return self.select(submode);
        }
        if let ConsoleInput::Command(_) = parse_console_line(input) {
            return None;
        }

        let reply = match sub {
            ProgrammingMode::Auto(AutoWriter::AwaitingStart) => match input.parse::<i64>() {
                Ok(start) if start >= 0 => {
                    *self = Self::Programming(ProgrammingMode::Auto(AutoWriter::Ready { next: start }));
                    format!(
                        "Auto mode ready! Starting number: {start}\nPlace the card on the reader and hold it there to write song number data to the card\n(Type 'jukebox' to return to jukebox mode)"
                    )
                }
                _ => String::from("Please enter a valid number (0 or greater):"),
            },
            ProgrammingMode::None => String::from(crate::command::PROGRAMMING_HELP),
            _ if input.is_empty() => return Some(String::new()),
            _ => format!(
                "Ignored {input:?}; {}",
                crate::command::PROGRAMMING_HELP
            ),
        };
        Some(reply)
    }

    pub fn auto_written(&mut self) {
        if let Self::Programming(ProgrammingMode::Auto(AutoWriter::Ready { next })) = self {
            *next += 1;
        }
    }
}
