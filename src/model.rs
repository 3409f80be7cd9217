use serde::{Deserialize, Serialize};

pub const MIN_VOLUME: u8 = 0;
pub const MAX_VOLUME: u8 = 30;

pub const SHUFFLE_CARD: i32 = -7;
pub const MIN_FOLDER: u8 = 1;
pub const MAX_FOLDER: u8 = 6;

// `current_track` is 0 until a track is selected. Folder playback leaves it
// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_track: u16,
    pub volume: u8,
    pub shuffle_active: bool,
}

impl PlaybackState {
    pub fn with_volume(volume: u8) -> Self {
        Self {
            is_playing: false,
            current_track: 0,
            volume: volume.min(MAX_VOLUME),
            shuffle_active: false,
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::with_volume(MAX_VOLUME)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackEntry {
    pub number: u16,
    pub title: String,
    pub artist: String,
}

impl TrackEntry {
    pub fn new(number: u16, title: &str, artist: &str) -> Self {
        Self {
            number,
            title: title.to_string(),
            artist: artist.to_string(),
        }
    }

    pub fn display(&self) -> String {
        format!("{} - {}", self.title, self.artist)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Equalizer {
    Normal,
    Pop,
    Rock,
    Jazz,
    Classic,
    #[default]
    Bass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioBackend {
    #[default]
    Simulated,
    Desktop,
    None,
}

impl AudioBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "simulated" | "sim" => Some(Self::Simulated),
            "desktop" => Some(Self::Desktop),
            "none" | "off" => Some(Self::None),
            _ => None,
        }
    }
}
