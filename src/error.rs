use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("no number found on card")]
    Empty,

    #[error("value needs {len} characters, a card block holds 16")]
    Overflow { len: usize },

    #[error("card holds {0:?}, which is not a number")]
    NotANumber(String),

    #[error("card number {0} is out of range")]
    OutOfRange(i32),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("card I/O failed: {0}")]
    Io(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("ERROR: Invalid song number {track}. Must be 1-{max}.")]
    TrackOutOfRange { track: i32, max: u16 },

    #[error("ERROR: Invalid folder {0}. Must be 1-6.")]
    FolderOutOfRange(i32),

    #[error("Invalid card number: {0}")]
    Card(#[from] CardError),
}

#[derive(Error, Debug)]
pub enum JukeboxError {
    #[error("audio module not available: {0}")]
    TransportInit(String),

    #[error("network not ready within {0:?}")]
    NetworkTimeout(Duration),

    #[error("network error: {0}")]
    Network(String),
}

pub type Result<T> = std::result::Result<T, JukeboxError>;
