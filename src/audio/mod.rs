use crate::config::JukeboxConfig;
use crate::error::{JukeboxError, Result};
use crate::model::{AudioBackend, Equalizer, MAX_VOLUME};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[cfg(feature = "desktop-audio")]
mod desktop;
#[cfg(feature = "desktop-audio")]
pub use desktop::DesktopModule;

pub const STATE_STOPPED: u8 = 0;
pub const STATE_PLAYING: u8 = 1;
pub const STATE_PAUSED: u8 = 2;
pub const STATE_ERROR: u8 = 255;

pub trait AudioTransport {
    fn play(&mut self, track: u16);
    fn play_large_folder(&mut self, folder: u8, index: u16);
    fn next(&mut self);
    fn previous(&mut self);
    fn pause(&mut self);
    fn start(&mut self);
    fn stop(&mut self);
    fn volume(&mut self, volume: u8);
    fn equalizer(&mut self, _eq: Equalizer) {}
    fn read_state(&mut self) -> u8;
    fn name(&self) -> &str;
}

pub fn open_transport(config: &JukeboxConfig) -> Result<Box<dyn AudioTransport>> {
    match config.audio_backend {
        AudioBackend::Simulated => Ok(Box::new(SimulatedModule::new(Duration::from_secs(
            config.simulated_track_seconds,
        )))),
        AudioBackend::Desktop => open_desktop(config),
        AudioBackend::None => Err(JukeboxError::TransportInit(String::from(
            "audio backend disabled in config",
        ))),
    }
}

#[cfg(feature = "desktop-audio")]
fn open_desktop(config: &JukeboxConfig) -> Result<Box<dyn AudioTransport>> {
    let Some(root) = config.music_dir.as_deref() else {
        return Err(JukeboxError::TransportInit(String::from(
            "desktop backend needs music_dir",
        )));
    };
    let module = DesktopModule::open(root)
        .map_err(|err| JukeboxError::TransportInit(format!("{err:#}")))?;
    Ok(Box::new(module))
}

#[cfg(not(feature = "desktop-audio"))]
fn open_desktop(_config: &JukeboxConfig) -> Result<Box<dyn AudioTransport>> {
    Err(JukeboxError::TransportInit(String::from(
        "built without the desktop-audio feature",
    )))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCall {
    Play(u16),
    PlayLargeFolder(u8, u16),
    Next,
    Previous,
    Pause,
    Start,
    Stop,
    Volume(u8),
    Equalizer(Equalizer),
    ReadState,
}

#[derive(Debug)]
struct SimState {
    track_length: Duration,
    current: Option<u16>,
    folder: Option<(u8, u16)>,
    started_at: Option<Instant>,
    elapsed: Duration,
    paused: bool,
    volume: u8,
    scripted: VecDeque<u8>,
    calls: Vec<TransportCall>,
}

impl SimState {
    fn begin(&mut self) {
        self.started_at = Some(Instant::now());
        self.elapsed = Duration::ZERO;
        self.paused = false;
    }

    fn position(&self) -> Duration {
        let mut position = self.elapsed;
        if !self.paused
            && let Some(started_at) = self.started_at
        {
            position = position.saturating_add(started_at.elapsed());
        }
        position
    }

    fn computed_state(&self) -> u8 {
        if self.current.is_none() && self.folder.is_none() {
            return STATE_STOPPED;
        }
        if self.paused {
            return STATE_PAUSED;
        }
        if self.position() >= self.track_length {
            STATE_STOPPED
        } else {
            STATE_PLAYING
        }
    }
}

pub struct SimulatedModule {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedModule {
    pub fn new(track_length: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                track_length,
                current: None,
                folder: None,
                started_at: None,
                elapsed: Duration::ZERO,
                paused: false,
                volume: MAX_VOLUME,
                scripted: VecDeque::new(),
                calls: Vec::new(),
            })),
        }
    }

    pub fn probe(&self) -> ModuleProbe {
        ModuleProbe {
            state: Arc::clone(&self.state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: TransportCall) -> MutexGuard<'_, SimState> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }
}

impl AudioTransport for SimulatedModule {
    fn play(&mut self, track: u16) {
        let mut state = self.record(TransportCall::Play(track));
        state.current = Some(track);
        state.folder = None;
        state.begin();
    }

    fn play_large_folder(&mut self, folder: u8, index: u16) {
        let mut state = self.record(TransportCall::PlayLargeFolder(folder, index));
        state.current = None;
        state.folder = Some((folder, index));
        state.begin();
    }

    fn next(&mut self) {
        let mut state = self.record(TransportCall::Next);
        if let Some((folder, index)) = state.folder {
            state.folder = Some((folder, index.saturating_add(1)));
        } else {
            state.current = Some(state.current.map_or(1, |track| track.saturating_add(1)));
        }
        state.begin();
    }

    fn previous(&mut self) {
        let mut state = self.record(TransportCall::Previous);
        if let Some((folder, index)) = state.folder {
            state.folder = Some((folder, index.saturating_sub(1).max(1)));
        } else {
            state.current = Some(state.current.map_or(1, |track| track.saturating_sub(1).max(1)));
        }
        state.begin();
    }

    fn pause(&mut self) {
        let mut state = self.record(TransportCall::Pause);
        if !state.paused {
            state.elapsed = state.position();
            state.started_at = None;
            state.paused = true;
        }
    }

    fn start(&mut self) {
        let mut state = self.record(TransportCall::Start);
        if state.paused {
            state.started_at = Some(Instant::now());
            state.paused = false;
        }
    }

    fn stop(&mut self) {
        let mut state = self.record(TransportCall::Stop);
        state.current = None;
        state.folder = None;
        state.started_at = None;
        state.elapsed = Duration::ZERO;
        state.paused = false;
    }

    fn volume(&mut self, volume: u8) {
        let mut state = self.record(TransportCall::Volume(volume));
        state.volume = volume.min(MAX_VOLUME);
    }

    fn equalizer(&mut self, eq: Equalizer) {
        let _state = self.record(TransportCall::Equalizer(eq));
    }

    fn read_state(&mut self) -> u8 {
        let mut state = self.record(TransportCall::ReadState);
        match state.scripted.pop_front() {
            Some(reading) => reading,
            None => state.computed_state(),
        }
    }

    fn name(&self) -> &str {
        "simulated module"
    }
}

#[derive(Clone)]
pub struct ModuleProbe {
    state: Arc<Mutex<SimState>>,
}

impl ModuleProbe {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().calls.clone()
    }

    pub fn commands(&self) -> Vec<TransportCall> {
        self.lock()
            .calls
            .iter()
            .copied()
            .filter(|call| *call != TransportCall::ReadState)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn current_track(&self) -> Option<u16> {
        self.lock().current
    }

    pub fn volume(&self) -> u8 {
        self.lock().volume
    }

    pub fn script_states(&self, readings: impl IntoIterator<Item = u8>) {
        self.lock().scripted.extend(readings);
    }

    pub fn finish_track(&self) {
        let mut state = self.lock();
        state.elapsed = state.track_length;
        state.started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_track_runs_out() {
        let mut module = SimulatedModule::new(Duration::from_secs(60));
        let probe = module.probe();
        assert_eq!(module.read_state(), STATE_STOPPED);

        module.play(4);
        assert_eq!(module.read_state(), STATE_PLAYING);
        assert_eq!(probe.current_track(), Some(4));

        probe.finish_track();
        assert_eq!(module.read_state(), STATE_STOPPED);
    }

    #[test]
    fn pause_and_start_toggle_state() {
        let mut module = SimulatedModule::new(Duration::from_secs(60));
        module.play(1);
        module.pause();
        assert_eq!(module.read_state(), STATE_PAUSED);
        module.start();
        assert_eq!(module.read_state(), STATE_PLAYING);
    }

    #[test]
    fn scripted_readings_come_first() {
        let mut module = SimulatedModule::new(Duration::from_secs(60));
        module.play(1);
        module.probe().script_states([STATE_ERROR, STATE_STOPPED]);
        assert_eq!(module.read_state(), STATE_ERROR);
        assert_eq!(module.read_state(), STATE_STOPPED);
        assert_eq!(module.read_state(), STATE_PLAYING);
    }

    #[test]
    fn probe_filters_status_reads() {
        let mut module = SimulatedModule::new(Duration::from_secs(60));
        let probe = module.probe();
        module.volume(12);
        module.read_state();
        module.next();
        assert_eq!(probe.commands(), vec![TransportCall::Volume(12), TransportCall::Next]);
        assert_eq!(probe.calls().len(), 3);
        assert_eq!(probe.volume(), 12);
    }

    #[test]
    fn disabled_backend_fails_to_open() {
        let config = JukeboxConfig {
            audio_backend: AudioBackend::None,
            ..JukeboxConfig::default()
        };
        assert!(matches!(
            open_transport(&config),
            Err(JukeboxError::TransportInit(_))
        ));
    }
}
