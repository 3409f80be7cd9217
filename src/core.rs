use crate::audio::{AudioTransport, STATE_ERROR, STATE_PLAYING, STATE_STOPPED};
use crate::catalog::TrackCatalog;
use crate::command::CardAction;
use crate::config::JukeboxConfig;
use crate::error::PlaybackError;
use crate::model::{Equalizer, MAX_FOLDER, MAX_VOLUME, MIN_FOLDER, MIN_VOLUME, PlaybackState};
use crate::shuffle::ShuffleEngine;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub initial_volume: u8,
    pub equalizer: Equalizer,
    pub stop_settle: Duration,
    pub recovery_attempts: u32,
    pub recovery_interval: Duration,
}

impl ControllerOptions {
    pub fn from_config(config: &JukeboxConfig) -> Self {
        Self {
            initial_volume: config.initial_volume,
            equalizer: config.equalizer,
            stop_settle: config.stop_settle(),
            recovery_attempts: config.recovery_attempts,
            recovery_interval: config.recovery_interval(),
        }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from_config(&JukeboxConfig::default())
    }
}

// The status register trails the real playback end by one read. A stop
// counts once it has been read twice in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Idle,
    ConfirmPending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Skipped,
    Steady,
    Pending,
    Advanced(String),
    ModuleError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthOutcome {
    Healthy(u8),
    Offline,
    Recovered,
    Failed,
}

#[derive(Debug, Clone, Copy)]
struct AutoProgress {
    phase: ProgressPhase,
    previous_state: u8,
}

impl AutoProgress {
    fn armed() -> Self {
        Self {
            phase: ProgressPhase::Idle,
            previous_state: STATE_PLAYING,
        }
    }
}

pub struct PlaybackController {
    state: PlaybackState,
    catalog: TrackCatalog,
    shuffle: ShuffleEngine,
    progress: AutoProgress,
    transport: Option<Box<dyn AudioTransport>>,
    options: ControllerOptions,
}

impl PlaybackController {
    pub fn new(
        catalog: TrackCatalog,
        transport: Option<Box<dyn AudioTransport>>,
        shuffle: ShuffleEngine,
        options: ControllerOptions,
    ) -> Self {
        let mut controller = Self {
            state: PlaybackState::with_volume(options.initial_volume),
            catalog,
            shuffle,
            progress: AutoProgress::armed(),
            transport,
            options,
        };

        let volume = controller.state.volume;
        if let Some(module) = controller.transport.as_deref_mut() {
            module.equalizer(options.equalizer);
            module.volume(volume);
            info!(module = module.name(), volume, "audio module online");
        } else {
            warn!("continuing without audio module");
        }
        controller
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn catalog(&self) -> &TrackCatalog {
        &self.catalog
    }

    pub fn shuffle(&self) -> &ShuffleEngine {
        &self.shuffle
    }

    pub fn progress_phase(&self) -> ProgressPhase {
        self.progress.phase
    }

    pub fn module_online(&self) -> bool {
        self.transport.is_some()
    }

    pub fn wants_polling(&self) -> bool {
        self.state.shuffle_active && self.state.is_playing
    }

    pub fn play_track(&mut self, track: i32) -> Result<String, PlaybackError> {
        let number = self.checked_track(track)?;
        let mut out = String::new();
        if self.state.shuffle_active {
            self.leave_shuffle();
            out.push_str("SHUFFLE: Exiting shuffle mode - Playing specific track\n");
        }

        self.dispatch_track(number);
        out.push_str(&format!(
            "PLAY: Playing track #{number}\nTRACK: {}\nVolume: {}",
            self.catalog.lookup(track),
            self.state.volume
        ));
        info!(track = number, "playing track");
        Ok(out)
    }

    pub fn play_folder(&mut self, folder: i32) -> Result<String, PlaybackError> {
        let folder = u8::try_from(folder)
            .ok()
            .filter(|f| (MIN_FOLDER..=MAX_FOLDER).contains(f))
            .ok_or(PlaybackError::FolderOutOfRange(folder))?;

        self.send("play folder", |module| module.play_large_folder(folder, 1));
        self.state.is_playing = true;
        info!(folder, "playing folder");
        Ok(format!(
            "Playing from folder {folder}\nVolume: {}",
            self.state.volume
        ))
    }

    pub fn start_shuffle(&mut self) -> String {
        self.shuffle.start(self.catalog.len());
        self.state.shuffle_active = true;
        let mut out = String::from("SHUFFLE: Created new shuffled playlist\n");
        out.push_str(&self.advance_shuffle());
        self.progress = AutoProgress::armed();
        out.push_str("\nSHUFFLE: Custom shuffle mode activated - True random playback");
        out
    }

    pub fn advance_shuffle(&mut self) -> String {
        if !self.state.shuffle_active {
            return String::from("SHUFFLE: Inactive - Normal playback mode");
        }

        let size = self.catalog.len();
        let Some((track, new_cycle)) = self.shuffle.advance(size) else {
            self.leave_shuffle();
            return String::from("SHUFFLE: Catalog is empty");
        };

        let mut out = String::new();
        if new_cycle {
            out.push_str("SHUFFLE: Completed all tracks, creating new shuffle order\n");
        }
        self.dispatch_track(track);
        let position = self.shuffle.sequence().map_or(0, |seq| seq.cursor());
        out.push_str(&format!(
            "SHUFFLE: Playing track #{track} ({position}/{size}) - {}",
            self.catalog.lookup(i32::from(track))
        ));
        info!(track, position, new_cycle, "shuffle advanced");
        out
    }

    pub fn next(&mut self) -> String {
        if self.state.shuffle_active {
            return format!("NEXT: Next shuffle track\n{}", self.advance_shuffle());
        }

        self.send("next", |module| module.next());
        let current = self.state.current_track;
        if current > 0 && current < self.catalog.len() {
            self.state.current_track = current + 1;
        }
        String::from("NEXT: Next track")
    }

    pub fn previous(&mut self) -> String {
        if self.state.shuffle_active {
            let Some(track) = self.shuffle.step_back() else {
                return String::from("PREVIOUS: Nothing to go back to");
            };
            self.dispatch_track(track);
            return format!(
                "PREVIOUS: Previous shuffle track #{track} - {}",
                self.catalog.lookup(i32::from(track))
            );
        }

        self.send("previous", |module| module.previous());
        if self.state.current_track > 1 {
            self.state.current_track -= 1;
        }
        String::from("PREVIOUS: Previous track")
    }

    pub fn toggle_play_pause(&mut self) -> String {
        if self.state.is_playing {
            self.send("pause", |module| module.pause());
            self.state.is_playing = false;
            String::from("PAUSE: Playback paused")
        } else {
            self.send("start", |module| module.start());
            self.state.is_playing = true;
            String::from("PLAY: Playback resumed")
        }
    }

    pub fn stop(&mut self) -> String {
        self.send("stop", |module| module.stop());
        self.state.is_playing = false;
        self.state.current_track = 0;
        if self.state.shuffle_active {
            self.leave_shuffle();
            String::from("STOP: Exiting shuffle mode - Current song stopped")
        } else {
            String::from("STOP: Current song stopped")
        }
    }

    pub fn set_volume(&mut self, requested: i32) -> String {
        let clamped = requested.clamp(i32::from(MIN_VOLUME), i32::from(MAX_VOLUME)) as u8;
        if clamped == self.state.volume && requested != i32::from(clamped) {
            return boundary_message(requested > i32::from(MAX_VOLUME));
        }

        self.apply_volume(clamped);
        format!("VOLUME: Volume set to: {clamped}")
    }

    pub fn volume_up(&mut self) -> String {
        if self.state.volume >= MAX_VOLUME {
            return boundary_message(true);
        }
        self.apply_volume(self.state.volume + 1);
        format!("VOLUME: Volume up: {}", self.state.volume)
    }

    pub fn volume_down(&mut self) -> String {
        if self.state.volume <= MIN_VOLUME {
            return boundary_message(false);
        }
        self.apply_volume(self.state.volume - 1);
        format!("VOLUME: Volume down: {}", self.state.volume)
    }

    pub fn volume_report(&self) -> String {
        format!("Current volume: {}", self.state.volume)
    }

    pub fn dispatch_card_value(&mut self, value: i64) -> Result<String, PlaybackError> {
        match CardAction::from_value(value)? {
            CardAction::Shuffle => Ok(self.start_shuffle()),
            CardAction::Folder(folder) => self.play_folder(i32::from(folder)),
            CardAction::Track(track) => self.play_track(track),
        }
    }

    pub fn poll_for_track_end(&mut self) -> PollOutcome {
        if !self.wants_polling() {
            return PollOutcome::Skipped;
        }
        let Some(reading) = self.read_state() else {
            return PollOutcome::Skipped;
        };
        if reading == STATE_ERROR {
            return PollOutcome::ModuleError;
        }

        let outcome = match self.progress.phase {
            ProgressPhase::ConfirmPending => {
                self.progress.phase = ProgressPhase::Idle;
                if reading == STATE_STOPPED {
                    info!("track finished, advancing shuffle");
                    let next = self.advance_shuffle();
                    PollOutcome::Advanced(format!(
                        "SHUFFLE: Song finished, playing next track\n{next}"
                    ))
                } else {
                    debug!(reading, "stop reading was transient");
                    PollOutcome::Steady
                }
            }
            ProgressPhase::Idle => {
                if self.progress.previous_state != STATE_STOPPED && reading == STATE_STOPPED {
                    self.progress.phase = ProgressPhase::ConfirmPending;
                    PollOutcome::Pending
                } else {
                    PollOutcome::Steady
                }
            }
        };
        self.progress.previous_state = reading;
        outcome
    }

    pub fn check_health(&mut self) -> HealthOutcome {
        let Some(reading) = self.read_state() else {
            return HealthOutcome::Offline;
        };
        debug!(reading, "module health check");
        if reading != STATE_ERROR {
            return HealthOutcome::Healthy(reading);
        }
        if self.recover_module() {
            HealthOutcome::Recovered
        } else {
            HealthOutcome::Failed
        }
    }

    pub fn recover_module(&mut self) -> bool {
        warn!("module reports error state, attempting recovery");
        for attempt in 1..=self.options.recovery_attempts {
            let reading = self.read_state();
            debug!(attempt, ?reading, "recovery attempt");
            if reading.is_some_and(|state| state != STATE_ERROR) {
                info!(attempt, "module recovered");
                return true;
            }
            if !self.options.recovery_interval.is_zero() {
                thread::sleep(self.options.recovery_interval);
            }
        }
        error!(
            attempts = self.options.recovery_attempts,
            "module recovery failed"
        );
        false
    }

    pub fn status_report(&mut self) -> String {
        let Some(reading) = self.read_state() else {
            return String::from("DFPlayer state: unavailable (module offline)");
        };
        let mut out = format!("DFPlayer state: {reading}");
        if self.state.shuffle_active {
            let check = match self.progress.phase {
                ProgressPhase::ConfirmPending => "WAITING",
                ProgressPhase::Idle => "READY",
            };
            out.push_str(&format!(
                " (Shuffle: ON, Auto-check: {check}, Previous: {})",
                self.progress.previous_state
            ));
        }
        out
    }

    pub fn shuffle_status(&self) -> String {
        match self.shuffle.sequence() {
            Some(seq) if self.state.shuffle_active => format!(
                "SHUFFLE: Active - Track {} of {} (Current: #{} - {})",
                seq.cursor(),
                seq.len(),
                self.state.current_track,
                self.catalog.lookup(i32::from(self.state.current_track))
            ),
            _ => String::from("SHUFFLE: Inactive - Normal playback mode"),
        }
    }

    fn checked_track(&self, track: i32) -> Result<u16, PlaybackError> {
        if self.catalog.contains(track) {
            Ok(track as u16)
        } else {
            Err(PlaybackError::TrackOutOfRange {
                track,
                max: self.catalog.len(),
            })
        }
    }

    fn dispatch_track(&mut self, track: u16) {
        self.send("stop", |module| module.stop());
        if !self.options.stop_settle.is_zero() {
            thread::sleep(self.options.stop_settle);
        }
        self.send("play", |module| module.play(track));
        self.state.current_track = track;
        self.state.is_playing = true;
    }

    fn leave_shuffle(&mut self) {
        self.state.shuffle_active = false;
        self.shuffle.stop();
        self.progress = AutoProgress::armed();
    }

    fn apply_volume(&mut self, volume: u8) {
        self.send("volume", |module| module.volume(volume));
        self.state.volume = volume;
        info!(volume, "volume changed");
    }

    fn read_state(&mut self) -> Option<u8> {
        self.transport.as_deref_mut().map(|module| module.read_state())
    }

    fn send(&mut self, action: &str, write: impl FnOnce(&mut dyn AudioTransport)) {
        match self.transport.as_deref_mut() {
            Some(module) => write(module),
            None => warn!(action, "audio module offline, command skipped"),
        }
    }
}

fn boundary_message(at_max: bool) -> String {
    if at_max {
        format!("VOLUME: Volume already at maximum ({MAX_VOLUME})")
    } else {
        format!("VOLUME: Volume already at minimum ({MIN_VOLUME})")
    }
}
