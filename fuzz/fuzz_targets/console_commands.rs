#![no_main]

use libfuzzer_sys::fuzz_target;
use rfid_jukebox::app::{Jukebox, JukeboxParts, LoopTiming};
use rfid_jukebox::audio::SimulatedModule;
use rfid_jukebox::buttons::IdlePanel;
use rfid_jukebox::card::{self, CardDeck, SimulatedReader};
use rfid_jukebox::catalog::TrackCatalog;
use rfid_jukebox::core::{ControllerOptions, PlaybackController};
use rfid_jukebox::model::MAX_VOLUME;
use rfid_jukebox::shuffle::ShuffleEngine;
use std::sync::mpsc;
use std::time::{Duration, Instant};

fuzz_target!(|data: &[u8]| {
    let _ = card::decode(data);

    let controller = PlaybackController::new(
        TrackCatalog::builtin(),
        Some(Box::new(SimulatedModule::new(Duration::from_secs(1)))),
        ShuffleEngine::seeded(data.len() as u64),
        ControllerOptions {
            stop_settle: Duration::ZERO,
            recovery_interval: Duration::ZERO,
            ..ControllerOptions::default()
        },
    );
    let (_console_tx, console) = mpsc::channel();
    let (_taps_tx, taps) = mpsc::channel();
    let mut jukebox = Jukebox::new(JukeboxParts {
        controller,
        reader: Box::new(SimulatedReader::new(CardDeck::default(), None, taps)),
        buttons: Box::new(IdlePanel),
        console,
        web: None,
        timing: LoopTiming {
            poll_interval: Duration::ZERO,
            health_check_interval: None,
            manual_write_timeout: Duration::ZERO,
            idle_sleep: Duration::ZERO,
        },
    });

    let text = String::from_utf8_lossy(data);
    for line in text.lines() {
        let _ = jukebox.handle_console_line(line);
        let _ = jukebox.tick(Instant::now());

        let state = jukebox.controller().state();
        assert!(state.volume <= MAX_VOLUME);
        assert!(state.current_track <= jukebox.controller().catalog().len());
    }
});
