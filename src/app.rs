use crate::audio::open_transport;
use crate::buttons::{ButtonPanel, ButtonTracker, SimulatedPanel};
use crate::card::{self, CardDeck, CardReader, CardUid, SimulatedReader};
use crate::catalog::TrackCatalog;
use crate::command::{Command, ConsoleInput, JUKEBOX_HELP, PROGRAMMING_HELP, parse_console_line};
use crate::config::JukeboxConfig;
use crate::console::ConsoleInputs;
use crate::core::{ControllerOptions, HealthOutcome, PlaybackController, PollOutcome};
use crate::mode::{AutoWriter, ModeState, ProgrammingMode};
use crate::shuffle::ShuffleEngine;
use crate::web::{WebCommand, WebReply, WebRequest};
use anyhow::Result;
use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

const PROGRAMMING_REFUSAL: &str =
    "Command not available in programming mode. Type 'jukebox' to return to jukebox mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    ResetCommand,
    ResetButton,
    ModuleError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    pub poll_interval: Duration,
    pub health_check_interval: Option<Duration>,
    pub manual_write_timeout: Duration,
    pub idle_sleep: Duration,
}

impl LoopTiming {
    pub fn from_config(config: &JukeboxConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            health_check_interval: config.health_check_interval(),
            manual_write_timeout: config.manual_write_timeout(),
            idle_sleep: Duration::from_millis(10),
        }
    }
}

pub struct JukeboxParts {
    pub controller: PlaybackController,
    pub reader: Box<dyn CardReader>,
    pub buttons: Box<dyn ButtonPanel>,
    pub console: Receiver<String>,
    pub web: Option<Receiver<WebRequest>>,
    pub timing: LoopTiming,
}

pub struct Jukebox {
    controller: PlaybackController,
    mode: ModeState,
    reader: Box<dyn CardReader>,
    buttons: Box<dyn ButtonPanel>,
    tracker: ButtonTracker,
    console: Receiver<String>,
    web: Option<Receiver<WebRequest>>,
    timing: LoopTiming,
    last_poll: Instant,
    last_health: Instant,
    restart: Option<RestartReason>,
}

impl Jukebox {
    pub fn new(parts: JukeboxParts) -> Self {
        let now = Instant::now();
        Self {
            controller: parts.controller,
            mode: ModeState::default(),
            reader: parts.reader,
            buttons: parts.buttons,
            tracker: ButtonTracker::new(),
            console: parts.console,
            web: parts.web,
            timing: parts.timing,
            last_poll: now,
            last_health: now,
            restart: None,
        }
    }

    pub fn from_config(
        config: &JukeboxConfig,
        root: &Path,
        inputs: ConsoleInputs,
        web: Option<Receiver<WebRequest>>,
    ) -> Result<Self> {
        let catalog = match &config.catalog {
            Some(path) => TrackCatalog::load(path)?,
            None => TrackCatalog::builtin(),
        };

        let transport = match open_transport(config) {
            Ok(transport) => Some(transport),
            Err(err) => {
                warn!(error = %err, "audio module not found");
                None
            }
        };

        let deck_path = config.card_deck_path(root);
        let deck = CardDeck::load(&deck_path)?;
        info!(cards = deck.cards.len(), path = %deck_path.display(), "card deck loaded");

        let controller = PlaybackController::new(
            catalog,
            transport,
            ShuffleEngine::new(),
            ControllerOptions::from_config(config),
        );

        Ok(Self::new(JukeboxParts {
            controller,
            reader: Box::new(SimulatedReader::new(deck, Some(deck_path), inputs.taps)),
            buttons: Box::new(SimulatedPanel::new(inputs.presses)),
            console: inputs.lines,
            web,
            timing: LoopTiming::from_config(config),
        }))
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn mode(&self) -> ModeState {
        self.mode
    }

    pub fn pending_restart(&self) -> Option<RestartReason> {
        self.restart
    }

    pub fn execute(&mut self, command: Command) -> String {
        if !self.mode.accepts(command) {
            warn!(?command, "refused in programming mode");
            return String::from(PROGRAMMING_REFUSAL);
        }

        let player = &mut self.controller;
        match command {
            Command::PlayPauseToggle => player.toggle_play_pause(),
            Command::Next => player.next(),
            Command::Previous => player.previous(),
            Command::ShuffleStart => player.start_shuffle(),
            Command::SystemReset => {
                info!("reset requested");
                self.restart = Some(RestartReason::ResetCommand);
                String::from("Resetting system...")
            }
            Command::PlayTrack(track) => player
                .play_track(track)
                .unwrap_or_else(|err| err.to_string()),
            Command::PlayFolder(folder) => player
                .play_folder(i32::from(folder))
                .unwrap_or_else(|err| err.to_string()),
            Command::VolumeUp => player.volume_up(),
            Command::VolumeDown => player.volume_down(),
            Command::VolumeQuery => player.volume_report(),
            Command::ListSongs => player.catalog().song_list(),
            Command::Stop => player.stop(),
            Command::StatusQuery => player.status_report(),
            Command::ShuffleStatusQuery => player.shuffle_status(),
            Command::EnterProgramming => self.mode.enter_programming(),
            Command::EnterJukebox => self.mode.return_to_jukebox(),
        }
    }

    pub fn handle_console_line(&mut self, line: &str) -> String {
        if let Some(reply) = self.mode.handle_line(line) {
            return reply;
        }

        match parse_console_line(line) {
            ConsoleInput::Command(command) => self.execute(command),
            ConsoleInput::CardValue(value) => self.dispatch_value(value),
            ConsoleInput::Empty => String::new(),
            ConsoleInput::Unknown(input) => {
                warn!(%input, "unknown console input");
                String::from(JUKEBOX_HELP)
            }
        }
    }

    pub fn handle_card(&mut self, uid: &CardUid) -> String {
        info!(uid = %uid.to_hex(), "card presented");
        let reply = match self.mode {
            ModeState::Jukebox => self.play_card(uid),
            ModeState::Programming(ProgrammingMode::None) => String::from(PROGRAMMING_HELP),
            ModeState::Programming(ProgrammingMode::Auto(AutoWriter::AwaitingStart)) => {
                String::from("Please enter the starting number first")
            }
            ModeState::Programming(ProgrammingMode::Auto(AutoWriter::Ready { next })) => {
                self.auto_write(uid, next)
            }
            ModeState::Programming(ProgrammingMode::Manual) => self.manual_write(uid),
            ModeState::Programming(ProgrammingMode::Read) => self.read_card(uid),
        };
        self.reader.halt(uid);
        reply
    }

    pub fn handle_web(&mut self, command: WebCommand) -> WebReply {
        match command {
            WebCommand::Char(ch) => match Command::from_console_char(ch) {
                Some(command) => WebReply::accepted(self.execute(command)),
                None => WebReply::accepted(JUKEBOX_HELP),
            },
            WebCommand::Jukebox => WebReply::accepted(self.execute(Command::EnterJukebox)),
            WebCommand::PlayTrack(track) => {
                if !self.mode.accepts(Command::PlayTrack(track)) {
                    return WebReply::rejected(PROGRAMMING_REFUSAL);
                }
                match self.controller.play_track(track) {
                    Ok(text) => WebReply::accepted(text),
                    Err(err) => {
                        warn!(track, "web play rejected");
                        WebReply::rejected(err.to_string())
                    }
                }
            }
        }
    }

    pub fn tick(&mut self, now: Instant) -> Vec<String> {
        let mut out = Vec::new();

        if self.mode.is_jukebox() && now.duration_since(self.last_poll) >= self.timing.poll_interval
        {
            self.last_poll = now;
            match self.controller.poll_for_track_end() {
                PollOutcome::Advanced(text) => out.push(text),
                PollOutcome::ModuleError => {
                    if !self.controller.recover_module() {
                        out.push(self.module_failed());
                    }
                }
                PollOutcome::Skipped | PollOutcome::Steady | PollOutcome::Pending => {}
            }
        }

        if let Some(interval) = self.timing.health_check_interval
            && self.restart.is_none()
            && now.duration_since(self.last_health) >= interval
        {
            self.last_health = now;
            match self.controller.check_health() {
                HealthOutcome::Failed => out.push(self.module_failed()),
                HealthOutcome::Recovered => out.push(String::from("DFPlayer recovered")),
                HealthOutcome::Healthy(_) | HealthOutcome::Offline => {}
            }
        }
        out
    }

    pub fn run_once(&mut self, now: Instant) -> Option<RestartReason> {
        let levels = self.buttons.sample();
        for command in self.tracker.update(levels) {
            if !self.mode.is_jukebox() {
                continue;
            }
            if command == Command::SystemReset {
                info!("reset button pressed");
                emit("Reset button pressed - Restarting...");
                self.restart = Some(RestartReason::ResetButton);
                return self.restart;
            }
            let reply = self.execute(command);
            emit(&reply);
        }

        if let Some(uid) = self.reader.poll_new_card() {
            let reply = self.handle_card(&uid);
            emit(&reply);
        }

        let lines: Vec<String> = self.console.try_iter().collect();
        for line in lines {
            let reply = self.handle_console_line(&line);
            emit(&reply);
            if self.restart.is_some() {
                return self.restart;
            }
        }

        let requests: Vec<WebRequest> = self
            .web
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default();
        for request in requests {
            let reply = self.handle_web(request.command);
            emit(&reply.text);
            let _ = request.reply.send(reply);
            if self.restart.is_some() {
                return self.restart;
            }
        }

        for text in self.tick(now) {
            emit(&text);
        }
        self.restart
    }

    pub fn run(&mut self) -> RestartReason {
        info!("jukebox ready");
        emit("JUKEBOX: Place an RFID card on the reader to play a song");
        loop {
            if let Some(reason) = self.run_once(Instant::now()) {
                info!(?reason, "main loop stopping");
                return reason;
            }
            thread::sleep(self.timing.idle_sleep);
        }
    }

    fn module_failed(&mut self) -> String {
        error!("audio module unrecoverable, restarting");
        self.restart = Some(RestartReason::ModuleError);
        String::from("ERROR: DFPlayer not responding - Restarting...")
    }

    fn dispatch_value(&mut self, value: i64) -> String {
        match self.controller.dispatch_card_value(value) {
            Ok(text) => text,
            Err(err) => {
                warn!(value, error = %err, "card value rejected");
                err.to_string()
            }
        }
    }

    fn play_card(&mut self, uid: &CardUid) -> String {
        let mut out = format!("CARD: **Card Detected**\nCard UID:{uid}\n");
        let block = match self.reader.read_block(uid) {
            Ok(block) => block,
            Err(err) => {
                warn!(error = %err, "card read failed");
                out.push_str(&format!("Reading failed: {err}"));
                return out;
            }
        };

        match card::decode(&block) {
            Ok(value) => {
                out.push_str(&format!(
                    "Reading number: {value} -> {}\n**End Reading**\n",
                    self.lookup(value)
                ));
                out.push_str(&self.dispatch_value(value));
            }
            Err(err) => {
                warn!(error = %err, "card holds no usable number");
                out.push_str("No number found on card");
            }
        }
        out
    }

    fn auto_write(&mut self, uid: &CardUid, value: i64) -> String {
        match self.write_value(uid, value) {
            Ok(()) => {
                self.mode.auto_written();
                format!(
                    "SUCCESS: Card written successfully! Number: {value} ({})\nNext number: {}\nPut a new card on the reader...",
                    self.lookup(value),
                    value.saturating_add(1)
                )
            }
            Err(message) => message,
        }
    }

    fn manual_write(&mut self, uid: &CardUid) -> String {
        emit(&format!(
            "Card UID:{uid}\nType any number and hit send/enter (or type 'jukebox' to return):"
        ));
        let input = match self.console.recv_timeout(self.timing.manual_write_timeout) {
            Ok(line) => line.trim().to_string(),
            Err(RecvTimeoutError::Timeout) => return String::from("Timeout - no number entered"),
            Err(RecvTimeoutError::Disconnected) => {
                return String::from("Console closed - write aborted");
            }
        };

        if input == "jukebox" {
            self.mode.return_to_jukebox();
            return String::from("Returning to jukebox mode");
        }
        let Ok(value) = input.parse::<i64>() else {
            warn!(%input, "manual write input is not a number");
            return format!("Invalid number {input:?} - write aborted");
        };

        match self.write_value(uid, value) {
            Ok(()) => format!(
                "SUCCESS: Card written successfully with: {value} ({})\nPut a new card on the reader to write another number",
                self.lookup(value)
            ),
            Err(message) => message,
        }
    }

    fn read_card(&mut self, uid: &CardUid) -> String {
        let block = match self.reader.read_block(uid) {
            Ok(block) => block,
            Err(err) => {
                warn!(error = %err, "card read failed");
                return format!("Reading failed: {err}");
            }
        };
        match card::decode(&block) {
            Ok(value) => format!(
                "Card UID:{uid}\nNumber stored on card: {value} ({})",
                self.lookup(value)
            ),
            Err(_) => String::from("No number found or card is empty"),
        }
    }

    fn write_value(&mut self, uid: &CardUid, value: i64) -> Result<(), String> {
        let block = card::encode(value).map_err(|err| {
            warn!(value, error = %err, "value does not fit on a card");
            format!("Write failed: {err}")
        })?;
        self.reader.write_block(uid, &block).map_err(|err| {
            warn!(value, error = %err, "card write failed");
            format!("Write failed: {err}")
        })?;
        info!(value, uid = %uid.to_hex(), "card written");
        Ok(())
    }

    fn lookup(&self, value: i64) -> String {
        i32::try_from(value)
            .map(|number| self.controller.catalog().lookup(number))
            .unwrap_or_else(|_| format!("Unknown Track #{value}"))
    }
}

fn emit(text: &str) {
    if !text.is_empty() {
        println!("{text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ModuleProbe, STATE_ERROR, STATE_STOPPED, SimulatedModule, TransportCall};
    use crate::buttons::{Button, IdlePanel};
    use std::sync::mpsc::{self, Sender};

    struct Rig {
        jukebox: Jukebox,
        probe: ModuleProbe,
        console: Sender<String>,
        taps: Sender<CardUid>,
        presses: Sender<Button>,
    }

    fn timing() -> LoopTiming {
        LoopTiming {
            poll_interval: Duration::ZERO,
            health_check_interval: None,
            manual_write_timeout: Duration::from_millis(50),
            idle_sleep: Duration::ZERO,
        }
    }

    fn rig() -> Rig {
        let module = SimulatedModule::new(Duration::from_secs(120));
        let probe = module.probe();
        let controller = PlaybackController::new(
            TrackCatalog::builtin(),
            Some(Box::new(module)),
            ShuffleEngine::seeded(9),
            ControllerOptions {
                stop_settle: Duration::ZERO,
                recovery_interval: Duration::ZERO,
                ..ControllerOptions::default()
            },
        );
        let (console, console_rx) = mpsc::channel();
        let (taps, taps_rx) = mpsc::channel();
        let (presses, presses_rx) = mpsc::channel();
        let jukebox = Jukebox::new(JukeboxParts {
            controller,
            reader: Box::new(SimulatedReader::new(CardDeck::default(), None, taps_rx)),
            buttons: Box::new(SimulatedPanel::new(presses_rx)),
            console: console_rx,
            web: None,
            timing: timing(),
        });
        probe.clear_calls();
        Rig {
            jukebox,
            probe,
            console,
            taps,
            presses,
        }
    }

    fn uid(hex: &str) -> CardUid {
        CardUid::parse_hex(hex).expect("uid")
    }

    #[test]
    fn console_letters_drive_the_player() {
        let mut rig = rig();
        let reply = rig.jukebox.handle_console_line("h");
        assert!(reply.contains("Custom shuffle mode activated"));
        assert!(rig.jukebox.controller().state().shuffle_active);

        let reply = rig.jukebox.handle_console_line("x");
        assert_eq!(reply, "STOP: Exiting shuffle mode - Current song stopped");
        assert_eq!(rig.jukebox.handle_console_line("dance"), JUKEBOX_HELP);
    }

    #[test]
    fn typed_number_behaves_like_a_card() {
        let mut rig = rig();
        rig.jukebox.handle_console_line("-3");
        assert_eq!(rig.probe.commands(), vec![TransportCall::PlayLargeFolder(3, 1)]);
        let reply = rig.jukebox.handle_console_line("99");
        assert!(reply.contains("Invalid song number"));
    }

    #[test]
    fn programming_refuses_transport_from_every_channel() {
        let mut rig = rig();
        rig.jukebox.handle_console_line("program");
        rig.probe.clear_calls();

        assert_eq!(rig.jukebox.execute(Command::Next), PROGRAMMING_REFUSAL);
        let reply = rig.jukebox.handle_web(WebCommand::PlayTrack(4));
        assert!(!reply.accepted);
        let reply = rig.jukebox.handle_web(WebCommand::Char('+'));
        assert_eq!(reply.text, PROGRAMMING_REFUSAL);

        rig.presses.send(Button::Next).expect("press");
        rig.jukebox.run_once(Instant::now());
        assert!(rig.probe.commands().is_empty());

        let reply = rig.jukebox.handle_web(WebCommand::Char('v'));
        assert_eq!(reply.text, "Current volume: 30");
    }

    #[test]
    fn console_queries_and_reset_work_while_programming() {
        let mut rig = rig();
        rig.jukebox.handle_console_line("program");
        rig.jukebox.handle_console_line("read");

        assert_eq!(rig.jukebox.handle_console_line("v"), "Current volume: 30");
        assert_eq!(
            rig.jukebox.handle_console_line("v"),
            rig.jukebox.handle_web(WebCommand::Char('v')).text
        );
        assert_eq!(rig.jukebox.handle_console_line("p"), "Already in programming mode");
        assert_eq!(rig.jukebox.handle_console_line("n"), PROGRAMMING_REFUSAL);
        assert!(rig.jukebox.handle_console_line("l").starts_with("=== Song List ==="));
        assert_eq!(rig.jukebox.mode(), ModeState::Programming(ProgrammingMode::Read));

        rig.console.send(String::from("r")).expect("send");
        assert_eq!(
            rig.jukebox.run_once(Instant::now()),
            Some(RestartReason::ResetCommand)
        );
    }

    #[test]
    fn jukebox_card_plays_its_track() {
        let mut rig = rig();
        let card = uid("0a1b2c3d");
        rig.jukebox.reader.write_block(&card, &card::encode(5).expect("encode")).expect("write");

        let reply = rig.jukebox.handle_card(&card);
        assert!(reply.contains("Card UID: 0A 1B 2C 3D"));
        assert!(reply.contains("Reading number: 5 -> In Da Club - 50 Cent"));
        assert_eq!(rig.jukebox.controller().state().current_track, 5);
    }

    #[test]
    fn blank_card_is_reported() {
        let mut rig = rig();
        let reply = rig.jukebox.handle_card(&uid("01"));
        assert!(reply.ends_with("No number found on card"));
        assert!(rig.probe.commands().is_empty());
    }

    #[test]
    fn auto_mode_writes_consecutive_numbers() {
        let mut rig = rig();
        for line in ["program", "auto", "12"] {
            rig.jukebox.handle_console_line(line);
        }

        let first = uid("01");
        let second = uid("02");
        let reply = rig.jukebox.handle_card(&first);
        assert!(reply.contains("Number: 12 (Yakety Yak - The Coasters)"));
        rig.jukebox.handle_card(&second);

        assert_eq!(card::decode(&rig.jukebox.reader.read_block(&first).expect("read")), Ok(12));
        assert_eq!(card::decode(&rig.jukebox.reader.read_block(&second).expect("read")), Ok(13));
        assert_eq!(
            rig.jukebox.mode(),
            ModeState::Programming(ProgrammingMode::Auto(AutoWriter::Ready { next: 14 }))
        );
    }

    #[test]
    fn manual_mode_writes_typed_number() {
        let mut rig = rig();
        rig.jukebox.handle_console_line("program");
        rig.jukebox.handle_console_line("manual");

        let card = uid("0a");
        rig.console.send(String::from("-7")).expect("send");
        let reply = rig.jukebox.handle_card(&card);
        assert!(reply.starts_with("SUCCESS: Card written successfully with: -7"));
        assert_eq!(card::decode(&rig.jukebox.reader.read_block(&card).expect("read")), Ok(-7));
    }

    #[test]
    fn manual_mode_times_out() {
        let mut rig = rig();
        rig.jukebox.handle_console_line("program");
        rig.jukebox.handle_console_line("manual");
        let card = uid("0a");

        assert_eq!(rig.jukebox.handle_card(&card), "Timeout - no number entered");
        assert_eq!(
            card::decode(&rig.jukebox.reader.read_block(&card).expect("read")),
            Err(crate::error::CardError::Empty)
        );
        assert_eq!(rig.jukebox.mode(), ModeState::Programming(ProgrammingMode::Manual));
    }

    #[test]
    fn manual_mode_jukebox_keyword_aborts() {
        let mut rig = rig();
        rig.jukebox.handle_console_line("program");
        rig.jukebox.handle_console_line("manual");
        rig.console.send(String::from("jukebox")).expect("send");

        assert_eq!(rig.jukebox.handle_card(&uid("0a")), "Returning to jukebox mode");
        assert!(rig.jukebox.mode().is_jukebox());
    }

    #[test]
    fn manual_mode_rejects_text() {
        let mut rig = rig();
        rig.jukebox.handle_console_line("program");
        rig.jukebox.handle_console_line("manual");
        rig.console.send(String::from("five")).expect("send");
        let reply = rig.jukebox.handle_card(&uid("0a"));
        assert!(reply.starts_with("Invalid number"));
    }

    #[test]
    fn read_mode_reports_stored_number() {
        let mut rig = rig();
        let card = uid("0b");
        rig.jukebox.reader.write_block(&card, &card::encode(1).expect("encode")).expect("write");
        rig.jukebox.handle_console_line("program");
        rig.jukebox.handle_console_line("read");

        let reply = rig.jukebox.handle_card(&card);
        assert!(reply.ends_with("Number stored on card: 1 (Did Jesus Have a Baby Sister - Dory Previn)"));
        assert_eq!(
            rig.jukebox.handle_card(&uid("0c")),
            "No number found or card is empty"
        );
        assert!(rig.probe.commands().is_empty());
    }

    #[test]
    fn run_once_routes_taps_and_console() {
        let mut rig = rig();
        let card = uid("0d");
        rig.jukebox.reader.write_block(&card, &card::encode(-7).expect("encode")).expect("write");
        rig.taps.send(card).expect("tap");
        rig.console.send(String::from("+")).expect("send");

        assert_eq!(rig.jukebox.run_once(Instant::now()), None);
        assert!(rig.jukebox.controller().state().shuffle_active);
        assert_eq!(rig.jukebox.controller().state().volume, 30);
    }

    #[test]
    fn reset_command_and_button_request_restart() {
        let mut rig = rig();
        rig.console.send(String::from("r")).expect("send");
        assert_eq!(
            rig.jukebox.run_once(Instant::now()),
            Some(RestartReason::ResetCommand)
        );

        let mut rig = self::rig();
        rig.presses.send(Button::Reset).expect("press");
        assert_eq!(
            rig.jukebox.run_once(Instant::now()),
            Some(RestartReason::ResetButton)
        );
    }

    #[test]
    fn tick_advances_shuffle_after_confirmed_stop() {
        let mut rig = rig();
        rig.jukebox.execute(Command::ShuffleStart);
        let first = rig.jukebox.controller().state().current_track;
        rig.probe.script_states([STATE_STOPPED, STATE_STOPPED]);

        assert!(rig.jukebox.tick(Instant::now()).is_empty());
        let out = rig.jukebox.tick(Instant::now());
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("SHUFFLE: Song finished"));
        assert_ne!(rig.jukebox.controller().state().current_track, first);
    }

    #[test]
    fn unrecoverable_module_requests_restart() {
        let mut rig = rig();
        rig.jukebox.execute(Command::ShuffleStart);
        rig.probe.script_states([STATE_ERROR; 11]);
        let out = rig.jukebox.tick(Instant::now());
        assert_eq!(out, vec![String::from("ERROR: DFPlayer not responding - Restarting...")]);
        assert_eq!(rig.jukebox.pending_restart(), Some(RestartReason::ModuleError));
    }

    #[test]
    fn health_check_runs_on_its_interval() {
        let mut rig = rig();
        rig.jukebox.timing.health_check_interval = Some(Duration::from_secs(5));
        let start = rig.jukebox.last_health;

        rig.jukebox.tick(start + Duration::from_secs(1));
        assert!(rig.probe.calls().is_empty());

        rig.probe.script_states([STATE_ERROR, STATE_ERROR, STATE_STOPPED]);
        let out = rig.jukebox.tick(start + Duration::from_secs(6));
        assert_eq!(out, vec![String::from("DFPlayer recovered")]);
        assert_eq!(rig.jukebox.pending_restart(), None);
    }

    #[test]
    fn web_commands_share_the_console_table() {
        let mut rig = rig();
        let reply = rig.jukebox.handle_web(WebCommand::PlayTrack(7));
        assert!(reply.accepted);
        assert_eq!(rig.jukebox.controller().state().current_track, 7);

        let reply = rig.jukebox.handle_web(WebCommand::PlayTrack(0));
        assert!(!reply.accepted);
        assert_eq!(reply.text, "ERROR: Invalid song number 0. Must be 1-41.");

        let reply = rig.jukebox.handle_web(WebCommand::Char('q'));
        assert_eq!(reply.text, JUKEBOX_HELP);
    }

    #[test]
    fn idle_panel_never_fires() {
        let mut rig = rig();
        rig.jukebox.buttons = Box::new(IdlePanel);
        assert_eq!(rig.jukebox.run_once(Instant::now()), None);
        assert!(rig.probe.commands().is_empty());
    }
}
