use crate::buttons::Button;
use crate::card::CardUid;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

pub struct ConsoleInputs {
    pub lines: Receiver<String>,
    pub taps: Receiver<CardUid>,
    pub presses: Receiver<Button>,
}

struct Routes {
    lines: Sender<String>,
    taps: Sender<CardUid>,
    presses: Sender<Button>,
}

#[derive(Clone)]
pub struct ConsoleRouter {
    routes: Arc<Mutex<Option<Routes>>>,
}

impl ConsoleRouter {
    pub fn new() -> Self {
        Self {
            routes: Arc::new(Mutex::new(None)),
        }
    }

    pub fn connect(&self) -> ConsoleInputs {
        let (lines_tx, lines) = mpsc::channel();
        let (taps_tx, taps) = mpsc::channel();
        let (presses_tx, presses) = mpsc::channel();
        *self.lock() = Some(Routes {
            lines: lines_tx,
            taps: taps_tx,
            presses: presses_tx,
        });
        ConsoleInputs {
            lines,
            taps,
            presses,
        }
    }

    pub fn route(&self, line: &str) {
        let guard = self.lock();
        let Some(routes) = guard.as_ref() else {
            return;
        };

        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("tap ") {
            match CardUid::parse_hex(rest) {
                Some(uid) => {
                    info!(uid = %uid.to_hex(), "simulated card tap");
                    let _ = routes.taps.send(uid);
                }
                None => warn!(input = rest, "tap needs a hex card uid"),
            }
            return;
        }
        if let Some(rest) = trimmed.strip_prefix("press ") {
            match Button::parse(rest) {
                Some(button) => {
                    let _ = routes.presses.send(button);
                }
                None => warn!(input = rest, "unknown button"),
            }
            return;
        }

        let _ = routes.lines.send(trimmed.to_string());
    }

    fn lock(&self) -> MutexGuard<'_, Option<Routes>> {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ConsoleRouter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn pump(reader: impl BufRead, router: &ConsoleRouter) {
    for line in reader.lines() {
        match line {
            Ok(line) => router.route(&line),
            Err(err) => {
                warn!(error = %err, "console read failed");
                break;
            }
        }
    }
    info!("console input closed");
}

pub fn spawn_reader(router: ConsoleRouter) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        pump(stdin.lock(), &router);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn lines_are_split_by_kind() {
        let router = ConsoleRouter::new();
        let inputs = router.connect();
        pump(
            Cursor::new("s\ntap 04 a1 0b\npress next\n 12 \ntap zz\npress eject\n"),
            &router,
        );

        let lines: Vec<String> = inputs.lines.try_iter().collect();
        assert_eq!(lines, vec![String::from("s"), String::from("12")]);
        let taps: Vec<CardUid> = inputs.taps.try_iter().collect();
        assert_eq!(taps, vec![CardUid::new(vec![0x04, 0xa1, 0x0b])]);
        let presses: Vec<Button> = inputs.presses.try_iter().collect();
        assert_eq!(presses, vec![Button::Next]);
    }

    #[test]
    fn reconnect_moves_input_to_new_receivers() {
        let router = ConsoleRouter::new();
        let first = router.connect();
        let second = router.connect();
        router.route("n");
        assert!(first.lines.try_recv().is_err());
        assert_eq!(second.lines.try_recv().ok(), Some(String::from("n")));
    }

    #[test]
    fn unconnected_router_drops_input() {
        let router = ConsoleRouter::new();
        router.route("n");
    }
}
