use crate::command::Command;
use std::sync::mpsc::Receiver;

// Active-low with pull-ups: `true` means released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonLevels {
    pub play_pause: bool,
    pub shuffle: bool,
    pub next: bool,
    pub previous: bool,
    pub reset: bool,
}

impl ButtonLevels {
    pub const RELEASED: Self = Self {
        play_pause: true,
        shuffle: true,
        next: true,
        previous: true,
        reset: true,
    };

    pub fn pressed(button: Button) -> Self {
        let mut levels = Self::RELEASED;
        match button {
            Button::PlayPause => levels.play_pause = false,
            Button::Shuffle => levels.shuffle = false,
            Button::Next => levels.next = false,
            Button::Previous => levels.previous = false,
            Button::Reset => levels.reset = false,
        }
        levels
    }
}

impl Default for ButtonLevels {
    fn default() -> Self {
        Self::RELEASED
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    PlayPause,
    Shuffle,
    Next,
    Previous,
    Reset,
}

impl Button {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "play" | "pause" | "play_pause" => Some(Self::PlayPause),
            "shuffle" => Some(Self::Shuffle),
            "next" => Some(Self::Next),
            "prev" | "previous" => Some(Self::Previous),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

pub trait ButtonPanel {
    fn sample(&mut self) -> ButtonLevels;
}

pub struct IdlePanel;

impl ButtonPanel for IdlePanel {
    fn sample(&mut self) -> ButtonLevels {
        ButtonLevels::RELEASED
    }
}

pub struct SimulatedPanel {
    presses: Receiver<Button>,
    held: bool,
}

impl SimulatedPanel {
    pub fn new(presses: Receiver<Button>) -> Self {
        Self {
            presses,
            held: false,
        }
    }
}

impl ButtonPanel for SimulatedPanel {
    fn sample(&mut self) -> ButtonLevels {
        if self.held {
            self.held = false;
            return ButtonLevels::RELEASED;
        }
        match self.presses.try_recv() {
            Ok(button) => {
                self.held = true;
                ButtonLevels::pressed(button)
            }
            Err(_) => ButtonLevels::RELEASED,
        }
    }
}

#[derive(Debug, Default)]
pub struct ButtonTracker {
    previous: ButtonLevels,
}

impl ButtonTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, current: ButtonLevels) -> Vec<Command> {
        let prev = self.previous;
        let fell = |was: bool, now: bool| was && !now;

        let mut commands = Vec::new();
        if fell(prev.play_pause, current.play_pause) {
            commands.push(Command::PlayPauseToggle);
        }
        if fell(prev.shuffle, current.shuffle) {
            commands.push(Command::ShuffleStart);
        }
        if fell(prev.next, current.next) {
            commands.push(Command::Next);
        }
        if fell(prev.previous, current.previous) {
            commands.push(Command::Previous);
        }
        if !current.reset {
            commands.push(Command::SystemReset);
        }

        self.previous = current;
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn holding_a_button_fires_once() {
        let mut tracker = ButtonTracker::new();
        let held = ButtonLevels::pressed(Button::Next);
        assert_eq!(tracker.update(held), vec![Command::Next]);
        assert!(tracker.update(held).is_empty());
        assert!(tracker.update(held).is_empty());
        assert!(tracker.update(ButtonLevels::RELEASED).is_empty());
        assert_eq!(tracker.update(held), vec![Command::Next]);
    }

    #[test]
    fn simultaneous_edges_keep_panel_order() {
        let mut tracker = ButtonTracker::new();
        let levels = ButtonLevels {
            play_pause: false,
            shuffle: false,
            next: true,
            previous: false,
            reset: true,
        };
        assert_eq!(
            tracker.update(levels),
            vec![
                Command::PlayPauseToggle,
                Command::ShuffleStart,
                Command::Previous
            ]
        );
    }

    #[test]
    fn reset_acts_on_level() {
        let mut tracker = ButtonTracker::new();
        let held = ButtonLevels::pressed(Button::Reset);
        assert_eq!(tracker.update(held), vec![Command::SystemReset]);
        assert_eq!(tracker.update(held), vec![Command::SystemReset]);
    }

    #[test]
    fn simulated_panel_releases_after_one_sample() {
        let (tx, rx) = mpsc::channel();
        let mut panel = SimulatedPanel::new(rx);
        let mut tracker = ButtonTracker::new();
        tx.send(Button::Shuffle).expect("send");
        tx.send(Button::Shuffle).expect("send");

        let mut fired = Vec::new();
        for _ in 0..5 {
            fired.extend(tracker.update(panel.sample()));
        }
        assert_eq!(fired, vec![Command::ShuffleStart, Command::ShuffleStart]);
    }

    #[test]
    fn button_names_parse() {
        assert_eq!(Button::parse("Next"), Some(Button::Next));
        assert_eq!(Button::parse("prev"), Some(Button::Previous));
        assert_eq!(Button::parse("play"), Some(Button::PlayPause));
        assert_eq!(Button::parse("eject"), None);
        assert_eq!(IdlePanel.sample(), ButtonLevels::RELEASED);
    }
}
