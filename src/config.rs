use crate::model::{AudioBackend, Equalizer, MAX_VOLUME};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "rfid-jukebox";
const CONFIG_FILE: &str = "config.json";
const CARD_DECK_FILE: &str = "cards.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JukeboxConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_true")]
    pub web_enabled: bool,
    #[serde(default = "default_network_timeout_ms")]
    pub network_timeout_ms: u64,
    #[serde(default = "default_initial_volume")]
    pub initial_volume: u8,
    #[serde(default)]
    pub equalizer: Equalizer,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,
    #[serde(default = "default_recovery_attempts")]
    pub recovery_attempts: u32,
    #[serde(default = "default_recovery_interval_ms")]
    pub recovery_interval_ms: u64,
    #[serde(default = "default_manual_write_timeout_ms")]
    pub manual_write_timeout_ms: u64,
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
    #[serde(default = "default_stop_settle_ms")]
    pub stop_settle_ms: u64,
    #[serde(default)]
    pub audio_backend: AudioBackend,
    #[serde(default = "default_simulated_track_seconds")]
    pub simulated_track_seconds: u64,
    #[serde(default)]
    pub music_dir: Option<PathBuf>,
    #[serde(default)]
    pub card_deck: Option<PathBuf>,
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

fn default_bind_addr() -> String {
    String::from("0.0.0.0:8080")
}

fn default_true() -> bool {
    true
}

fn default_network_timeout_ms() -> u64 {
    10_000
}

fn default_initial_volume() -> u8 {
    MAX_VOLUME
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_health_check_interval_ms() -> u64 {
    5_000
}

fn default_recovery_attempts() -> u32 {
    10
}

fn default_recovery_interval_ms() -> u64 {
    100
}

fn default_manual_write_timeout_ms() -> u64 {
    30_000
}

fn default_reset_delay_ms() -> u64 {
    1_000
}

fn default_stop_settle_ms() -> u64 {
    100
}

fn default_simulated_track_seconds() -> u64 {
    180
}

impl Default for JukeboxConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            web_enabled: true,
            network_timeout_ms: default_network_timeout_ms(),
            initial_volume: default_initial_volume(),
            equalizer: Equalizer::default(),
            poll_interval_ms: default_poll_interval_ms(),
            health_check_interval_ms: default_health_check_interval_ms(),
            recovery_attempts: default_recovery_attempts(),
            recovery_interval_ms: default_recovery_interval_ms(),
            manual_write_timeout_ms: default_manual_write_timeout_ms(),
            reset_delay_ms: default_reset_delay_ms(),
            stop_settle_ms: default_stop_settle_ms(),
            audio_backend: AudioBackend::default(),
            simulated_track_seconds: default_simulated_track_seconds(),
            music_dir: None,
            card_deck: None,
            catalog: None,
        }
    }
}

impl JukeboxConfig {
    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn health_check_interval(&self) -> Option<Duration> {
        (self.health_check_interval_ms > 0)
            .then(|| Duration::from_millis(self.health_check_interval_ms))
    }

    pub fn recovery_interval(&self) -> Duration {
        Duration::from_millis(self.recovery_interval_ms)
    }

    pub fn manual_write_timeout(&self) -> Duration {
        Duration::from_millis(self.manual_write_timeout_ms)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    pub fn stop_settle(&self) -> Duration {
        Duration::from_millis(self.stop_settle_ms)
    }

    pub fn card_deck_path(&self, root: &Path) -> PathBuf {
        self.card_deck
            .clone()
            .unwrap_or_else(|| root.join(CARD_DECK_FILE))
    }
}

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("JUKEBOX_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn load_config(root: &Path) -> Result<JukeboxConfig> {
    let path = config_path(root);
    if !path.exists() {
        return Ok(JukeboxConfig::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: JukeboxConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}

pub fn save_config(root: &Path, config: &JukeboxConfig) -> Result<()> {
    fs::create_dir_all(root).with_context(|| format!("failed to create {}", root.display()))?;
    let path = config_path(root);
    let json = serde_json::to_string_pretty(config)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn write_default_config(root: &Path) -> Result<bool> {
    if config_path(root).exists() {
        return Ok(false);
    }
    save_config(root, &JukeboxConfig::default())?;
    Ok(true)
}
