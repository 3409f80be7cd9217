use crate::error::CardError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

pub const BLOCK_LEN: usize = 16;
// Sector 0, behind the factory key.
pub const DATA_BLOCK: u8 = 1;
pub const FACTORY_KEY: [u8; 6] = [0xFF; 6];

pub type Block = [u8; BLOCK_LEN];

pub fn encode(value: i64) -> Result<Block, CardError> {
    let text = value.to_string();
    if text.len() > BLOCK_LEN {
        return Err(CardError::Overflow { len: text.len() });
    }

    let mut block = [b' '; BLOCK_LEN];
    block[..text.len()].copy_from_slice(text.as_bytes());
    Ok(block)
}

pub fn decode(raw: &[u8]) -> Result<i64, CardError> {
    let text: String = raw
        .iter()
        .take(BLOCK_LEN)
        .filter(|byte| **byte != b' ' && **byte != 0)
        .map(|byte| char::from(*byte))
        .collect();
    let text = text.trim();

    if text.is_empty() {
        return Err(CardError::Empty);
    }

    text.parse::<i64>()
        .map_err(|_| CardError::NotANumber(text.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardUid(Vec<u8>);

impl CardUid {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn parse_hex(value: &str) -> Option<Self> {
        let cleaned: String = value
            .chars()
            .filter(|ch| !ch.is_whitespace() && *ch != ':')
            .collect();
        if cleaned.is_empty() || !cleaned.is_ascii() || cleaned.len() % 2 != 0 {
            return None;
        }

        let bytes = (0..cleaned.len())
            .step_by(2)
            .map(|idx| u8::from_str_radix(&cleaned[idx..idx + 2], 16).ok())
            .collect::<Option<Vec<u8>>>()?;
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, " {byte:02X}")?;
        }
        Ok(())
    }
}

pub trait CardReader {
    fn poll_new_card(&mut self) -> Option<CardUid>;
    fn read_block(&mut self, uid: &CardUid) -> Result<Block, CardError>;
    fn write_block(&mut self, uid: &CardUid, block: &Block) -> Result<(), CardError>;
    fn halt(&mut self, _uid: &CardUid) {}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardDeck {
    #[serde(default)]
    pub cards: BTreeMap<String, String>,
    #[serde(default)]
    pub locked: BTreeSet<String>,
}

impl CardDeck {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read card deck {}", path.display()))?;
        let deck: CardDeck = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse card deck {}", path.display()))?;
        Ok(deck)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn block(&self, uid: &CardUid) -> Block {
        let mut block = [0u8; BLOCK_LEN];
        if let Some(text) = self.cards.get(&uid.to_hex()) {
            for (slot, byte) in block.iter_mut().zip(text.bytes()) {
                *slot = byte;
            }
        }
        block
    }

    pub fn store(&mut self, uid: &CardUid, block: &Block) {
        let text = String::from_utf8_lossy(block).to_string();
        self.cards.insert(uid.to_hex(), text);
    }

    pub fn lock(&mut self, uid: &CardUid) {
        self.locked.insert(uid.to_hex());
    }

    fn authenticate(&self, uid: &CardUid) -> Result<(), CardError> {
        if self.locked.contains(&uid.to_hex()) {
            let key: String = FACTORY_KEY.iter().map(|byte| format!("{byte:02X}")).collect();
            return Err(CardError::Auth(format!(
                "key {key} rejected for block {DATA_BLOCK} on card{uid}"
            )));
        }
        Ok(())
    }
}

pub struct SimulatedReader {
    deck: CardDeck,
    path: Option<PathBuf>,
    taps: Receiver<CardUid>,
}

impl SimulatedReader {
    pub fn new(deck: CardDeck, path: Option<PathBuf>, taps: Receiver<CardUid>) -> Self {
        Self { deck, path, taps }
    }
}

impl CardReader for SimulatedReader {
    fn poll_new_card(&mut self) -> Option<CardUid> {
        self.taps.try_recv().ok()
    }

    fn read_block(&mut self, uid: &CardUid) -> Result<Block, CardError> {
        self.deck.authenticate(uid)?;
        Ok(self.deck.block(uid))
    }

    fn write_block(&mut self, uid: &CardUid, block: &Block) -> Result<(), CardError> {
        self.deck.authenticate(uid)?;
        let previous = self.deck.clone();
        self.deck.store(uid, block);
        if let Some(path) = &self.path
            && let Err(err) = self.deck.save(path)
        {
            self.deck = previous;
            return Err(CardError::Io(format!("{err:#}")));
        }
        Ok(())
    }
}
