use crate::model::TrackEntry;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const BUILTIN: &[(&str, &str)] = &[
    ("Did Jesus Have a Baby Sister", "Dory Previn"),
    ("That's All Right", "Elvis Presley"),
    ("Hey Joe", "Jimi Hendrix"),
    ("Delia's Gone", "Johnny Cash"),
    ("In Da Club", "50 Cent"),
    ("Keep the Customer Satisfied", "Simon & Garfunkel"),
    ("Thrift Shop", "Macklemore & Ryan Lewis"),
    ("Old Man", "Neil Young"),
    ("Never Going Back Again", "Fleetwood Mac"),
    ("Norwegian Wood (This Bird Has Flown)", "The Beatles"),
    ("Chain Gang", "Sam Cooke"),
    ("Yakety Yak", "The Coasters"),
    ("I've Been Everywhere", "Johnny Cash"),
    ("Thunderstruck", "AC/DC"),
    ("Duurt Te Lang", "Davina Michelle"),
    ("Alles Gaat Voorbij", "Doe Maar"),
    ("The Painter", "William Ben"),
    ("Think", "Aretha Franklin"),
    ("Scotland the Brave", "Auld Town Band & Pipes"),
    ("Single Ladies", "Beyoncé"),
    ("Grandma's Hands", "Bill Withers"),
    ("Without Me", "Eminem"),
    ("Spraakwater", "Extince"),
    ("King of the World", "First Aid Kit"),
    ("Komodovaraan", "Yentl en De Boer"),
    ("Look What They've Done To My Song, Ma", "Melanie"),
    ("The Man Who Sold The World", "Nirvana"),
    ("Rotterdam", "Pokey LaFarge"),
    ("'t Roeie Klied", "Rowwen Heze"),
    ("You Never Can Tell", "Chuck Berry"),
    ("Sit Still, Look Pretty", "Daya"),
    ("Gangsta's Paradise", "Coolio ft. L.V."),
    ("Me And Bobby McGee", "Janis Joplin"),
    ("Big River", "Johnny Cash"),
    ("Non, Non, Rien N'a Changé", "Les Poppys"),
    ("Over in the Glory Land", "The Broken Circle Breakdown"),
    ("Hell's Comin' With Me", "Poor Man's Poison"),
    ("A far l'amore comincia tu", "Raffaella Carrà"),
    ("Auto, Vliegtuug", "Rowwen Hèze"),
    ("Stuck In The Middle With You", "Stealers Wheel"),
    ("Lonely Boy", "The Black Keys"),
];

pub const MAX_ENTRIES: usize = u16::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCatalog {
    entries: Vec<TrackEntry>,
}

impl TrackCatalog {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .zip(1..=u16::MAX)
            .map(|((title, artist), number)| TrackEntry::new(number, title, artist))
            .collect();
        Self { entries }
    }

    pub fn from_entries(mut entries: Vec<TrackEntry>) -> Self {
        entries.sort_by_key(|entry| entry.number);
        entries.truncate(MAX_ENTRIES);
        for (entry, number) in entries.iter_mut().zip(1..=u16::MAX) {
            entry.number = number;
        }
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let entries: Vec<TrackEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse catalog {}", path.display()))?;
        if entries.is_empty() {
            anyhow::bail!("catalog {} has no entries", path.display());
        }
        if entries.len() > MAX_ENTRIES {
            anyhow::bail!(
                "catalog {} has {} entries, at most {MAX_ENTRIES} are supported",
                path.display(),
                entries.len()
            );
        }
        Ok(Self::from_entries(entries))
    }

    pub fn len(&self) -> u16 {
        u16::try_from(self.entries.len()).unwrap_or(u16::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, number: i32) -> bool {
        number >= 1 && number <= i32::from(self.len())
    }

    pub fn lookup(&self, number: i32) -> String {
        usize::try_from(number)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| self.entries.get(idx))
            .map(TrackEntry::display)
            .unwrap_or_else(|| format!("Unknown Track #{number}"))
    }

    pub fn song_list(&self) -> String {
        let mut out = String::from("=== Song List ===\n");
        for entry in &self.entries {
            out.push_str(&format!("Track {:02}: {}\n", entry.number, entry.display()));
        }
        out.push_str("===================");
        out
    }
}

impl Default for TrackCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn builtin_has_forty_one_tracks() {
        let catalog = TrackCatalog::builtin();
        assert_eq!(catalog.len(), 41);
        assert_eq!(catalog.lookup(3), "Hey Joe - Jimi Hendrix");
        assert_eq!(catalog.lookup(41), "Lonely Boy - The Black Keys");
    }

    #[test]
    fn unknown_numbers_get_placeholder() {
        let catalog = TrackCatalog::builtin();
        assert_eq!(catalog.lookup(999), "Unknown Track #999");
        assert_eq!(catalog.lookup(0), "Unknown Track #0");
        assert!(catalog.lookup(-3).contains("-3"));
    }

    #[test]
    fn song_list_pads_track_numbers() {
        let list = TrackCatalog::builtin().song_list();
        assert!(list.starts_with("=== Song List ==="));
        assert!(list.contains("Track 01: Did Jesus Have a Baby Sister - Dory Previn"));
        assert!(list.contains("Track 41: Lonely Boy - The Black Keys"));
    }

    #[test]
    fn loaded_catalog_is_renumbered() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        let entries = vec![
            TrackEntry::new(7, "B", "Two"),
            TrackEntry::new(2, "A", "One"),
        ];
        fs::write(&path, serde_json::to_string(&entries).expect("json")).expect("write");

        let catalog = TrackCatalog::load(&path).expect("load");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup(1), "A - One");
        assert_eq!(catalog.lookup(2), "B - Two");
        assert!(!catalog.contains(3));
    }

    #[test]
    fn empty_catalog_file_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        fs::write(&path, "[]").expect("write");
        assert!(TrackCatalog::load(&path).is_err());
    }

    #[test]
    fn oversized_catalog_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        let entries: Vec<TrackEntry> = (0..=MAX_ENTRIES)
            .map(|_| TrackEntry::new(1, "T", "A"))
            .collect();
        fs::write(&path, serde_json::to_string(&entries).expect("json")).expect("write");

        let err = TrackCatalog::load(&path).expect_err("too many entries");
        assert!(err.to_string().contains("at most 65535"));

        let capped = TrackCatalog::from_entries(entries);
        assert_eq!(capped.len(), u16::MAX);
        assert_eq!(capped.lookup(65535), "T - A");
        assert!(!capped.contains(65536));
    }
}
