use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::*;
pub use storage::*;

pub mod codec;
mod storage;

/// Board size and mine count, every combination has its own table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BoardKey {
    pub width: Coord,
    pub height: Coord,
    pub mines: CellCount,
}

impl BoardKey {
    pub const fn new(width: Coord, height: Coord, mines: CellCount) -> Self {
        Self {
            width,
            height,
            mines,
        }
    }
}

impl fmt::Display for BoardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.mines)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub elapsed_ms: u64,
}

impl LeaderboardEntry {
    pub fn new(username: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            username: username.into(),
            elapsed_ms,
        }
    }
}

/// Up to [`LeaderboardTable::CAPACITY`] entries, fastest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardTable {
    entries: Vec<LeaderboardEntry>,
}

impl LeaderboardTable {
    pub const CAPACITY: usize = 10;

    /// Builds a table from entries in any order, keeping the fastest ones.
    pub fn from_entries(mut entries: Vec<LeaderboardEntry>) -> Self {
        // stable, equal times keep their stored order
        entries.sort_by_key(|entry| entry.elapsed_ms);
        entries.truncate(Self::CAPACITY);
        Self { entries }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a time would make it onto the table.
    pub fn qualifies(&self, elapsed_ms: u64) -> bool {
        self.insertion_point(elapsed_ms) < Self::CAPACITY
    }

    /// Inserts after every entry at least as fast, returning the rank or `None` if it fell off the end.
    pub fn insert(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let rank = self.insertion_point(entry.elapsed_ms);
        if rank >= Self::CAPACITY {
            return None;
        }
        self.entries.insert(rank, entry);
        self.entries.truncate(Self::CAPACITY);
        Some(rank)
    }

    fn insertion_point(&self, elapsed_ms: u64) -> usize {
        self.entries
            .partition_point(|entry| entry.elapsed_ms <= elapsed_ms)
    }
}

/// Ranked winning times per board, persisted to `S` after every change.
#[derive(Debug)]
pub struct LeaderboardStore<S> {
    storage: S,
    tables: BTreeMap<BoardKey, LeaderboardTable>,
    /// Indexed boards whose record did not decode. They stay in the index and their record is not
    /// rewritten until a new score replaces it.
    unreadable: BTreeSet<BoardKey>,
}

impl<S: Storage> LeaderboardStore<S> {
    /// Loads every table listed in the storage index.
    ///
    /// Records that do not decode are logged and skipped, only storage failures are errors.
    pub fn open(storage: S) -> StoreResult<Self> {
        let mut tables = BTreeMap::new();
        let mut unreadable = BTreeSet::new();

        let Some(index) = storage.get(codec::INDEX_KEY)? else {
            log::info!("No leaderboard stored yet");
            return Ok(Self {
                storage,
                tables,
                unreadable,
            });
        };

        for key in codec::decode_index(&index) {
            let Some(record) = storage.get(&codec::table_storage_key(key))? else {
                log::warn!("Leaderboard {} is indexed but has no record", key);
                continue;
            };
            match codec::decode_table(&record) {
                Ok(entries) => {
                    tables.insert(key, LeaderboardTable::from_entries(entries));
                }
                Err(err) => {
                    log::warn!("Skipping unreadable leaderboard {}: {}", key, err);
                    unreadable.insert(key);
                }
            }
        }

        Ok(Self {
            storage,
            tables,
            unreadable,
        })
    }

    /// Records a time, then persists the whole store.
    ///
    /// Returns the 0-based rank, `None` when it did not make the table.
    pub fn add_score(
        &mut self,
        key: BoardKey,
        username: &str,
        elapsed_ms: u64,
    ) -> StoreResult<Option<usize>> {
        if self.unreadable.remove(&key) {
            log::warn!("Replacing unreadable leaderboard {}", key);
        }
        let table = self.tables.entry(key).or_insert_with(|| {
            log::info!("Creating leaderboard {}", key);
            LeaderboardTable::default()
        });
        let rank = table.insert(LeaderboardEntry::new(username, elapsed_ms));
        log::debug!("{} scored {} ms on {}, rank {:?}", username, elapsed_ms, key, rank);

        self.persist()?;
        Ok(rank)
    }

    pub fn qualifies(&self, key: BoardKey, elapsed_ms: u64) -> bool {
        self.tables
            .get(&key)
            .is_none_or(|table| table.qualifies(elapsed_ms))
    }

    /// Entries for a board, fastest first, empty when nobody scored on it yet.
    pub fn entries_for(&self, key: BoardKey) -> &[LeaderboardEntry] {
        self.tables
            .get(&key)
            .map(LeaderboardTable::entries)
            .unwrap_or_default()
    }

    pub fn table(&self, key: BoardKey) -> Option<&LeaderboardTable> {
        self.tables.get(&key)
    }

    /// Every board with a readable table, in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = BoardKey> + '_ {
        self.tables.keys().copied()
    }

    /// Writes every readable table, then the index listing them along with the unreadable ones.
    pub fn persist(&mut self) -> StoreResult<()> {
        for (&key, table) in &self.tables {
            self.storage.set(
                &codec::table_storage_key(key),
                &codec::encode_table(table.entries()),
            )?;
        }
        let indexed: BTreeSet<BoardKey> =
            self.tables.keys().chain(&self.unreadable).copied().collect();
        self.storage
            .set(codec::INDEX_KEY, &codec::encode_index(indexed))?;
        Ok(())
    }

    /// The whole store as a JSON object keyed by the board's display text.
    pub fn to_json(&self) -> StoreResult<String> {
        let tables: BTreeMap<String, &[LeaderboardEntry]> = self
            .tables
            .iter()
            .map(|(key, table)| (key.to_string(), table.entries()))
            .collect();
        Ok(serde_json::to_string_pretty(&tables)?)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

/// Formats a time as `1h 2min 3s`, dropping leading zero units.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let secs = elapsed_ms / 1000;
    let (hours, mins, secs) = (secs / 3600, secs / 60 % 60, secs % 60);

    if hours > 0 {
        format!("{hours}h {mins}min {secs}s")
    } else if mins > 0 {
        format!("{mins}min {secs}s")
    } else {
        format!("{secs}s")
    }
}
