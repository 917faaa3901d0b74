//! Current odds per match.
//!
//! Single writer lock over the whole board so batch updates are atomic:
//! readers observe either none or all of a batch, and every entry in a batch
//! carries the same `last_updated` timestamp. A version counter bumps once
//! per mutation, which lets consumers detect missed updates cheaply.

use chrono::Utc;
use livebet_core::{MatchId, OddsEntry};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

#[derive(Default)]
struct BoardInner {
    entries: HashMap<MatchId, OddsEntry>,
    version: u64,
}

/// Shared in-memory odds cache.
#[derive(Default)]
pub struct OddsBoard {
    inner: RwLock<BoardInner>,
}

impl OddsBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert one match's odds. Returns the board version after the write.
    pub fn update(&self, match_id: MatchId, odds: Decimal) -> u64 {
        let mut inner = self.inner.write();
        inner.entries.insert(match_id, OddsEntry::new(odds));
        inner.version += 1;
        inner.version
    }

    /// Upsert many matches under one write guard.
    ///
    /// All entries get the same `last_updated` and the version bumps exactly
    /// once, so the batch is indivisible from a reader's point of view.
    pub fn update_batch<I>(&self, updates: I) -> u64
    where
        I: IntoIterator<Item = (MatchId, Decimal)>,
    {
        let now = Utc::now();
        let mut inner = self.inner.write();
        let mut count = 0usize;
        for (match_id, odds) in updates {
            inner.entries.insert(match_id, OddsEntry::at(odds, now));
            count += 1;
        }
        if count > 0 {
            inner.version += 1;
        }
        debug!(count, version = inner.version, "Applied odds batch");
        inner.version
    }

    pub fn get(&self, match_id: &MatchId) -> Option<OddsEntry> {
        self.inner.read().entries.get(match_id).cloned()
    }

    /// Drop a match from the board (finished or delisted).
    pub fn remove(&self, match_id: &MatchId) -> Option<OddsEntry> {
        let mut inner = self.inner.write();
        let removed = inner.entries.remove(match_id);
        if removed.is_some() {
            inner.version += 1;
        }
        removed
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.version += 1;
    }

    /// Point-in-time copy of the whole board.
    pub fn snapshot(&self) -> HashMap<MatchId, OddsEntry> {
        self.inner.read().entries.clone()
    }

    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }
}
