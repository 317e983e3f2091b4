//! Local Entry Cache
//!
//! In-memory mirror of the remote entry list. Mutations are applied from the
//! store's answers; a failed remote call marks the mirror stale so the caller
//! re-fetches instead of trusting its local copy.

use crate::domain::{Entity, Entry};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryCache {
    entries: Vec<Entry>,
    stale: bool,
}

impl EntryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Replace the mirror with a freshly fetched list
    pub fn replace_all(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
        self.stale = false;
    }

    /// Record an entry the store has accepted. An id already present is overwritten,
    /// so an entry never shows up twice.
    pub fn apply_added(&mut self, entry: Entry) {
        match self.entries.iter_mut().find(|existing| existing.id() == entry.id()) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Drop an entry the store has removed. Unknown ids are ignored.
    pub fn apply_removed(&mut self, id: u32) -> Option<Entry> {
        let position = self.entries.iter().position(|entry| entry.id() == id)?;
        Some(self.entries.remove(position))
    }

    /// Swap in an updated entry, keeping its position
    pub fn apply_updated(&mut self, entry: Entry) -> bool {
        match self.entries.iter_mut().find(|existing| existing.id() == entry.id()) {
            Some(existing) => {
                *existing = entry;
                true
            }
            None => false,
        }
    }

    /// Mark the mirror as out of sync with the store
    pub fn invalidate(&mut self) {
        self.stale = true;
    }
}
