//! Form state
//!
//! `EntryDraft` is the pending "new entry" row; `EditSession` stages edits to a
//! saved entry until they are confirmed.

use super::entity::DomainResult;
use super::entry::{Entry, EntryField, NewEntry};
use super::photo::Photo;

/// Pending input for a new entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDraft {
    pub name: String,
    pub weight: String,
    pub reps: String,
    pub photo: Option<Photo>,
}

impl EntryDraft {
    pub fn get(&self, field: EntryField) -> &str {
        match field {
            EntryField::Name => &self.name,
            EntryField::Weight => &self.weight,
            EntryField::Reps => &self.reps,
        }
    }

    pub fn set(&mut self, field: EntryField, value: impl Into<String>) {
        let value = value.into();
        match field {
            EntryField::Name => self.name = value,
            EntryField::Weight => self.weight = value,
            EntryField::Reps => self.reps = value,
        }
    }

    /// Checks that name, weight and reps are filled in. The photo is optional.
    pub fn validate(&self) -> DomainResult<NewEntry> {
        let new_entry = NewEntry {
            name: self.name.clone(),
            weight: self.weight.clone(),
            reps: self.reps.clone(),
            photo: self.photo.clone(),
        };
        new_entry.validate()?;
        Ok(new_entry)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Staged edits to one saved entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    original: Entry,
    staged: Entry,
}

impl EditSession {
    pub fn begin(entry: &Entry) -> Self {
        Self {
            original: entry.clone(),
            staged: entry.clone(),
        }
    }

    /// Id of the entry being edited
    pub fn id(&self) -> u32 {
        self.original.id
    }

    pub fn original(&self) -> &Entry {
        &self.original
    }

    pub fn get(&self, field: EntryField) -> &str {
        self.staged.field(field)
    }

    pub fn set(&mut self, field: EntryField, value: impl Into<String>) {
        *self.staged.field_mut(field) = value.into();
    }

    pub fn is_dirty(&self) -> bool {
        self.staged != self.original
    }

    /// Validated replacement for the original entry; id and photo are kept.
    pub fn commit(self) -> DomainResult<Entry> {
        self.staged.validate()?;
        Ok(self.staged)
    }
}
