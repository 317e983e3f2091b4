//! Entry Entity
//!
//! One exercise record: name, weight, reps and an optional photo.

use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult, Entity};
use super::photo::{self, Photo};

/// A saved exercise record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Stable identifier, assigned by the store when the entry is appended
    pub id: u32,
    /// Exercise name
    pub name: String,
    /// Weight as typed by the user (unit-free)
    pub weight: String,
    /// Repetitions as typed by the user
    pub reps: String,
    /// Photo as a base64 data URI
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "photo::deserialize_lenient"
    )]
    pub photo: Option<Photo>,
}

impl Entry {
    pub fn new(id: u32, name: String, weight: String, reps: String) -> Self {
        Self {
            id,
            name,
            weight,
            reps,
            photo: None,
        }
    }

    pub fn with_photo(mut self, photo: Photo) -> Self {
        self.photo = Some(photo);
        self
    }

    /// Value of a text field
    pub fn field(&self, field: EntryField) -> &str {
        match field {
            EntryField::Name => &self.name,
            EntryField::Weight => &self.weight,
            EntryField::Reps => &self.reps,
        }
    }

    /// Name, weight and reps must be filled in
    pub fn validate(&self) -> DomainResult<()> {
        require_filled(|field| self.field(field))
    }

    pub(crate) fn field_mut(&mut self, field: EntryField) -> &mut String {
        match field {
            EntryField::Name => &mut self.name,
            EntryField::Weight => &mut self.weight,
            EntryField::Reps => &mut self.reps,
        }
    }
}

impl Entity for Entry {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// An entry before the store has assigned its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub name: String,
    pub weight: String,
    pub reps: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Photo>,
}

impl NewEntry {
    pub fn new(name: impl Into<String>, weight: impl Into<String>, reps: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: weight.into(),
            reps: reps.into(),
            photo: None,
        }
    }

    /// Name, weight and reps must be filled in
    pub fn validate(&self) -> DomainResult<()> {
        require_filled(|field| match field {
            EntryField::Name => &self.name,
            EntryField::Weight => &self.weight,
            EntryField::Reps => &self.reps,
        })
    }

    pub fn into_entry(self, id: u32) -> Entry {
        Entry {
            id,
            name: self.name,
            weight: self.weight,
            reps: self.reps,
            photo: self.photo,
        }
    }
}

/// Editable text fields of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryField {
    Name,
    Weight,
    Reps,
}

impl EntryField {
    pub const ALL: [EntryField; 3] = [EntryField::Name, EntryField::Weight, EntryField::Reps];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryField::Name => "name",
            EntryField::Weight => "weight",
            EntryField::Reps => "reps",
        }
    }

    /// Placeholder / column label shown in the UI
    pub fn label(&self) -> &'static str {
        match self {
            EntryField::Name => "Name",
            EntryField::Weight => "Weight",
            EntryField::Reps => "Reps",
        }
    }
}

pub(super) fn require_filled<'a>(value_of: impl Fn(EntryField) -> &'a str) -> DomainResult<()> {
    match EntryField::ALL.into_iter().find(|field| value_of(*field).is_empty()) {
        Some(field) => Err(DomainError::InvalidInput(format!("{} is required", field.as_str()))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_creation() {
        let entry = Entry::new(1, "Squat".to_string(), "100".to_string(), "5".to_string());
        assert_eq!(entry.id(), 1);
        assert_eq!(entry.field(EntryField::Name), "Squat");
        assert!(entry.photo.is_none());
    }

    #[test]
    fn test_new_entry_into_entry() {
        let entry = NewEntry::new("Bench", "80", "8").into_entry(7);
        assert_eq!(entry, Entry::new(7, "Bench".into(), "80".into(), "8".into()));
    }

    #[test]
    fn test_validate_requires_text_fields() {
        assert!(NewEntry::new("Squat", "100", "5").validate().is_ok());
        assert_eq!(
            NewEntry::new("Squat", "", "5").validate(),
            Err(DomainError::InvalidInput("weight is required".to_string()))
        );
        assert_eq!(
            Entry::new(1, String::new(), "100".into(), "5".into()).validate(),
            Err(DomainError::InvalidInput("name is required".to_string()))
        );
    }

    #[test]
    fn test_photo_is_omitted_when_absent() {
        let entry = Entry::new(1, "Squat".into(), "100".into(), "5".into());
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value, json!({"id": 1, "name": "Squat", "weight": "100", "reps": "5"}));
    }

    #[test]
    fn test_legacy_photos_load_as_none() {
        let empty: Entry = serde_json::from_value(json!({
            "id": 1, "name": "Squat", "weight": "100", "reps": "5", "photo": ""
        }))
        .unwrap();
        assert!(empty.photo.is_none());

        let object_url: Entry = serde_json::from_value(json!({
            "id": 2, "name": "Row", "weight": "60", "reps": "10",
            "photo": "blob:http://localhost:3000/8c1d2f0e-5a3b-4b51-9a0e-1f2e3d4c5b6a"
        }))
        .unwrap();
        assert!(object_url.photo.is_none());
    }

    #[test]
    fn test_data_uri_photo_round_trips() {
        let entry: Entry = serde_json::from_value(json!({
            "id": 3, "name": "Curl", "weight": "12", "reps": "12",
            "photo": "data:image/png;base64,iVBORw0KGgo="
        }))
        .unwrap();
        assert_eq!(entry.photo.as_ref().map(Photo::mime_type), Some("image/png"));
        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["photo"], "data:image/png;base64,iVBORw0KGgo=");
    }
}
