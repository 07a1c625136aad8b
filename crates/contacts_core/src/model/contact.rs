//! Contact domain model.
//!
//! # Responsibility
//! - Define the address-book record stored by every DAO backend.
//! - Own the entity-level consistency rules (full replace, merge update).
//!
//! # Invariants
//! - Identity is the `id` field alone; equality and hashing ignore the rest.
//! - `copy_of` never touches `id`.
//! - `apply_update` never leaves `title` blank and always refreshes
//!   `last_update`.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Numeric contact identity assigned by the storage backend.
pub type ContactId = i64;

/// Sentinel id for contacts that have not been persisted yet.
pub const UNSET_CONTACT_ID: ContactId = 0;

/// Entity-level contract violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// A required source contact was not supplied.
    MissingSource,
    /// The update carries an id that belongs to a different contact.
    IdMismatch {
        target: ContactId,
        update: ContactId,
    },
    /// Title is empty or whitespace-only.
    BlankTitle,
}

impl Display for ContactError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSource => write!(f, "source contact may not be absent"),
            Self::IdMismatch { target, update } => write!(
                f,
                "update contact id {update} does not match contact id {target}"
            ),
            Self::BlankTitle => write!(f, "contact title must not be blank"),
        }
    }
}

impl Error for ContactError {}

/// One address-book entry.
///
/// `title` is the display label in contact lists (nickname or company), so it
/// is the only required text field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Backend-assigned identity. `UNSET_CONTACT_ID` until first save.
    #[serde(default)]
    pub id: ContactId,
    pub title: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// URL of the contact photo.
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Refreshed on every successful merge update.
    #[serde(default = "now")]
    pub last_update: DateTime<Utc>,
}

impl Contact {
    /// Creates an empty contact with an unset id.
    pub fn new() -> Self {
        Self {
            id: UNSET_CONTACT_ID,
            title: String::new(),
            name: None,
            email: None,
            photo_url: None,
            last_update: now(),
        }
    }

    /// Creates a contact with the given title, name and email.
    ///
    /// `photo_url` starts as an empty string.
    pub fn with_fields(
        title: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            name: Some(name.into()),
            email: Some(email.into()),
            photo_url: Some(String::new()),
            ..Self::new()
        }
    }

    /// Creates an identity-only handle, e.g. for lookups and deletes.
    pub fn with_id(id: ContactId) -> Self {
        Self {
            id,
            ..Self::new()
        }
    }

    /// Returns whether a backend has assigned an id to this contact.
    pub fn is_persisted(&self) -> bool {
        self.id != UNSET_CONTACT_ID
    }

    /// Checks invariants required before a contact is first stored.
    ///
    /// # Errors
    /// - `ContactError::BlankTitle` when `title` is empty or whitespace.
    pub fn validate(&self) -> Result<(), ContactError> {
        if is_blank(Some(self.title.as_str())) {
            return Err(ContactError::BlankTitle);
        }
        Ok(())
    }

    /// Overwrites every field except `id` with values from `other`.
    ///
    /// The caller is responsible for supplying the right source; ids are not
    /// compared.
    ///
    /// # Errors
    /// - `ContactError::MissingSource` when `other` is `None`.
    pub fn copy_of(&mut self, other: Option<&Contact>) -> Result<(), ContactError> {
        let other = other.ok_or(ContactError::MissingSource)?;
        self.title = other.title.clone();
        self.name = other.name.clone();
        self.email = other.email.clone();
        self.photo_url = other.photo_url.clone();
        self.last_update = other.last_update;
        Ok(())
    }

    /// Merges `update` into this contact.
    ///
    /// A blank incoming title keeps the current one. `name`, `email` and
    /// `photo_url` are always taken from the update, even when absent.
    ///
    /// # Errors
    /// - `ContactError::IdMismatch` when `update.id` is set and differs from
    ///   this contact's id.
    pub fn apply_update(&mut self, update: Option<&Contact>) -> Result<(), ContactError> {
        let Some(update) = update else {
            return Ok(());
        };
        if update.id != UNSET_CONTACT_ID && update.id != self.id {
            return Err(ContactError::IdMismatch {
                target: self.id,
                update: update.id,
            });
        }

        if !is_blank(Some(update.title.as_str())) {
            self.title = update.title.clone();
        }
        self.name = update.name.clone();
        self.email = update.email.clone();
        self.photo_url = update.photo_url.clone();
        self.last_update = now();
        Ok(())
    }
}

impl Default for Contact {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Contact {}

impl Hash for Contact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for Contact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} <{}> ({})",
            self.title,
            self.name.as_deref().unwrap_or_default(),
            self.email.as_deref().unwrap_or_default(),
            self.id
        )
    }
}

/// Current time at millisecond precision.
///
/// Millisecond truncation keeps timestamps identical after a SQLite round-trip.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |text| text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{is_blank, Contact};

    #[test]
    fn is_blank_treats_whitespace_as_blank() {
        assert!(is_blank(None));
        assert!(is_blank(Some("")));
        assert!(is_blank(Some(" \t\n")));
        assert!(!is_blank(Some(" x ")));
    }

    #[test]
    fn display_renders_absent_fields_as_empty() {
        let mut contact = Contact::with_id(7);
        contact.title = "Nick".to_string();
        assert_eq!(contact.to_string(), "Nick:  <> (7)");
    }
}
