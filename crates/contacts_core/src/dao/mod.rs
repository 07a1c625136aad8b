//! Data-access contract for contacts and its storage backends.
//!
//! # Responsibility
//! - Define the CRUD contract every backend honors identically.
//! - Host the in-memory and SQLite implementations plus backend selection.
//!
//! # Invariants
//! - "Not found" is an empty result (`None`, `false`, empty `Vec`), never an
//!   error.
//! - Input-contract violations surface immediately as `StoreError`.
//! - Storage-engine failures during mutations are logged and reported as
//!   `Ok(false)`; they never leak backend-specific error types.

pub mod factory;
pub mod mem_dao;
pub mod sqlite_dao;

use crate::db::DbError;
use crate::model::contact::{Contact, ContactError, ContactId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by `ContactDao` operations.
#[derive(Debug)]
pub enum StoreError {
    /// Caller supplied a contact that breaks an entity rule.
    InvalidArgument(ContactError),
    /// `update` targeted an id with no stored record.
    UnknownContact(ContactId),
    /// Backend failure on a read path.
    Db(DbError),
    /// The backend was shut down.
    Closed,
}

impl StoreError {
    /// Returns whether this error is a caller contract violation.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::UnknownContact(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(err) => write!(f, "invalid argument: {err}"),
            Self::UnknownContact(id) => write!(f, "invalid argument: no contact with id {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Closed => write!(f, "contact store is shut down"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidArgument(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::UnknownContact(_) | Self::Closed => None,
        }
    }
}

impl From<ContactError> for StoreError {
    fn from(value: ContactError) -> Self {
        Self::InvalidArgument(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Uniform CRUD contract over contact storage backends.
///
/// Implementations must be safe to call from many threads at once.
pub trait ContactDao: Send + Sync {
    /// Returns the contact with `id`, or `None` when absent.
    fn find(&self, id: ContactId) -> StoreResult<Option<Contact>>;

    /// Returns every stored contact ordered by id.
    fn find_all(&self) -> StoreResult<Vec<Contact>>;

    /// Returns contacts whose title contains `title` case-insensitively.
    fn find_by_title(&self, title: &str) -> StoreResult<Vec<Contact>>;

    /// Stores a new contact, assigning an id when `contact.id` is unset.
    ///
    /// The assigned id is written back into `contact`. Returns `Ok(false)` on
    /// a backend conflict such as a duplicate id.
    fn save(&self, contact: &mut Contact) -> StoreResult<bool>;

    /// Merges `contact` into the stored record with the same id.
    ///
    /// Fails with `StoreError::UnknownContact` when no record has that id.
    fn update(&self, contact: &Contact) -> StoreResult<bool>;

    /// Removes the record with `id`. Returns `false` when nothing was stored.
    fn delete(&self, id: ContactId) -> StoreResult<bool>;

    /// Releases backend resources. Later calls fail with `StoreError::Closed`.
    fn shutdown(&self) -> StoreResult<()>;
}

/// Unicode lowercase fold applied to both stored titles and search needles.
///
/// Every backend must match titles through this function so that
/// `find_by_title` answers identically regardless of storage.
pub(crate) fn fold_title(title: &str) -> String {
    title.to_lowercase()
}
