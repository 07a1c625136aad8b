//! Contact use-case service.
//!
//! # Responsibility
//! - Provide request-shaped entry points (path id + body) over `ContactDao`.
//! - Keep callers independent of which backend is active.
//!
//! # Invariants
//! - Service APIs never bypass DAO validation or transaction boundaries.
//! - A body id that disagrees with the path id is rejected before any write.

use crate::dao::{ContactDao, StoreResult};
use crate::model::contact::{Contact, ContactError, ContactId, UNSET_CONTACT_ID};
use log::info;
use std::sync::Arc;

/// Sample contacts inserted by `seed_samples`: `(id, title, name, email)`.
const SAMPLE_CONTACTS: &[(ContactId, &str, &str, &str)] = &[
    (101, "Test contact", "Joe Experimental", "none@testing.com"),
    (
        102,
        "Another Test contact",
        "Testosterone",
        "testee@foo.com",
    ),
];

/// Inserts the sample contacts whose ids are still free.
///
/// Returns how many contacts were inserted.
pub fn seed_samples(dao: &dyn ContactDao) -> StoreResult<usize> {
    let mut inserted = 0;
    for (id, title, name, email) in SAMPLE_CONTACTS {
        if dao.find(*id)?.is_some() {
            continue;
        }
        let mut sample = Contact::with_fields(*title, *name, *email);
        sample.id = *id;
        if dao.save(&mut sample)? {
            inserted += 1;
        }
    }
    Ok(inserted)
}

/// Use-case wrapper around a shared contact DAO.
pub struct ContactService {
    dao: Arc<dyn ContactDao>,
}

impl ContactService {
    pub fn new(dao: Arc<dyn ContactDao>) -> Self {
        Self { dao }
    }

    /// Creates and stores a contact, returning the assigned id.
    ///
    /// Returns `Ok(None)` when the backend rejected the write.
    pub fn create_contact(
        &self,
        title: &str,
        name: &str,
        email: &str,
    ) -> StoreResult<Option<ContactId>> {
        let mut contact = Contact::with_fields(title, name, email);
        if self.dao.save(&mut contact)? {
            info!(
                "event=contact_create module=service status=ok id={}",
                contact.id
            );
            return Ok(Some(contact.id));
        }
        Ok(None)
    }

    pub fn get_contact(&self, id: ContactId) -> StoreResult<Option<Contact>> {
        self.dao.find(id)
    }

    /// Lists all contacts, or only those whose title contains `title`.
    pub fn list_contacts(&self, title: Option<&str>) -> StoreResult<Vec<Contact>> {
        match title {
            Some(query) => self.dao.find_by_title(query),
            None => self.dao.find_all(),
        }
    }

    /// Merge-updates the contact at `id` with `update`.
    ///
    /// An unset body id adopts `id`.
    ///
    /// # Errors
    /// - `StoreError::InvalidArgument` when the body id names another contact.
    /// - `StoreError::UnknownContact` when nothing is stored at `id`.
    pub fn update_contact(&self, id: ContactId, update: &Contact) -> StoreResult<bool> {
        let update = with_path_id(id, update)?;
        self.dao.update(&update)
    }

    pub fn delete_contact(&self, id: ContactId) -> StoreResult<bool> {
        self.dao.delete(id)
    }

    /// Seeds sample contacts into the wrapped DAO.
    pub fn seed_samples(&self) -> StoreResult<usize> {
        seed_samples(self.dao.as_ref())
    }
}

fn with_path_id(id: ContactId, update: &Contact) -> Result<Contact, ContactError> {
    if update.id != UNSET_CONTACT_ID && update.id != id {
        return Err(ContactError::IdMismatch {
            target: id,
            update: update.id,
        });
    }
    let mut update = update.clone();
    update.id = id;
    Ok(update)
}
