//! In-memory contact backend.
//!
//! # Responsibility
//! - Provide a process-local `ContactDao` for development and tests.
//!
//! # Invariants
//! - Mutations hold the write lock for their whole read-modify-write cycle.
//! - Readers never observe a partially applied mutation.
//! - Generated ids are one greater than the largest id in use.

use crate::dao::{fold_title, ContactDao, StoreError, StoreResult};
use crate::model::contact::{Contact, ContactId, UNSET_CONTACT_ID};
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct MemState {
    contacts: BTreeMap<ContactId, Contact>,
    closed: bool,
}

impl MemState {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn next_id(&self) -> ContactId {
        self.contacts
            .keys()
            .next_back()
            .map_or(1, |max| max.saturating_add(1).max(1))
    }
}

/// `ContactDao` backed by an ordered map behind a read/write lock.
#[derive(Debug, Default)]
pub struct MemContactDao {
    state: RwLock<MemState>,
}

impl MemContactDao {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored contacts.
    pub fn len(&self) -> usize {
        self.state.read().contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContactDao for MemContactDao {
    fn find(&self, id: ContactId) -> StoreResult<Option<Contact>> {
        let state = self.state.read();
        state.ensure_open()?;
        Ok(state.contacts.get(&id).cloned())
    }

    fn find_all(&self) -> StoreResult<Vec<Contact>> {
        let state = self.state.read();
        state.ensure_open()?;
        Ok(state.contacts.values().cloned().collect())
    }

    fn find_by_title(&self, title: &str) -> StoreResult<Vec<Contact>> {
        let needle = fold_title(title);
        let state = self.state.read();
        state.ensure_open()?;
        Ok(state
            .contacts
            .values()
            .filter(|contact| fold_title(&contact.title).contains(needle.as_str()))
            .cloned()
            .collect())
    }

    fn save(&self, contact: &mut Contact) -> StoreResult<bool> {
        contact.validate()?;

        let mut state = self.state.write();
        state.ensure_open()?;

        let id = if contact.id == UNSET_CONTACT_ID {
            state.next_id()
        } else {
            contact.id
        };
        if state.contacts.contains_key(&id) {
            warn!("event=contact_save module=mem_dao status=conflict id={id} error_code=duplicate_id");
            return Ok(false);
        }

        contact.id = id;
        state.contacts.insert(id, contact.clone());
        debug!("event=contact_save module=mem_dao status=ok id={id}");
        Ok(true)
    }

    fn update(&self, contact: &Contact) -> StoreResult<bool> {
        let mut state = self.state.write();
        state.ensure_open()?;

        let stored = state
            .contacts
            .get_mut(&contact.id)
            .ok_or(StoreError::UnknownContact(contact.id))?;
        stored.apply_update(Some(contact))?;
        debug!(
            "event=contact_update module=mem_dao status=ok id={}",
            contact.id
        );
        Ok(true)
    }

    fn delete(&self, id: ContactId) -> StoreResult<bool> {
        let mut state = self.state.write();
        state.ensure_open()?;
        let removed = state.contacts.remove(&id).is_some();
        debug!("event=contact_delete module=mem_dao status=ok id={id} removed={removed}");
        Ok(removed)
    }

    fn shutdown(&self) -> StoreResult<()> {
        let mut state = self.state.write();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        let dropped = state.contacts.len();
        state.contacts.clear();
        info!("event=dao_shutdown module=mem_dao status=ok dropped={dropped}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemContactDao;
    use crate::dao::ContactDao;
    use crate::model::contact::Contact;

    #[test]
    fn next_id_follows_largest_id_in_use() {
        let dao = MemContactDao::new();
        let mut manual = Contact::with_fields("Manual", "M", "m@example.com");
        manual.id = 40;
        assert!(dao.save(&mut manual).unwrap());

        let mut generated = Contact::with_fields("Generated", "G", "g@example.com");
        assert!(dao.save(&mut generated).unwrap());
        assert_eq!(generated.id, 41);
    }

    #[test]
    fn failed_update_leaves_stored_contact_untouched() {
        let dao = MemContactDao::new();
        let mut contact = Contact::with_fields("Stable", "S", "s@example.com");
        dao.save(&mut contact).unwrap();

        let mut update = Contact::with_fields("Changed", "C", "c@example.com");
        update.id = contact.id + 100;
        assert!(dao.update(&update).is_err());

        let stored = dao.find(contact.id).unwrap().unwrap();
        assert_eq!(stored.title, "Stable");
        assert_eq!(dao.len(), 1);
    }
}
