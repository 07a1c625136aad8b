//! Domain model for address-book contacts.
//!
//! # Responsibility
//! - Define the contact record shared by all storage backends.
//! - Keep entity consistency rules next to the data they protect.
//!
//! # Invariants
//! - Contacts are identified by their backend-assigned `ContactId`.
//! - A stored contact always has a non-blank title.

pub mod contact;
