use contacts_core::{Contact, ContactError, UNSET_CONTACT_ID};
use std::collections::HashSet;

#[test]
fn new_contact_has_unset_id_and_fresh_timestamp() {
    let before = chrono::Utc::now() - chrono::Duration::seconds(1);
    let contact = Contact::new();

    assert_eq!(contact.id, UNSET_CONTACT_ID);
    assert!(!contact.is_persisted());
    assert!(contact.last_update >= before);
    assert_eq!(contact.photo_url, None);
}

#[test]
fn with_fields_sets_values_and_empty_photo_url() {
    let contact = Contact::with_fields("Acme", "Wile E.", "wile@acme.test");

    assert_eq!(contact.title, "Acme");
    assert_eq!(contact.name.as_deref(), Some("Wile E."));
    assert_eq!(contact.email.as_deref(), Some("wile@acme.test"));
    assert_eq!(contact.photo_url.as_deref(), Some(""));
    assert_eq!(contact.id, UNSET_CONTACT_ID);
}

#[test]
fn equality_and_hash_use_id_only() {
    let mut a = Contact::with_fields("A", "Alice", "a@example.com");
    let mut b = Contact::with_fields("B", "Bob", "b@example.com");
    a.id = 5;
    b.id = 5;
    assert_eq!(a, a.clone());
    assert_eq!(a, b);

    b.id = 6;
    a.title = b.title.clone();
    assert_ne!(a, b);

    let set: HashSet<Contact> = [Contact::with_id(1), Contact::with_id(1), Contact::with_id(2)]
        .into_iter()
        .collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn copy_of_overwrites_everything_but_id() {
    let mut target = Contact::with_fields("Old", "Old Name", "old@example.com");
    target.id = 10;
    let mut source = Contact::with_fields("New", "New Name", "new@example.com");
    source.id = 99;
    source.photo_url = Some("https://example.com/p.png".to_string());
    source.last_update = chrono::DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();

    target.copy_of(Some(&source)).unwrap();

    assert_eq!(target.id, 10);
    assert_eq!(target.title, source.title);
    assert_eq!(target.name, source.name);
    assert_eq!(target.email, source.email);
    assert_eq!(target.photo_url, source.photo_url);
    assert_eq!(target.last_update, source.last_update);
}

#[test]
fn copy_of_rejects_absent_source() {
    let mut target = Contact::with_fields("Keep", "K", "k@example.com");
    let err = target.copy_of(None).unwrap_err();
    assert_eq!(err, ContactError::MissingSource);
    assert_eq!(target.title, "Keep");
}

#[test]
fn apply_update_with_blank_title_keeps_title() {
    let mut target = Contact::with_fields("Original", "Name", "mail@example.com");
    target.id = 3;
    let mut update = Contact::with_fields("   ", "Changed", "changed@example.com");
    update.id = 3;

    target.apply_update(Some(&update)).unwrap();

    assert_eq!(target.title, "Original");
    assert_eq!(target.name.as_deref(), Some("Changed"));
    assert_eq!(target.email.as_deref(), Some("changed@example.com"));
}

#[test]
fn apply_update_with_title_replaces_it_and_clears_optional_fields() {
    let mut target = Contact::with_fields("Original", "Name", "mail@example.com");
    target.id = 3;
    target.photo_url = Some("photo.png".to_string());
    let mut update = Contact::new();
    update.title = "Renamed".to_string();

    target.apply_update(Some(&update)).unwrap();

    assert_eq!(target.title, "Renamed");
    assert_eq!(target.name, None);
    assert_eq!(target.email, None);
    assert_eq!(target.photo_url, None);
}

#[test]
fn apply_update_refreshes_last_update() {
    let mut target = Contact::with_fields("T", "N", "e@example.com");
    target.last_update = chrono::DateTime::from_timestamp_millis(1_000).unwrap();

    target
        .apply_update(Some(&Contact::with_fields("T2", "N2", "e2@example.com")))
        .unwrap();

    assert!(target.last_update.timestamp_millis() > 1_000);
}

#[test]
fn apply_update_accepts_unset_or_matching_id() {
    let mut target = Contact::with_fields("T", "N", "e@example.com");
    target.id = 42;

    let unset = Contact::with_fields("A", "B", "c@example.com");
    target.apply_update(Some(&unset)).unwrap();

    let mut same = Contact::with_fields("D", "E", "f@example.com");
    same.id = 42;
    target.apply_update(Some(&same)).unwrap();
    assert_eq!(target.title, "D");
}

#[test]
fn apply_update_rejects_mismatched_id() {
    let mut target = Contact::with_fields("T", "N", "e@example.com");
    target.id = 42;
    let mut other = Contact::with_fields("X", "Y", "z@example.com");
    other.id = 43;

    let err = target.apply_update(Some(&other)).unwrap_err();

    assert_eq!(
        err,
        ContactError::IdMismatch {
            target: 42,
            update: 43
        }
    );
    assert_eq!(target.title, "T");
}

#[test]
fn apply_update_with_absent_update_is_noop() {
    let mut target = Contact::with_fields("T", "N", "e@example.com");
    let before = target.clone();

    target.apply_update(None).unwrap();

    assert_eq!(target.title, before.title);
    assert_eq!(target.name, before.name);
    assert_eq!(target.last_update, before.last_update);
}

#[test]
fn validate_rejects_blank_title() {
    assert_eq!(Contact::new().validate(), Err(ContactError::BlankTitle));
    assert!(Contact::with_fields("ok", "", "").validate().is_ok());
}

#[test]
fn display_matches_list_format() {
    let mut contact = Contact::with_fields("Test contact", "Joe Experimental", "none@testing.com");
    contact.id = 101;
    assert_eq!(
        contact.to_string(),
        "Test contact: Joe Experimental <none@testing.com> (101)"
    );
}

#[test]
fn serialization_uses_camel_case_wire_fields() {
    let mut contact = Contact::with_fields("Acme", "Wile", "wile@acme.test");
    contact.id = 7;
    contact.photo_url = Some("https://acme.test/w.png".to_string());

    let json = serde_json::to_value(&contact).unwrap();
    assert_eq!(json["id"], 7);
    assert_eq!(json["title"], "Acme");
    assert_eq!(json["photoUrl"], "https://acme.test/w.png");
    assert!(json.get("lastUpdate").is_some());

    let decoded: Contact = serde_json::from_value(json).unwrap();
    assert_eq!(decoded.id, 7);
    assert_eq!(decoded.last_update, contact.last_update);
}

#[test]
fn deserialize_defaults_missing_id_and_optional_fields() {
    let decoded: Contact = serde_json::from_value(serde_json::json!({ "title": "Only title" })).unwrap();

    assert_eq!(decoded.id, UNSET_CONTACT_ID);
    assert_eq!(decoded.title, "Only title");
    assert_eq!(decoded.name, None);
    assert_eq!(decoded.photo_url, None);
}
