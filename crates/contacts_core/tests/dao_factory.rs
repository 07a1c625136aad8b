use contacts_core::{
    global, init_global, BackendKind, Contact, DaoConfig, DaoFactory, FactoryError, StoreError,
};
use std::sync::Barrier;
use std::sync::Arc;
use std::thread;

#[test]
fn open_named_selects_backend_case_insensitively() {
    let mem = DaoFactory::open_named("MeM").unwrap();
    assert_eq!(mem.backend(), BackendKind::Mem);

    let sqlite = DaoFactory::open_named("JPA").unwrap();
    assert_eq!(sqlite.backend(), BackendKind::Sqlite);
}

#[test]
fn unknown_backend_yields_no_factory() {
    let err = DaoFactory::open_named("xml").err().unwrap();
    assert!(matches!(err, FactoryError::UnknownBackend(name) if name == "xml"));
}

#[test]
fn contact_dao_is_shared_between_calls() {
    let factory = DaoFactory::open(DaoConfig::new(BackendKind::Mem)).unwrap();

    let mut contact = Contact::with_fields("Shared", "s", "s@example.com");
    assert!(factory.contact_dao().save(&mut contact).unwrap());
    assert!(factory.contact_dao().find(contact.id).unwrap().is_some());
    assert!(Arc::ptr_eq(&factory.contact_dao(), &factory.contact_dao()));
}

#[test]
fn sqlite_factory_uses_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("factory.sqlite3");
    let config = DaoConfig::new(BackendKind::Sqlite).with_db_path(&path);

    let factory = DaoFactory::open(config.clone()).unwrap();
    let mut contact = Contact::with_fields("On disk", "d", "d@example.com");
    factory.contact_dao().save(&mut contact).unwrap();
    factory.shutdown().unwrap();

    let reopened = DaoFactory::open(config).unwrap();
    assert!(reopened.contact_dao().find(contact.id).unwrap().is_some());
}

#[test]
fn seed_samples_inserts_fixed_contacts_once() {
    for backend in [BackendKind::Mem, BackendKind::Sqlite] {
        let factory = DaoFactory::open(DaoConfig::new(backend).with_seed_samples(true)).unwrap();
        let dao = factory.contact_dao();

        let first = dao.find(101).unwrap().unwrap();
        assert_eq!(first.title, "Test contact");
        assert_eq!(first.name.as_deref(), Some("Joe Experimental"));
        let second = dao.find(102).unwrap().unwrap();
        assert_eq!(second.email.as_deref(), Some("testee@foo.com"));

        assert_eq!(contacts_core::seed_samples(dao.as_ref()).unwrap(), 0);
        assert_eq!(dao.find_all().unwrap().len(), 2);
    }
}

#[test]
fn shutdown_closes_the_dao() {
    let factory = DaoFactory::open_named("mem").unwrap();
    factory.shutdown().unwrap();
    factory.shutdown().unwrap();
    assert!(matches!(
        factory.contact_dao().find_all(),
        Err(StoreError::Closed)
    ));
}

#[test]
fn global_factory_has_single_winner_and_rejects_conflicting_config() {
    let config = DaoConfig::new(BackendKind::Mem);
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let config = config.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                init_global(config).unwrap() as *const DaoFactory as usize
            })
        })
        .collect();
    let addresses: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));

    let installed = global().unwrap();
    assert_eq!(installed.backend(), BackendKind::Mem);

    let err = init_global(DaoConfig::new(BackendKind::Sqlite)).err().unwrap();
    assert!(matches!(
        err,
        FactoryError::AlreadyInitialized {
            active: BackendKind::Mem,
            requested: BackendKind::Sqlite
        }
    ));
    assert_eq!(global().unwrap().backend(), BackendKind::Mem);
}
