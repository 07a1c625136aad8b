//! SQLite-backed contact backend.
//!
//! # Responsibility
//! - Provide a durable `ContactDao` over the `contacts` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Each mutation is exactly one `IMMEDIATE` transaction: committed on
//!   success, rolled back on every error path before returning.
//! - Storage failures inside a mutation are logged and reported as `false`.
//! - Reads never open an explicit transaction.
//! - Title search folds case in Rust (`fold_title`), not with SQLite's
//!   ASCII-only `lower()`.

use crate::dao::{fold_title, ContactDao, StoreError, StoreResult};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::contact::{Contact, ContactId, UNSET_CONTACT_ID};
use log::{debug, info, warn};
use parking_lot::Mutex;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::path::Path;

const CONTACT_SELECT_SQL: &str = "SELECT
    id,
    title,
    name,
    email,
    photo_url,
    last_update
FROM contacts";

/// SQL name of the scalar function wrapping `fold_title`.
const FOLD_TITLE_FN: &str = "fold_title";

const REQUIRED_CONTACT_COLUMNS: &[&str] =
    &["id", "title", "name", "email", "photo_url", "last_update"];

/// `ContactDao` persisted in SQLite.
///
/// The connection sits behind a mutex because `rusqlite::Connection` is not
/// `Sync`; `None` means the backend was shut down.
pub struct SqliteContactDao {
    conn: Mutex<Option<Connection>>,
}

impl SqliteContactDao {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `DbError::UninitializedConnection` when migrations have not run.
    /// - `DbError::MissingRequiredTable` / `MissingRequiredColumn` when the
    ///   schema does not match what this backend reads and writes.
    ///
    /// # Side effects
    /// - Registers the `fold_title` SQL function on `conn`.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_connection_ready(&conn)?;
        register_fold_title(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Opens (or creates) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a private in-memory database and wraps it.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    fn with_conn<T, F>(&self, read: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(StoreError::Closed)?;
        read(conn)
    }

    /// Runs `mutation` inside one transaction.
    ///
    /// Returns `Ok(None)` when the store rejected the work (already logged and
    /// rolled back). Caller contract errors are returned after rollback.
    fn in_transaction<T, F>(
        &self,
        event: &str,
        id: ContactId,
        mutation: F,
    ) -> StoreResult<Option<T>>
    where
        F: FnOnce(&Transaction<'_>) -> StoreResult<T>,
    {
        let mut guard = self.conn.lock();
        let conn = guard.as_mut().ok_or(StoreError::Closed)?;

        let tx = match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
            Ok(tx) => tx,
            Err(err) => {
                warn!(
                    "event={event} module=sqlite_dao status=error id={id} error_code=tx_begin_failed error={err}"
                );
                return Ok(None);
            }
        };

        match mutation(&tx) {
            Ok(value) => match tx.commit() {
                Ok(()) => Ok(Some(value)),
                Err(err) => {
                    // A failed commit drops the transaction, which rolls back.
                    warn!(
                        "event={event} module=sqlite_dao status=error id={id} error_code=tx_commit_failed error={err}"
                    );
                    Ok(None)
                }
            },
            Err(StoreError::Db(err)) => {
                warn!(
                    "event={event} module=sqlite_dao status=conflict id={id} error_code=store_rejected error={err}"
                );
                rollback(tx, event, id);
                Ok(None)
            }
            Err(err) => {
                rollback(tx, event, id);
                Err(err)
            }
        }
    }
}

impl ContactDao for SqliteContactDao {
    fn find(&self, id: ContactId) -> StoreResult<Option<Contact>> {
        self.with_conn(|conn| select_contact(conn, id))
    }

    fn find_all(&self) -> StoreResult<Vec<Contact>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{CONTACT_SELECT_SQL} ORDER BY id ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut contacts = Vec::new();
            while let Some(row) = rows.next()? {
                contacts.push(parse_contact_row(row)?);
            }
            Ok(contacts)
        })
    }

    fn find_by_title(&self, title: &str) -> StoreResult<Vec<Contact>> {
        let needle = fold_title(title);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{CONTACT_SELECT_SQL}
                 WHERE instr({FOLD_TITLE_FN}(title), ?1) > 0
                 ORDER BY id ASC;"
            ))?;
            let mut rows = stmt.query([needle.as_str()])?;
            let mut contacts = Vec::new();
            while let Some(row) = rows.next()? {
                contacts.push(parse_contact_row(row)?);
            }
            Ok(contacts)
        })
    }

    fn save(&self, contact: &mut Contact) -> StoreResult<bool> {
        contact.validate()?;

        let pending = &*contact;
        let assigned = self.in_transaction("contact_save", pending.id, |tx| {
            if pending.id == UNSET_CONTACT_ID {
                tx.execute(
                    "INSERT INTO contacts (title, name, email, photo_url, last_update)
                     VALUES (?1, ?2, ?3, ?4, ?5);",
                    params![
                        pending.title.as_str(),
                        pending.name.as_deref(),
                        pending.email.as_deref(),
                        pending.photo_url.as_deref(),
                        pending.last_update,
                    ],
                )?;
                Ok(tx.last_insert_rowid())
            } else {
                tx.execute(
                    "INSERT INTO contacts (id, title, name, email, photo_url, last_update)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                    params![
                        pending.id,
                        pending.title.as_str(),
                        pending.name.as_deref(),
                        pending.email.as_deref(),
                        pending.photo_url.as_deref(),
                        pending.last_update,
                    ],
                )?;
                Ok(pending.id)
            }
        })?;

        match assigned {
            Some(id) => {
                contact.id = id;
                debug!("event=contact_save module=sqlite_dao status=ok id={id}");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn update(&self, contact: &Contact) -> StoreResult<bool> {
        let outcome = self.in_transaction("contact_update", contact.id, |tx| {
            let mut stored = select_contact(tx, contact.id)?
                .ok_or(StoreError::UnknownContact(contact.id))?;
            stored.apply_update(Some(contact))?;

            let changed = tx.execute(
                "UPDATE contacts
                 SET
                    title = ?2,
                    name = ?3,
                    email = ?4,
                    photo_url = ?5,
                    last_update = ?6
                 WHERE id = ?1;",
                params![
                    stored.id,
                    stored.title.as_str(),
                    stored.name.as_deref(),
                    stored.email.as_deref(),
                    stored.photo_url.as_deref(),
                    stored.last_update,
                ],
            )?;
            Ok(changed > 0)
        })?;

        Ok(outcome.unwrap_or(false))
    }

    fn delete(&self, id: ContactId) -> StoreResult<bool> {
        let outcome = self.in_transaction("contact_delete", id, |tx| {
            let changed = tx.execute("DELETE FROM contacts WHERE id = ?1;", [id])?;
            Ok(changed > 0)
        })?;

        Ok(outcome.unwrap_or(false))
    }

    fn shutdown(&self) -> StoreResult<()> {
        let Some(conn) = self.conn.lock().take() else {
            return Ok(());
        };

        match conn.close() {
            Ok(()) => {
                info!("event=dao_shutdown module=sqlite_dao status=ok");
                Ok(())
            }
            Err((_conn, err)) => {
                warn!(
                    "event=dao_shutdown module=sqlite_dao status=error error_code=db_close_failed error={err}"
                );
                Err(err.into())
            }
        }
    }
}

fn rollback(tx: Transaction<'_>, event: &str, id: ContactId) {
    if let Err(err) = tx.rollback() {
        warn!(
            "event={event} module=sqlite_dao status=error id={id} error_code=tx_rollback_failed error={err}"
        );
    }
}

fn select_contact(conn: &Connection, id: ContactId) -> StoreResult<Option<Contact>> {
    let contact = conn
        .query_row(
            &format!("{CONTACT_SELECT_SQL} WHERE id = ?1;"),
            [id],
            parse_contact_row,
        )
        .optional()?;
    Ok(contact)
}

fn parse_contact_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get("id")?,
        title: row.get("title")?,
        name: row.get("name")?,
        email: row.get("email")?,
        photo_url: row.get("photo_url")?,
        last_update: row.get("last_update")?,
    })
}

fn register_fold_title(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_TITLE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|title| fold_title(&title))),
    )
}

fn ensure_connection_ready(conn: &Connection) -> StoreResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version < expected_version {
        return Err(DbError::UninitializedConnection {
            expected_version,
            actual_version,
        }
        .into());
    }

    let has_table: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'contacts'
        );",
        [],
        |row| row.get(0),
    )?;
    if !has_table {
        return Err(DbError::MissingRequiredTable("contacts").into());
    }

    let mut stmt = conn.prepare("PRAGMA table_info(contacts);")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for required in REQUIRED_CONTACT_COLUMNS {
        if !columns.iter().any(|column| column == required) {
            return Err(DbError::MissingRequiredColumn {
                table: "contacts",
                column: *required,
            }
            .into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SqliteContactDao;
    use crate::dao::ContactDao;
    use crate::model::contact::Contact;

    #[test]
    fn fold_title_sql_function_lowercases_non_ascii_and_passes_null() {
        let dao = SqliteContactDao::open_in_memory().unwrap();
        let mut contact = Contact::with_fields("ÄRZTE Zentrum", "a", "a@example.com");
        dao.save(&mut contact).unwrap();

        dao.with_conn(|conn| {
            let folded: String =
                conn.query_row("SELECT fold_title(title) FROM contacts;", [], |row| row.get(0))?;
            assert_eq!(folded, "ärzte zentrum");
            let null: Option<String> =
                conn.query_row("SELECT fold_title(NULL);", [], |row| row.get(0))?;
            assert_eq!(null, None);
            Ok(())
        })
        .unwrap();
    }
}
