//! Connection handling and user lifecycle.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use pcr_crypto::MasterKey;

use crate::error::{Result, StoreError};
use crate::schema;
use crate::types::{UserId, UserRecord};

/// Persistence façade shared by the web layer's request handlers.
///
/// Holds one SQLite connection behind a mutex (operations are request-scoped
/// and short) plus the process-lifetime master key.
pub struct Store {
    pub(crate) conn: Arc<Mutex<Connection>>,
    pub(crate) master_key: MasterKey,
}

impl Store {
    pub fn open_path(path: impl AsRef<Path>, master_key: MasterKey) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, master_key)
    }

    pub fn open_in_memory(master_key: MasterKey) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, master_key)
    }

    fn from_connection(conn: Connection, master_key: MasterKey) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            master_key,
        })
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Create a user and provision its wrapped data key in one transaction.
    ///
    /// The password hash is computed by the auth layer; it is opaque here.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<UserId> {
        let data_key = pcr_crypto::generate_data_key()?;
        let wrapped = pcr_crypto::wrap_data_key(&data_key, &self.master_key)?;

        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO users (username, password_hash, wrapped_data_key) VALUES (?1, ?2, ?3)",
            params![username, password_hash, wrapped.as_slice()],
        );
        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                debug!(user_id = id, "user created with wrapped data key");
                Ok(id)
            }
            Err(e) if is_constraint_violation(&e) => Err(StoreError::UsernameTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a user by username (login path).
    pub fn find_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, username, wrapped_data_key IS NOT NULL FROM users WHERE username = ?1",
            params![username],
            |r| {
                Ok(UserRecord {
                    id: r.get(0)?,
                    username: r.get(1)?,
                    provisioned: r.get(2)?,
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }

    /// The stored password hash for a username, for the auth layer to verify.
    pub fn password_hash(&self, username: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT password_hash FROM users WHERE username = ?1",
            params![username],
            |r| r.get(0),
        )
        .optional()
        .map_err(Into::into)
    }

    /// All usernames, sorted (admin user list).
    pub fn list_usernames(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT username FROM users ORDER BY username ASC")?;
        let rows = stmt.query_map([], |r| r.get(0))?;
        rows.collect::<rusqlite::Result<Vec<String>>>()
            .map_err(Into::into)
    }

    /// Delete a user; drafts and submissions go with it (FK cascade), and
    /// the wrapped key is destroyed, so any ciphertext that escaped the
    /// database is unrecoverable too.
    pub fn delete_user(&self, user_id: UserId) -> Result<()> {
        let conn = self.conn.lock();
        let n = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        if n == 0 {
            return Err(StoreError::UserNotFound(user_id));
        }
        debug!(user_id, "user deleted with dependent rows");
        Ok(())
    }
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}
