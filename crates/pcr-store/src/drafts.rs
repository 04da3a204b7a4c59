//! Encrypted draft store: at most one draft per user.
//!
//! Every draft is encrypted under the owning user's data key, resolved and
//! unwrapped per operation. The master key never encrypts draft content.

use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::store::{now_rfc3339, parse_rfc3339, Store};
use crate::types::{DraftRecord, UserId};

impl Store {
    /// Encrypt and upsert the user's draft.
    ///
    /// The UNIQUE constraint on `user_id` enforces at-most-one-draft; two
    /// concurrent saves for the same user are not serialized beyond the
    /// row-level atomicity of the upsert, and the last writer wins.
    pub fn save_draft(&self, user_id: UserId, payload: &Value) -> Result<DraftRecord> {
        let data_key = self.resolve_data_key(user_id)?;
        let encrypted = pcr_crypto::encrypt_payload(payload, &data_key)?;
        let updated_at = now_rfc3339();

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO drafts (user_id, encrypted_payload, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
               encrypted_payload = excluded.encrypted_payload,
               updated_at = excluded.updated_at",
            params![user_id, encrypted, updated_at],
        )?;
        let record = conn.query_row(
            "SELECT id, user_id, encrypted_payload, updated_at FROM drafts WHERE user_id = ?1",
            params![user_id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                ))
            },
        )?;
        debug!(user_id, "draft saved");
        Ok(DraftRecord {
            id: record.0,
            user_id: record.1,
            encrypted_payload: record.2,
            updated_at: parse_rfc3339(&record.3)?,
        })
    }

    /// Fetch and decrypt the user's draft.
    pub fn load_draft(&self, user_id: UserId) -> Result<Value> {
        let encrypted: Option<String> = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT encrypted_payload FROM drafts WHERE user_id = ?1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?
        };
        let encrypted = encrypted.ok_or(StoreError::DraftNotFound(user_id))?;
        let data_key = self.resolve_data_key(user_id)?;
        Ok(pcr_crypto::decrypt_payload(&encrypted, &data_key)?)
    }

    /// Remove the user's draft if one exists. Used by cleanup paths; user
    /// deletion cascades without going through here.
    pub fn delete_draft(&self, user_id: UserId) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM drafts WHERE user_id = ?1", params![user_id])?;
        Ok(())
    }

    /// Number of draft rows for a user. Test and diagnostics helper for the
    /// at-most-one invariant.
    pub fn draft_count(&self, user_id: UserId) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT COUNT(*) FROM drafts WHERE user_id = ?1",
            params![user_id],
            |r| r.get(0),
        )
        .map_err(Into::into)
    }
}
