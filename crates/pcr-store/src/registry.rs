//! User key registry: the wrapped-data-key column on `users`.
//!
//! Create-once, read-many. Overwriting an existing wrapped key would orphan
//! any encrypted draft for that user, so `provision` refuses to replace one.

use rusqlite::{params, OptionalExtension};
use tracing::{debug, warn};

use pcr_crypto::DataKey;

use crate::error::{Result, StoreError};
use crate::store::Store;
use crate::types::UserId;

impl Store {
    /// Generate and wrap a data key for an existing, unprovisioned user.
    ///
    /// `create_user` already provisions at creation time; this covers user
    /// rows that predate the key hierarchy.
    pub fn provision(&self, user_id: UserId) -> Result<()> {
        let data_key = pcr_crypto::generate_data_key()?;
        let wrapped = pcr_crypto::wrap_data_key(&data_key, &self.master_key)?;

        // One lock scope: the existence check and the NULL-guarded update
        // must not interleave with a concurrent provision.
        let conn = self.conn.lock();
        let existing: Option<bool> = conn
            .query_row(
                "SELECT wrapped_data_key IS NOT NULL FROM users WHERE id = ?1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?;
        match existing {
            None => return Err(StoreError::UserNotFound(user_id)),
            Some(true) => return Err(StoreError::AlreadyProvisioned(user_id)),
            Some(false) => {}
        }
        conn.execute(
            "UPDATE users SET wrapped_data_key = ?1 WHERE id = ?2 AND wrapped_data_key IS NULL",
            params![wrapped.as_slice(), user_id],
        )?;
        debug!(user_id, "data key provisioned");
        Ok(())
    }

    /// Load and unwrap the user's data key.
    pub fn resolve_data_key(&self, user_id: UserId) -> Result<DataKey> {
        let wrapped: Option<Option<Vec<u8>>> = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT wrapped_data_key FROM users WHERE id = ?1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?
        };
        match wrapped {
            None => Err(StoreError::UserNotFound(user_id)),
            Some(None) => {
                // A user without a key record is a provisioning gap, not a
                // normal miss; make it visible.
                warn!(user_id, "user has no wrapped data key");
                Err(StoreError::NotProvisioned(user_id))
            }
            Some(Some(blob)) => {
                Ok(pcr_crypto::unwrap_data_key(&blob, &self.master_key)?)
            }
        }
    }

    /// Drop the user's wrapped key. Any existing encrypted draft becomes
    /// permanently unrecoverable.
    pub fn revoke(&self, user_id: UserId) -> Result<()> {
        let conn = self.conn.lock();
        let n = conn.execute(
            "UPDATE users SET wrapped_data_key = NULL WHERE id = ?1",
            params![user_id],
        )?;
        if n == 0 {
            return Err(StoreError::UserNotFound(user_id));
        }
        debug!(user_id, "data key revoked");
        Ok(())
    }
}
