//! Plaintext submission records with draft/final status.
//!
//! Lower rigor than drafts by design: payloads are stored as plain JSON
//! text and only the most recent row per user is ever read. The one
//! invariant worth guarding is that `final` never reverts to `draft`.

use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::store::{now_rfc3339, parse_rfc3339, Store};
use crate::types::{SubmissionRecord, SubmissionStatus, UserId};

impl Store {
    /// Mirror the client's form state to the server as a `draft` submission.
    /// Rejected once the submission has been finalized.
    pub fn autosave_submission(&self, user_id: UserId, payload: &Value) -> Result<SubmissionRecord> {
        self.upsert_submission(user_id, payload, SubmissionStatus::Draft)
    }

    /// Store the form state and mark it `final`. Resubmission overwrites the
    /// payload but the status stays `final`.
    pub fn finalize_submission(&self, user_id: UserId, payload: &Value) -> Result<SubmissionRecord> {
        self.upsert_submission(user_id, payload, SubmissionStatus::Final)
    }

    fn upsert_submission(
        &self,
        user_id: UserId,
        payload: &Value,
        status: SubmissionStatus,
    ) -> Result<SubmissionRecord> {
        let payload_text = serde_json::to_string(payload)?;
        let now = now_rfc3339();

        let conn = self.conn.lock();
        let existing: Option<(i64, String)> = conn
            .query_row(
                "SELECT id, status FROM submissions WHERE user_id = ?1
                 ORDER BY updated_at DESC LIMIT 1",
                params![user_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        let id = match existing {
            Some((id, prev)) => {
                if prev == SubmissionStatus::Final.as_str()
                    && status == SubmissionStatus::Draft
                {
                    return Err(StoreError::AlreadyFinalized(user_id));
                }
                conn.execute(
                    "UPDATE submissions SET payload = ?1, status = ?2, updated_at = ?3
                     WHERE id = ?4",
                    params![payload_text, status.as_str(), now, id],
                )?;
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO submissions (user_id, status, payload, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)",
                    params![user_id, status.as_str(), payload_text, now],
                )?;
                conn.last_insert_rowid()
            }
        };
        debug!(user_id, status = status.as_str(), "submission upserted");
        self.read_submission(&conn, id)
    }

    /// The most recent submission for a user, if any.
    pub fn latest_submission(&self, user_id: UserId) -> Result<Option<SubmissionRecord>> {
        let conn = self.conn.lock();
        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM submissions WHERE user_id = ?1
                 ORDER BY updated_at DESC LIMIT 1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?;
        match id {
            Some(id) => Ok(Some(self.read_submission(&conn, id)?)),
            None => Ok(None),
        }
    }

    fn read_submission(
        &self,
        conn: &rusqlite::Connection,
        id: i64,
    ) -> Result<SubmissionRecord> {
        let (user_id, status, payload, created_at, updated_at) = conn.query_row(
            "SELECT user_id, status, payload, created_at, updated_at
             FROM submissions WHERE id = ?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                ))
            },
        )?;
        let status = SubmissionStatus::parse(&status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("unknown submission status: {status}").into(),
            )
        })?;
        Ok(SubmissionRecord {
            id,
            user_id,
            status,
            payload: serde_json::from_str(&payload)?,
            created_at: parse_rfc3339(&created_at)?,
            updated_at: parse_rfc3339(&updated_at)?,
        })
    }
}
