use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type UserId = i64;

/// A user row, minus secrets: the password hash and wrapped key stay out of
/// anything that might be serialized toward a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    /// Whether a wrapped data key exists for this user.
    pub provisioned: bool,
}

/// The single encrypted draft a user may have.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftRecord {
    pub id: i64,
    pub user_id: UserId,
    /// Base64url text produced by `pcr_crypto::encrypt_payload`.
    pub encrypted_payload: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Draft,
    Final,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Final => "final",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(SubmissionStatus::Draft),
            "final" => Some(SubmissionStatus::Final),
            _ => None,
        }
    }
}

/// Plaintext submission state. Only the most recent row per user is ever
/// read; `Final` never transitions back to `Draft`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionRecord {
    pub id: i64,
    pub user_id: UserId,
    pub status: SubmissionStatus,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [SubmissionStatus::Draft, SubmissionStatus::Final] {
            assert_eq!(SubmissionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SubmissionStatus::parse("finalized"), None);
    }
}
