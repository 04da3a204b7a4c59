use thiserror::Error;

use crate::types::UserId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] pcr_crypto::CryptoError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("username already taken")]
    UsernameTaken,

    #[error("user {0} already has a wrapped data key")]
    AlreadyProvisioned(UserId),

    // A user row without a wrapped key should never be reached by draft
    // operations; surfacing it as its own variant keeps the web layer's
    // 500-mapping honest instead of hiding a data-integrity gap.
    #[error("user {0} has no wrapped data key")]
    NotProvisioned(UserId),

    #[error("no draft found for user {0}")]
    DraftNotFound(UserId),

    #[error("submission for user {0} is already final")]
    AlreadyFinalized(UserId),
}

pub type Result<T> = std::result::Result<T, StoreError>;
