//! Persistence layer for the PCR application.
//!
//! Owns the three tables the core cares about: `users` (identity plus the
//! wrapped per-user data key), `drafts` (at most one encrypted draft per
//! user), and `submissions` (plaintext form state with draft/final status).
//! All cryptography is delegated to `pcr-crypto`; this crate only decides
//! which key protects what and keeps the row-level invariants honest.

pub mod drafts;
pub mod error;
pub mod registry;
pub mod schema;
pub mod store;
pub mod submissions;
pub mod types;

pub use error::StoreError;
pub use store::Store;
pub use types::{DraftRecord, SubmissionRecord, SubmissionStatus, UserId, UserRecord};
