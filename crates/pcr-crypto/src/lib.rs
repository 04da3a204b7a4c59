//! Cryptographic core for PCR (patient care report) drafts.
//!
//! Key hierarchy: a single 32-byte application master key wraps one random
//! 32-byte data key per user (AES-KW). Draft payloads are canonical JSON
//! encrypted with the user's data key (AES-256-GCM), stored as base64url
//! text. Losing the master key makes every wrapped key, and transitively
//! every draft, unrecoverable — there is no escrow or rotation path.

pub mod base64url;
pub mod data_key;
pub mod error;
pub mod master_key;
pub mod payload;

pub use base64url::{base64url_decode, base64url_encode};
pub use data_key::{generate_data_key, unwrap_data_key, wrap_data_key, DataKey, WRAPPED_KEY_SIZE};
pub use error::CryptoError;
pub use master_key::{load_master_key, MasterKey, MasterKeyStore, MASTER_KEY_LENGTH};
pub use payload::{decode_payload, decrypt_payload, encode_payload, encrypt_payload};
