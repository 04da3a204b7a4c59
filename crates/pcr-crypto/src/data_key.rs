//! Per-user data key primitives.
//!
//! Each user gets a random 256-bit data key at provisioning time. Draft
//! content is encrypted with the data key; the data key itself is wrapped
//! (encrypted) with the master key using AES-KW, so a future master-key
//! rotation only has to re-wrap N small blobs instead of re-encrypting
//! every draft.
//!
//! Wrapped wire format: AES-KW(master, data key) = 40 bytes.

use zeroize::{Zeroize, ZeroizeOnDrop};

use aes_kw::Kek;

use crate::error::CryptoError;
use crate::master_key::MasterKey;

/// Length of a raw data key in bytes (AES-256).
pub const DATA_KEY_LENGTH: usize = 32;

/// AES-KW output size for a 32-byte key: 32 + 8 = 40 bytes.
pub const WRAPPED_KEY_SIZE: usize = 40;

/// A user's raw symmetric key. Only ever held transiently while encrypting
/// or decrypting that user's draft; zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DataKey([u8; DATA_KEY_LENGTH]);

impl DataKey {
    pub fn as_bytes(&self) -> &[u8; DATA_KEY_LENGTH] {
        &self.0
    }
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DataKey(..)")
    }
}

/// Generate a random 256-bit data key from the OS CSPRNG.
pub fn generate_data_key() -> Result<DataKey, CryptoError> {
    let mut key = [0u8; DATA_KEY_LENGTH];
    getrandom::getrandom(&mut key).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(DataKey(key))
}

/// Wrap a data key under the master key using AES-KW.
pub fn wrap_data_key(
    data_key: &DataKey,
    master: &MasterKey,
) -> Result<[u8; WRAPPED_KEY_SIZE], CryptoError> {
    let kek = Kek::from(*master.as_bytes());
    let mut wrapped = [0u8; WRAPPED_KEY_SIZE];
    kek.wrap(&data_key.0, &mut wrapped)
        .map_err(|e| CryptoError::WrapFailed(format!("{e:?}")))?;
    Ok(wrapped)
}

/// Unwrap a data key from its wrapped blob.
///
/// Fails when the blob was wrapped under a different master key or has
/// been tampered with; AES-KW's integrity check never partially succeeds.
pub fn unwrap_data_key(wrapped: &[u8], master: &MasterKey) -> Result<DataKey, CryptoError> {
    if wrapped.len() != WRAPPED_KEY_SIZE {
        return Err(CryptoError::InvalidWrappedKeyLength {
            expected: WRAPPED_KEY_SIZE,
            got: wrapped.len(),
        });
    }
    let kek = Kek::from(*master.as_bytes());
    let mut key = [0u8; DATA_KEY_LENGTH];
    kek.unwrap(wrapped, &mut key)
        .map_err(|e| CryptoError::UnwrapFailed(format!("{e:?}")))?;
    Ok(DataKey(key))
}
