//! Application master key: the root of the key hierarchy.
//!
//! The key file contains a base64url-encoded (unpadded) 32-byte key,
//! provisioned out of band. A missing or malformed file is a startup-fatal
//! condition, not a per-request error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::base64url::base64url_decode;
use crate::error::CryptoError;

/// Length of the raw master key in bytes (AES-256).
pub const MASTER_KEY_LENGTH: usize = 32;

/// The application-wide symmetric key. Immutable for the process lifetime;
/// zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; MASTER_KEY_LENGTH]);

impl MasterKey {
    /// Build a master key from raw bytes, validating the length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; MASTER_KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: MASTER_KEY_LENGTH,
                    got: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_LENGTH] {
        &self.0
    }
}

// No Debug derive: key bytes must never end up in logs or error output.
impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

/// Read and validate the master key file at `path`.
///
/// Call once at startup and treat failure as fatal: no request can be
/// served without the master key.
pub fn load_master_key(path: &Path) -> Result<MasterKey, CryptoError> {
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CryptoError::KeyNotFound(path.display().to_string()),
        _ => CryptoError::KeyInvalid(format!("unreadable key file: {e}")),
    })?;
    let mut decoded = base64url_decode(contents.trim())
        .map_err(|_| CryptoError::KeyInvalid("not valid base64url".into()))?;
    let key = MasterKey::from_bytes(&decoded).map_err(|_| {
        CryptoError::KeyInvalid(format!(
            "decoded to {} bytes, expected {MASTER_KEY_LENGTH}",
            decoded.len()
        ))
    });
    decoded.zeroize();
    key
}

/// Caching loader for the master key.
///
/// Reads the key file at most once per process; every `load` after the
/// first returns the same cached key. The `OnceLock` guard makes the
/// first load safe against concurrent requests racing to initialize.
pub struct MasterKeyStore {
    path: PathBuf,
    cached: OnceLock<MasterKey>,
}

impl MasterKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: OnceLock::new(),
        }
    }

    /// Load the master key, reading the file only on the first call.
    pub fn load(&self) -> Result<&MasterKey, CryptoError> {
        if let Some(key) = self.cached.get() {
            return Ok(key);
        }
        let key = load_master_key(&self.path)?;
        Ok(self.cached.get_or_init(|| key))
    }
}
