use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Master key file not found: {0}")]
    KeyNotFound(String),

    #[error("Master key is invalid: {0}")]
    KeyInvalid(String),

    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Invalid wrapped key length: expected {expected} bytes, got {got}")]
    InvalidWrappedKeyLength { expected: usize, got: usize },

    #[error("AES-KW wrap failed: {0}")]
    WrapFailed(String),

    #[error("AES-KW unwrap failed: {0}")]
    UnwrapFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptFailed(String),

    // Deliberately carries no detail: tag-verification failures must not
    // leak ciphertext or key material into error strings.
    #[error("Decryption failed: authentication tag did not verify")]
    DecryptFailed,

    #[error("Encrypted data too short")]
    DataTooShort,

    #[error("Unsupported payload version: {0}")]
    UnsupportedVersion(u8),

    #[error("canonical JSON: non-finite number is not representable")]
    NonFiniteNumber,

    #[error("Malformed payload: decrypted bytes are not valid JSON")]
    MalformedPayload,

    #[error("Base64 decode error: {0}")]
    Base64Decode(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
