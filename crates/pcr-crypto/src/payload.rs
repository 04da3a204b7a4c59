//! Draft payload codec: canonical JSON + AES-256-GCM.
//!
//! Encrypted wire format: [1 byte: version=1][12 bytes: IV][ciphertext + tag],
//! base64url-encoded so the result can live in a TEXT column.
//!
//! Drafts are always encrypted with the user's unwrapped data key. The
//! master key never touches draft content; it only wraps data keys.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use serde_json::Value;

use crate::base64url::{base64url_decode, base64url_encode};
use crate::data_key::DataKey;
use crate::error::CryptoError;

/// Current payload wire-format version.
pub const PAYLOAD_VERSION: u8 = 1;

const IV_LENGTH: usize = 12;
const TAG_LENGTH: usize = 16;

// ---------------------------------------------------------------------------
// Canonical JSON
// ---------------------------------------------------------------------------

/// Canonical JSON serialization: sorted keys, no whitespace.
/// Deterministic regardless of input key ordering.
fn canonical_json(value: &Value) -> Result<String, CryptoError> {
    match value {
        Value::Null => Ok("null".to_string()),
        Value::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        Value::Number(n) => {
            let f = n.as_f64().unwrap_or(f64::NAN);
            if !f.is_finite() {
                return Err(CryptoError::NonFiniteNumber);
            }
            Ok(n.to_string())
        }
        // String serialization to JSON is infallible.
        Value::String(s) => Ok(serde_json::to_string(s).expect("string serializes")),
        Value::Array(arr) => {
            let items: Result<Vec<String>, _> = arr.iter().map(canonical_json).collect();
            Ok(format!("[{}]", items?.join(",")))
        }
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            let pairs: Result<Vec<String>, CryptoError> = keys
                .iter()
                .map(|k| {
                    let v = canonical_json(&obj[*k])?;
                    Ok(format!("{}:{}", serde_json::to_string(k).unwrap(), v))
                })
                .collect();
            Ok(format!("{{{}}}", pairs?.join(",")))
        }
    }
}

/// Serialize a structured payload to its canonical byte representation.
pub fn encode_payload(payload: &Value) -> Result<Vec<u8>, CryptoError> {
    Ok(canonical_json(payload)?.into_bytes())
}

/// Parse canonical payload bytes back to a structured value.
pub fn decode_payload(bytes: &[u8]) -> Result<Value, CryptoError> {
    serde_json::from_slice(bytes).map_err(|_| CryptoError::MalformedPayload)
}

// ---------------------------------------------------------------------------
// Authenticated encryption
// ---------------------------------------------------------------------------

fn generate_iv() -> Result<[u8; IV_LENGTH], CryptoError> {
    let mut iv = [0u8; IV_LENGTH];
    getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(iv)
}

/// Encode and encrypt a payload, returning text safe for a TEXT column.
pub fn encrypt_payload(payload: &Value, key: &DataKey) -> Result<String, CryptoError> {
    let plaintext = encode_payload(payload)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::EncryptFailed(e.to_string()))?;
    let iv = generate_iv()?;
    let nonce = Nonce::from_slice(&iv);
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_slice())
        .map_err(|e| CryptoError::EncryptFailed(e.to_string()))?;

    let mut blob = Vec::with_capacity(1 + IV_LENGTH + ciphertext.len());
    blob.push(PAYLOAD_VERSION);
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&ciphertext);
    Ok(base64url_encode(&blob))
}

/// Decrypt and decode a stored ciphertext string.
pub fn decrypt_payload(ciphertext_text: &str, key: &DataKey) -> Result<Value, CryptoError> {
    let blob =
        base64url_decode(ciphertext_text).map_err(|e| CryptoError::Base64Decode(e.to_string()))?;
    if blob.len() < 1 + IV_LENGTH + TAG_LENGTH {
        return Err(CryptoError::DataTooShort);
    }
    let version = blob[0];
    if version != PAYLOAD_VERSION {
        return Err(CryptoError::UnsupportedVersion(version));
    }
    let iv = &blob[1..1 + IV_LENGTH];
    let ciphertext = &blob[1 + IV_LENGTH..];

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::EncryptFailed(e.to_string()))?;
    let nonce = Nonce::from_slice(iv);
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::DecryptFailed)?;

    decode_payload(&plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_key::generate_data_key;
    use serde_json::json;

    // ========================================================================
    // Canonical encoding
    // ========================================================================

    #[test]
    fn encode_sorts_object_keys() {
        let a = json!({"zebra": 1, "apple": 2});
        let b = json!({"apple": 2, "zebra": 1});
        assert_eq!(encode_payload(&a).unwrap(), encode_payload(&b).unwrap());
        assert_eq!(
            encode_payload(&a).unwrap(),
            br#"{"apple":2,"zebra":1}"#.to_vec()
        );
    }

    #[test]
    fn encode_is_stable_for_fixed_input() {
        let p = json!({"patientName": "Jane", "vitals": [120, 80], "ok": true});
        assert_eq!(encode_payload(&p).unwrap(), encode_payload(&p).unwrap());
    }

    #[test]
    fn decode_encode_round_trips_all_shapes() {
        let shapes = vec![
            json!({}),
            json!(null),
            json!(true),
            json!(-3),
            json!(2.5),
            json!("a string"),
            json!([1, "two", null, {"three": 3}]),
            json!({"nested": {"deep": {"list": [[], {}, ""]}}}),
        ];
        for p in shapes {
            let bytes = encode_payload(&p).unwrap();
            assert_eq!(decode_payload(&bytes).unwrap(), p);
        }
    }

    #[test]
    fn empty_object_encodes_to_braces() {
        assert_eq!(encode_payload(&json!({})).unwrap(), b"{}".to_vec());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_payload(b"not json at all").unwrap_err(),
            CryptoError::MalformedPayload
        ));
    }

    // ========================================================================
    // Encrypt / decrypt
    // ========================================================================

    #[test]
    fn encrypt_decrypt_round_trip() {
        let key = generate_data_key().unwrap();
        let p = json!({"patientName": "Jane", "dob": "1990-01-01"});
        let ct = encrypt_payload(&p, &key).unwrap();
        assert_eq!(decrypt_payload(&ct, &key).unwrap(), p);
    }

    #[test]
    fn empty_payload_round_trips_to_empty_object() {
        let key = generate_data_key().unwrap();
        let ct = encrypt_payload(&json!({}), &key).unwrap();
        assert_eq!(decrypt_payload(&ct, &key).unwrap(), json!({}));
    }

    #[test]
    fn ciphertext_is_text_safe() {
        let key = generate_data_key().unwrap();
        let ct = encrypt_payload(&json!({"a": 1}), &key).unwrap();
        assert!(ct.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn different_ciphertext_each_time() {
        let key = generate_data_key().unwrap();
        let p = json!({"a": 1});
        let ct1 = encrypt_payload(&p, &key).unwrap();
        let ct2 = encrypt_payload(&p, &key).unwrap();
        assert_ne!(ct1, ct2);
        assert_eq!(decrypt_payload(&ct1, &key).unwrap(), p);
        assert_eq!(decrypt_payload(&ct2, &key).unwrap(), p);
    }

    #[test]
    fn wrong_key_fails() {
        let k1 = generate_data_key().unwrap();
        let k2 = generate_data_key().unwrap();
        let ct = encrypt_payload(&json!({"secret": true}), &k1).unwrap();
        assert!(matches!(
            decrypt_payload(&ct, &k2).unwrap_err(),
            CryptoError::DecryptFailed
        ));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = generate_data_key().unwrap();
        let ct = encrypt_payload(&json!({"a": 1}), &key).unwrap();
        let mut blob = base64url_decode(&ct).unwrap();
        for i in 0..blob.len() {
            blob[i] ^= 0x01;
            let corrupt = base64url_encode(&blob);
            assert!(decrypt_payload(&corrupt, &key).is_err(), "byte {i}");
            blob[i] ^= 0x01;
        }
    }

    #[test]
    fn rejects_unknown_version() {
        let key = generate_data_key().unwrap();
        let ct = encrypt_payload(&json!({"a": 1}), &key).unwrap();
        let mut blob = base64url_decode(&ct).unwrap();
        blob[0] = 9;
        let err = decrypt_payload(&base64url_encode(&blob), &key).unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedVersion(9)));
    }

    #[test]
    fn rejects_truncated_blob() {
        let key = generate_data_key().unwrap();
        let short = base64url_encode(&[PAYLOAD_VERSION, 0, 1, 2, 3]);
        assert!(matches!(
            decrypt_payload(&short, &key).unwrap_err(),
            CryptoError::DataTooShort
        ));
    }

    #[test]
    fn rejects_non_base64_text() {
        let key = generate_data_key().unwrap();
        assert!(matches!(
            decrypt_payload("not base64!!", &key).unwrap_err(),
            CryptoError::Base64Decode(_)
        ));
    }

    #[test]
    fn non_finite_numbers_rejected_at_encode() {
        // serde_json cannot construct non-finite numbers from literals, so
        // exercise the guard through from_f64 returning None instead.
        assert!(serde_json::Number::from_f64(f64::NAN).is_none());
        // A plain finite float still encodes.
        assert!(encode_payload(&json!(1.25)).is_ok());
    }
}
