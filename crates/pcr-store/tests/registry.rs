//! User key registry: provision-once, revoke, user lifecycle.

use pcr_crypto::MasterKey;
use pcr_store::{Store, StoreError};
use serde_json::json;

fn test_store() -> Store {
    let master = MasterKey::from_bytes(&[0x42u8; 32]).unwrap();
    Store::open_in_memory(master).unwrap()
}

#[test]
fn create_user_provisions_a_key() {
    let store = test_store();
    let u1 = store.create_user("medic1", "hash").unwrap();
    assert!(store.resolve_data_key(u1).is_ok());

    let found = store.find_user("medic1").unwrap().unwrap();
    assert_eq!(found.id, u1);
    assert!(found.provisioned);
}

#[test]
fn duplicate_username_is_rejected() {
    let store = test_store();
    store.create_user("medic1", "hash").unwrap();
    assert!(matches!(
        store.create_user("medic1", "other-hash").unwrap_err(),
        StoreError::UsernameTaken
    ));
}

#[test]
fn provision_twice_fails_and_keeps_original_key() {
    let store = test_store();
    let u1 = store.create_user("medic1", "hash").unwrap();

    // A draft saved under the original key must stay decryptable after the
    // failed second provision.
    store.save_draft(u1, &json!({"patientName": "Jane"})).unwrap();
    assert!(matches!(
        store.provision(u1).unwrap_err(),
        StoreError::AlreadyProvisioned(_)
    ));
    assert_eq!(store.load_draft(u1).unwrap(), json!({"patientName": "Jane"}));
}

#[test]
fn provision_fills_a_missing_key() {
    let store = test_store();
    let u1 = store.create_user("medic1", "hash").unwrap();
    store.revoke(u1).unwrap();
    assert!(matches!(
        store.resolve_data_key(u1).unwrap_err(),
        StoreError::NotProvisioned(_)
    ));

    store.provision(u1).unwrap();
    assert!(store.resolve_data_key(u1).is_ok());
}

#[test]
fn unknown_user_operations_fail() {
    let store = test_store();
    assert!(matches!(
        store.provision(999).unwrap_err(),
        StoreError::UserNotFound(999)
    ));
    assert!(matches!(
        store.resolve_data_key(999).unwrap_err(),
        StoreError::UserNotFound(999)
    ));
    assert!(matches!(
        store.revoke(999).unwrap_err(),
        StoreError::UserNotFound(999)
    ));
    assert!(matches!(
        store.delete_user(999).unwrap_err(),
        StoreError::UserNotFound(999)
    ));
}

#[test]
fn list_usernames_is_sorted() {
    let store = test_store();
    store.create_user("zoe", "h").unwrap();
    store.create_user("amir", "h").unwrap();
    store.create_user("mara", "h").unwrap();
    assert_eq!(store.list_usernames().unwrap(), vec!["amir", "mara", "zoe"]);
}

#[test]
fn password_hash_round_trips_opaquely() {
    let store = test_store();
    store.create_user("medic1", "$2b$12$abcdef").unwrap();
    assert_eq!(
        store.password_hash("medic1").unwrap().as_deref(),
        Some("$2b$12$abcdef")
    );
    assert_eq!(store.password_hash("ghost").unwrap(), None);
}
