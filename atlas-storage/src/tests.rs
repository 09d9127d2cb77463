use super::*;
use atlas_types::Address;

#[test]
fn test_flags_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flags");
    let alice = Address([0xaa; 20]);

    {
        let store = Storage::open(&path).unwrap();
        assert!(!store.kyc_submitted(&alice).unwrap());
        store.mark_kyc_submitted(alice).unwrap();
        assert!(store.kyc_submitted(&alice).unwrap());
    }

    {
        let store = Storage::open(&path).unwrap();
        assert!(store.kyc_submitted(&alice).unwrap());
        assert_eq!(store.snapshot().unwrap().kyc_submitted.len(), 1);
        store.clear_kyc_submitted(alice).unwrap();
    }

    let store = Storage::open(&path).unwrap();
    assert!(!store.kyc_submitted(&alice).unwrap());
}

#[test]
fn test_open_creates_missing_db() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flags");

    let store = Storage::open(&path).unwrap();
    store.mark_kyc_submitted(Address([1; 20])).unwrap();
    assert!(path.exists());
}

#[test]
fn test_flags_are_keyed_per_address() {
    let store = Storage::in_memory().unwrap();
    let alice = Address([0xaa; 20]);
    let bob = Address([0xbb; 20]);

    store.mark_kyc_submitted(alice).unwrap();
    store.mark_kyc_submitted(bob).unwrap();
    store.clear_kyc_submitted(alice).unwrap();

    assert!(!store.kyc_submitted(&alice).unwrap());
    assert!(store.kyc_submitted(&bob).unwrap());
    let raw = store.db.get(format!("kyc_submitted_{}", "bb".repeat(20)).as_bytes()).unwrap();
    assert!(raw.is_some());
    assert_eq!(store.snapshot().unwrap().kyc_submitted.into_iter().collect::<Vec<_>>(), vec![bob]);
}

#[test]
fn test_corrupt_value_is_an_error() {
    let store = Storage::in_memory().unwrap();
    let carol = Address([0xcc; 20]);
    store
        .db
        .put(format!("kyc_submitted_{}", "cc".repeat(20)).as_bytes(), [0xff, 0xff])
        .unwrap();
    assert!(store.kyc_submitted(&carol).is_err());
}

#[test]
fn test_in_memory_store() {
    let store = Storage::in_memory().unwrap();
    let bob = Address([0xbb; 20]);
    store.mark_kyc_submitted(bob).unwrap();
    store.mark_kyc_submitted(bob).unwrap();
    assert!(store.kyc_submitted(&bob).unwrap());
    assert!(!store.kyc_submitted(&Address::ZERO).unwrap());
    // Clearing an unknown address is a no-op.
    store.clear_kyc_submitted(Address::ZERO).unwrap();
}
