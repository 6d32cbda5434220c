use super::*;
use crate::advice::FALLBACK_TEXT;

const KEY: &str = "cachedAdvice";

fn store_with(raw: Option<&str>) -> (Arc<MemoryStore>, AdviceStore) {
    let kv = Arc::new(match raw {
        Some(raw) => MemoryStore::with_entry(KEY, raw),
        None => MemoryStore::new(),
    });
    let store = AdviceStore::new(Arc::clone(&kv) as Arc<dyn KeyValueStore>, KEY);
    (kv, store)
}

/// Store whose reads always fail.
struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk on fire")))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk on fire")))
    }
}

// =========================================================================
// load
// =========================================================================

#[test]
fn load_returns_cached_record() {
    let (_kv, store) = store_with(Some(r#"{"id":99,"advice":"Cached wisdom."}"#));
    assert_eq!(store.load(), AdviceRecord::new(99, "Cached wisdom."));
}

#[test]
fn load_missing_slot_returns_fallback() {
    let (_kv, store) = store_with(None);
    let record = store.load();
    assert_eq!(record.id, 0);
    assert_eq!(record.text, FALLBACK_TEXT);
}

#[test]
fn load_malformed_slot_returns_fallback() {
    for raw in ["{not json", r#"{"id":null,"advice":"Loading"}"#, r#"{"advice":"no id"}"#, "[]"] {
        let (_kv, store) = store_with(Some(raw));
        assert_eq!(store.load(), AdviceRecord::fallback(), "slot {raw:?}");
    }
}

#[test]
fn load_read_error_returns_fallback() {
    let store = AdviceStore::new(Arc::new(BrokenStore), KEY);
    assert_eq!(store.load(), AdviceRecord::fallback());
}

// =========================================================================
// save
// =========================================================================

#[test]
fn save_writes_json_slot() {
    let (kv, store) = store_with(None);
    store.save(&AdviceRecord::new(5, "Read more.")).unwrap();

    let raw = kv.get(KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value, serde_json::json!({ "id": 5, "advice": "Read more." }));
}

#[test]
fn save_then_load_returns_latest() {
    let (_kv, store) = store_with(Some(r#"{"id":1,"advice":"Old."}"#));
    store.save(&AdviceRecord::new(2, "New.")).unwrap();
    assert_eq!(store.load(), AdviceRecord::new(2, "New."));
}

#[test]
fn save_propagates_write_error() {
    let store = AdviceStore::new(Arc::new(BrokenStore), KEY);
    let err = store.save(&AdviceRecord::new(1, "x")).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
}
