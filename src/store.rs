use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// The Store is a flat key-value mapping shared by every connection. It is
/// created empty at startup and lives for the whole process; `clear` removes
/// all entries but the Store itself persists. Cloning is cheap reference
/// counting, and every operation runs under a single mutex so commands stay
/// atomic with respect to other connections.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    keys: HashMap<Bytes, Bytes>,
}

impl Store {
    pub fn new() -> Store {
        Store::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap()
    }

    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.lock().keys.get(key).cloned()
    }

    pub fn set(&self, key: Bytes, value: Bytes) {
        self.lock().keys.insert(key, value);
    }

    /// Removes `key`, reporting whether it was present.
    pub fn delete(&self, key: &[u8]) -> bool {
        self.lock().keys.remove(key).is_some()
    }

    /// Removes every entry and returns how many there were.
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let count = state.keys.len();
        state.keys.clear();
        count
    }

    /// Reads all `keys` under one lock acquisition, preserving order.
    pub fn mget(&self, keys: &[Bytes]) -> Vec<Option<Bytes>> {
        let state = self.lock();
        keys.iter().map(|key| state.keys.get(key).cloned()).collect()
    }

    /// Writes all `pairs` under one lock acquisition and returns the number
    /// of pairs written.
    pub fn mset(&self, pairs: Vec<(Bytes, Bytes)>) -> usize {
        let mut state = self.lock();
        let count = pairs.len();
        for (key, value) in pairs {
            state.keys.insert(key, value);
        }
        count
    }

    pub fn size(&self) -> usize {
        self.lock().keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_absent_for_unknown_key() {
        let store = Store::new();
        assert_eq!(store.get(b"missing"), None);
    }

    #[test]
    fn last_write_wins() {
        let store = Store::new();

        store.set(Bytes::from("key"), Bytes::from("v1"));
        store.set(Bytes::from("key"), Bytes::from("v2"));

        assert_eq!(store.get(b"key"), Some(Bytes::from("v2")));
    }

    #[test]
    fn delete_reports_presence() {
        let store = Store::new();
        store.set(Bytes::from("key"), Bytes::from("value"));

        assert!(store.delete(b"key"));
        assert!(!store.delete(b"key"));
        assert_eq!(store.get(b"key"), None);
    }

    #[test]
    fn clear_returns_count_and_empties_the_store() {
        let store = Store::new();
        assert_eq!(store.clear(), 0);

        store.set(Bytes::from("k1"), Bytes::from("1"));
        store.set(Bytes::from("k2"), Bytes::from("2"));
        store.set(Bytes::from("k3"), Bytes::from("3"));

        assert_eq!(store.clear(), 3);
        assert_eq!(store.size(), 0);
        assert_eq!(store.get(b"k1"), None);
    }

    #[test]
    fn mget_preserves_key_order() {
        let store = Store::new();
        store.set(Bytes::from("k1"), Bytes::from("1"));
        store.set(Bytes::from("k3"), Bytes::from("3"));

        let values = store.mget(&[Bytes::from("k1"), Bytes::from("k2"), Bytes::from("k3")]);

        assert_eq!(
            values,
            vec![Some(Bytes::from("1")), None, Some(Bytes::from("3"))]
        );
    }

    #[test]
    fn mset_writes_all_pairs() {
        let store = Store::new();

        let written = store.mset(vec![
            (Bytes::from("k1"), Bytes::from("1")),
            (Bytes::from("k2"), Bytes::from("2")),
        ]);

        assert_eq!(written, 2);
        assert_eq!(store.get(b"k1"), Some(Bytes::from("1")));
        assert_eq!(store.get(b"k2"), Some(Bytes::from("2")));
    }
}
