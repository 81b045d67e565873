use common::{Key, OrderedIndex, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// The standard library's ordered map behind one reader-writer lock.
///
/// Same locking discipline as `BPlusTree`, so the comparison isolates the
/// node layout and rebalancing cost.
#[derive(Debug, Default)]
pub struct LockedBTreeMap {
    map: RwLock<BTreeMap<Key, Value>>,
}

impl LockedBTreeMap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderedIndex for LockedBTreeMap {
    fn name(&self) -> &str {
        "LockedBTreeMap"
    }

    fn insert(&self, key: Key, value: Value) -> bool {
        let mut map = self.map.write();
        if map.contains_key(&key) {
            return false;
        }
        map.insert(key, value);
        true
    }

    fn search(&self, key: Key) -> Option<Value> {
        self.map.read().get(&key).copied()
    }

    fn range_scan(&self, lo: Key, hi: Key) -> Vec<(Key, Value)> {
        if lo > hi {
            return Vec::new();
        }
        self.map
            .read()
            .range(lo..=hi)
            .map(|(&k, &v)| (k, v))
            .collect()
    }

    fn delete(&self, key: Key) -> Option<Value> {
        self.map.write().remove(&key)
    }

    fn len(&self) -> usize {
        self.map.read().len()
    }
}
