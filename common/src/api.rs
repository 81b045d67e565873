//! Defines the common API for all ordered index implementations.

/// The key type stored in an index.
pub type Key = i64;

/// The value type associated with each key.
pub type Value = i64;

/// The main trait defining the behavior of an ordered key-value index.
///
/// This trait is designed to be object-safe, so it can be used with
/// trait objects (`Arc<dyn OrderedIndex>`). Every method takes `&self`:
/// implementations synchronize internally, so callers need no lock awareness.
pub trait OrderedIndex: Send + Sync {
    /// Returns a short, human readable name for reports.
    fn name(&self) -> &str;

    /// Inserts a key-value pair.
    ///
    /// Returns `false` and leaves the stored value untouched if the key
    /// already exists.
    fn insert(&self, key: Key, value: Value) -> bool;

    /// Looks up the value stored under `key`.
    fn search(&self, key: Key) -> Option<Value>;

    /// Returns every pair with `lo <= key <= hi`, in increasing key order.
    ///
    /// Returns an empty vector when `lo > hi`.
    fn range_scan(&self, lo: Key, hi: Key) -> Vec<(Key, Value)>;

    /// Removes `key`, returning the value it held.
    fn delete(&self, key: Key) -> Option<Value>;

    /// Returns the number of stored keys.
    fn len(&self) -> usize;

    /// Returns `true` if the index holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
