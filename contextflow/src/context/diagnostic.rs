//! Per-thread diagnostic (logging) context.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// An ordered copy of diagnostic key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticMap(BTreeMap<String, String>);

impl DiagnosticMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds an entry, builder style.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts an entry, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Gets the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Removes a key.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DiagnosticMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

thread_local! {
    static CURRENT: RefCell<DiagnosticMap> = const { RefCell::new(DiagnosticMap::new()) };
}

/// Accessors for the calling thread's diagnostic context.
///
/// Values put here are visible only to the calling thread. Wrappers carry a
/// copy to worker threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticContext;

impl DiagnosticContext {
    /// Puts a value into the current thread's context.
    pub fn put(key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        CURRENT.with(|current| {
            current.borrow_mut().insert(key, value);
        });
    }

    /// Gets a value from the current thread's context.
    #[must_use]
    pub fn get(key: &str) -> Option<String> {
        CURRENT.with(|current| current.borrow().get(key).map(String::from))
    }

    /// Removes a value from the current thread's context.
    pub fn remove(key: &str) -> Option<String> {
        CURRENT.with(|current| current.borrow_mut().remove(key))
    }

    /// Removes every entry from the current thread's context.
    pub fn clear() {
        // The slot may already be gone when a guard drops during thread exit.
        let _ = CURRENT.try_with(|current| *current.borrow_mut() = DiagnosticMap::new());
    }

    /// Returns a copy of the current thread's context.
    #[must_use]
    pub fn snapshot() -> DiagnosticMap {
        CURRENT.with(|current| current.borrow().clone())
    }

    /// Replaces the whole context, returning what was there before.
    pub fn replace(map: DiagnosticMap) -> DiagnosticMap {
        CURRENT
            .try_with(|current| std::mem::replace(&mut *current.borrow_mut(), map))
            .unwrap_or_default()
    }

    /// Returns true if the current thread's context has no entries.
    #[must_use]
    pub fn is_empty() -> bool {
        CURRENT.with(|current| current.borrow().is_empty())
    }

    /// Installs `map` until the returned scope is dropped, then puts the
    /// previous context back.
    pub fn scope(map: DiagnosticMap) -> DiagnosticScope {
        DiagnosticScope {
            previous: Some(Self::replace(map)),
            _thread_bound: PhantomData,
        }
    }
}

/// Restores the previous diagnostic context on drop.
///
/// Bound to the thread that created it.
#[must_use = "dropping the scope restores the previous context immediately"]
#[derive(Debug)]
pub struct DiagnosticScope {
    previous: Option<DiagnosticMap>,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for DiagnosticScope {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            DiagnosticContext::replace(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        DiagnosticContext::clear();
        DiagnosticContext::put("request_id", "abc");

        assert_eq!(DiagnosticContext::get("request_id"), Some("abc".to_string()));
        assert_eq!(DiagnosticContext::remove("request_id"), Some("abc".to_string()));
        assert!(DiagnosticContext::is_empty());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        DiagnosticContext::clear();
        DiagnosticContext::put("user", "alice");

        let snapshot = DiagnosticContext::snapshot();
        DiagnosticContext::put("user", "bob");

        assert_eq!(snapshot.get("user"), Some("alice"));
        assert_eq!(DiagnosticContext::get("user"), Some("bob".to_string()));
        DiagnosticContext::clear();
    }

    #[test]
    fn test_scope_restores_previous() {
        DiagnosticContext::clear();
        DiagnosticContext::put("tenant", "outer");

        {
            let _scope = DiagnosticContext::scope(DiagnosticMap::new().with_entry("tenant", "inner"));
            assert_eq!(DiagnosticContext::get("tenant"), Some("inner".to_string()));
        }

        assert_eq!(DiagnosticContext::get("tenant"), Some("outer".to_string()));
        DiagnosticContext::clear();
    }

    #[test]
    fn test_threads_have_independent_slots() {
        DiagnosticContext::clear();
        DiagnosticContext::put("request_id", "main");

        let seen = std::thread::spawn(|| DiagnosticContext::get("request_id"))
            .join()
            .unwrap();

        assert_eq!(seen, None);
        DiagnosticContext::clear();
    }

    #[test]
    fn test_map_serializes_as_object() {
        let map: DiagnosticMap = [("b", "2"), ("a", "1")].into_iter().collect();

        let json = serde_json::to_string(&map).unwrap();

        assert_eq!(json, r#"{"a":"1","b":"2"}"#);
    }
}
