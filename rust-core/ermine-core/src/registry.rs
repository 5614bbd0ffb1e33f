//! # Registry
//!
//! String-keyed store for application-wide values (configuration, database
//! handles, anything a controller needs to look up by name).
//!
//! The registry is an ordinary value: the application owns one and hands
//! clones to controllers. Clones share the same storage.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

type Slot = Arc<dyn Any + Send + Sync>;

/// Shared, typed key → value store
///
/// ```ignore
/// let registry = Registry::new();
/// registry.set("config", config);
/// let config = registry.get::<Config>("config");
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    data: Arc<RwLock<HashMap<String, Slot>>>,
}

impl Registry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `key`, replacing any previous one
    pub fn set<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.insert(key.into(), Arc::new(value));
    }

    /// Shared handle to the value under `key`
    ///
    /// Returns `None` if the key is absent or holds another type.
    #[must_use]
    pub fn get_shared<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get(key).cloned().and_then(|slot| slot.downcast::<T>().ok())
    }

    /// Cloned value under `key`
    ///
    /// Returns `None` if the key is absent or holds another type.
    #[must_use]
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        self.get_shared::<T>(key).map(|value| T::clone(&value))
    }

    /// Check if a key exists
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.contains_key(key)
    }

    /// Remove a value by key
    pub fn remove(&self, key: &str) -> bool {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.remove(key).is_some()
    }

    /// Get the number of stored items
    #[must_use]
    pub fn len(&self) -> usize {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<_> = data.keys().collect();
        keys.sort();
        f.debug_struct("Registry").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_set_then_get() {
        let registry = Registry::new();
        registry.set("count", 42i32);
        registry.set("name", "shop".to_string());

        assert_eq!(registry.get::<i32>("count"), Some(42));
        assert_eq!(registry.get::<String>("name"), Some("shop".to_string()));
        assert_eq!(registry.get::<i32>("missing"), None);
    }

    #[test]
    fn test_type_mismatch_is_none() {
        let registry = Registry::new();
        registry.set("count", 42i32);
        assert_eq!(registry.get::<String>("count"), None);
    }

    #[test]
    fn test_overwrite_and_remove() {
        let registry = Registry::new();
        registry.set("value", 1i32);
        registry.set("value", 2i32);
        assert_eq!(registry.get::<i32>("value"), Some(2));

        assert!(registry.remove("value"));
        assert!(!registry.contains("value"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_shared_values_are_not_cloned() {
        let registry = Registry::new();
        registry.set("config", Config::new());

        let a = registry.get_shared::<Config>("config").unwrap();
        let b = registry.get_shared::<Config>("config").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_clones_share_storage() {
        use std::thread;

        let registry = Registry::new();
        let clone = registry.clone();

        thread::spawn(move || clone.set("thread", 123i32))
            .join()
            .unwrap();
        assert_eq!(registry.get::<i32>("thread"), Some(123));
        assert_eq!(registry.len(), 1);
    }
}
