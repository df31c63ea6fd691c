use parking_lot::RwLock;
use std::any::{type_name, Any};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Arbitrary value kept in the context store.
pub type ContextValue = Arc<dyn Any + Send + Sync>;

/// Owner identity used to keep unrelated components' keys apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(Cow<'static, str>);

impl Namespace {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Namespace of the crate that defines `T`.
    pub fn of<T: ?Sized>() -> Self {
        let path = type_name::<T>();
        let crate_name = path.split("::").next().unwrap_or(path);
        Self(Cow::Borrowed(crate_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn key(&self, key: &str) -> String {
        format!("{}_{}", self.0, key)
    }
}

/// **NAMESPACED VALUE STORAGE**
///
/// Backing store for context values. Implementations must be safe under
/// concurrent readers and writers.
pub trait Persistence: Send + Sync {
    /// Store `value` under `key` in `owner`'s namespace; `None` removes it.
    fn set_value(&self, value: Option<ContextValue>, key: &str, owner: &Namespace);

    fn get_value(&self, key: &str, owner: &Namespace) -> Option<ContextValue>;

    /// Atomically store `value` and return what it replaced.
    fn replace_value(
        &self,
        value: Option<ContextValue>,
        key: &str,
        owner: &Namespace,
    ) -> Option<ContextValue>;
}

/// Typed reads on top of [`Persistence`].
pub trait PersistenceExt: Persistence {
    /// Read `key` as `T`. A value of another type reads as absent.
    fn get_value_as<T: Any + Send + Sync>(&self, key: &str, owner: &Namespace) -> Option<Arc<T>> {
        self.get_value(key, owner)?.downcast::<T>().ok()
    }
}

impl<P: Persistence + ?Sized> PersistenceExt for P {}

/// In-memory [`Persistence`] living as long as the process.
#[derive(Default)]
pub struct ContextStore {
    data: RwLock<HashMap<String, ContextValue>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Persistence for ContextStore {
    fn set_value(&self, value: Option<ContextValue>, key: &str, owner: &Namespace) {
        self.replace_value(value, key, owner);
    }

    fn get_value(&self, key: &str, owner: &Namespace) -> Option<ContextValue> {
        self.data.read().get(&owner.key(key)).cloned()
    }

    fn replace_value(
        &self,
        value: Option<ContextValue>,
        key: &str,
        owner: &Namespace,
    ) -> Option<ContextValue> {
        let namespaced = owner.key(key);
        let mut data = self.data.write();
        match value {
            Some(value) => data.insert(namespaced, value),
            None => data.remove(&namespaced),
        }
    }
}

impl std::fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextStore")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct Owner;

    fn value<T: Any + Send + Sync>(v: T) -> Option<ContextValue> {
        Some(Arc::new(v))
    }

    #[test]
    fn test_namespace_of_uses_defining_crate() {
        assert_eq!(Namespace::of::<Owner>().as_str(), "linchpin");
        assert_eq!(Namespace::of::<String>().as_str(), "alloc");
    }

    #[test]
    fn test_set_get_and_clear() {
        let store = ContextStore::new();
        let owner = Namespace::new("billing");

        store.set_value(value(String::from("v1")), "k", &owner);
        assert_eq!(
            store.get_value_as::<String>("k", &owner).unwrap().as_str(),
            "v1"
        );

        store.set_value(None, "k", &owner);
        assert!(store.get_value("k", &owner).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let store = ContextStore::new();
        let a = Namespace::new("a");
        let b = Namespace::new("b");

        store.set_value(value(1u32), "shared", &a);
        store.set_value(value(2u32), "shared", &b);

        assert_eq!(*store.get_value_as::<u32>("shared", &a).unwrap(), 1);
        assert_eq!(*store.get_value_as::<u32>("shared", &b).unwrap(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_wrong_type_reads_as_absent() {
        let store = ContextStore::new();
        let owner = Namespace::of::<Owner>();
        store.set_value(value(3.5f64), "ratio", &owner);

        assert!(store.get_value_as::<String>("ratio", &owner).is_none());
        assert!(store.get_value("ratio", &owner).is_some());
    }

    #[test]
    fn test_replace_returns_previous() {
        let store = ContextStore::new();
        let owner = Namespace::new("swap");

        assert!(store.replace_value(value(1i32), "n", &owner).is_none());
        let old = store.replace_value(value(2i32), "n", &owner).unwrap();
        assert_eq!(*old.downcast::<i32>().unwrap(), 1);
        let old = store.replace_value(None, "n", &owner).unwrap();
        assert_eq!(*old.downcast::<i32>().unwrap(), 2);
    }

    #[test]
    fn test_concurrent_writers_keep_map_consistent() {
        let store = Arc::new(ContextStore::new());
        let owner = Namespace::new("stress");

        let workers: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                let owner = owner.clone();
                thread::spawn(move || {
                    for i in 0..500 {
                        let key = format!("{}-{}", t, i % 50);
                        store.set_value(value(i), &key, &owner);
                        let _ = store.get_value_as::<i32>(&key, &owner);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(store.len(), 8 * 50);
    }
}
