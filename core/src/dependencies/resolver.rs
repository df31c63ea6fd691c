use crate::dependencies::types::{Dependency, DependencyScope};
use crate::errors::{LinchpinError, LinchpinResult};
use parking_lot::RwLock;
use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;

/// **HIERARCHICAL DEPENDENCY RESOLVER**
///
/// Maps names to [`Dependency`] entries and produces values on demand. A
/// lookup that finds nothing locally, or finds an entry of the wrong type,
/// is retried against the parent resolver, recursively.
///
/// All operations take the entries lock, so register/unregister/resolve are
/// linearizable per resolver. Factories run after the lock is released and
/// may therefore resolve from, or register into, the same resolver.
pub struct DependencyResolver {
    dependencies: RwLock<HashMap<String, Arc<Dependency>>>,
    parent: Option<Arc<DependencyResolver>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self {
            dependencies: RwLock::new(HashMap::new()),
            parent: None,
        }
    }

    /// Resolver that delegates misses to `parent`.
    pub fn with_parent(parent: Arc<DependencyResolver>) -> Self {
        Self {
            dependencies: RwLock::new(HashMap::new()),
            parent: Some(parent),
        }
    }

    /// New child resolver delegating to `self`.
    pub fn child(self: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self::with_parent(Arc::clone(self)))
    }

    pub fn parent(&self) -> Option<&Arc<DependencyResolver>> {
        self.parent.as_ref()
    }

    /// **REGISTER DEPENDENCY**
    ///
    /// Stores `dependency`, replacing any entry with the same key. Replacing
    /// is legal and only logged.
    pub fn register(&self, dependency: Dependency) {
        let key = dependency.key.clone();
        let scope = dependency.scope;
        let previous = self
            .dependencies
            .write()
            .insert(key.clone(), Arc::new(dependency));
        if previous.is_some() {
            log::warn!("'{}' is already registered and now overriding it", key);
        } else {
            log::debug!("Registered '{}' with scope {:?}", key, scope);
        }
    }

    /// Register `factory` under `name`, or under the canonical name of `T`
    /// when `name` is `None`.
    pub fn register_factory<T, F>(&self, name: Option<&str>, scope: DependencyScope, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let key = name.unwrap_or_else(|| type_name::<T>());
        self.register(Dependency::new(key, scope, factory));
    }

    /// Remove the entry named after `T`'s canonical name.
    ///
    /// Entries registered under a custom name are not reachable here.
    pub fn unregister<T: ?Sized + 'static>(&self) -> bool {
        let key = type_name::<T>();
        let removed = self.dependencies.write().remove(key).is_some();
        log::debug!("Unregistered '{}': {}", key, removed);
        removed
    }

    /// **RESOLVE DEPENDENCY**
    ///
    /// Returns `Err` when neither this resolver nor any ancestor can produce
    /// an `Arc<T>` for `name` (defaulting to `T`'s canonical name).
    pub fn resolve<T>(&self, name: Option<&str>) -> LinchpinResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = name.unwrap_or_else(|| type_name::<T>());
        self.lookup::<T>(key).ok_or_else(|| {
            log::error!("Dependency '{}' not resolved!", key);
            LinchpinError::unresolved(key, type_name::<T>())
        })
    }

    /// Same lookup as [`resolve`](Self::resolve); absence is `None`.
    pub fn resolve_optional<T>(&self, name: Option<&str>) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.lookup::<T>(name.unwrap_or_else(|| type_name::<T>()))
    }

    /// Resolve or abort the current thread.
    ///
    /// # Panics
    /// When the dependency cannot be resolved.
    pub fn required<T>(&self, name: Option<&str>) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.resolve::<T>(name) {
            Ok(value) => value,
            Err(_) => panic!("Dependency '{}' not resolved!", type_name::<T>()),
        }
    }

    fn lookup<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let local = self.dependencies.read().get(key).cloned();
        if let Some(value) = local.and_then(|dep| dep.instance::<T>()) {
            return Some(value);
        }
        let parent = self.parent.as_ref()?;
        log::trace!("'{}' not found locally, delegating to parent", key);
        parent.lookup::<T>(key)
    }

    /// Whether `name` has a local entry. Ancestors are not consulted.
    pub fn is_registered(&self, name: &str) -> bool {
        self.dependencies.read().contains_key(name)
    }

    /// Sorted local entry names.
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.dependencies.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether the weak cache of local entry `name` holds a live instance.
    pub fn cached_instance_alive(&self, name: &str) -> bool {
        self.dependencies
            .read()
            .get(name)
            .map(|dep| dep.cached_instance_alive())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.dependencies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.read().is_empty()
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DependencyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyResolver")
            .field("dependencies", &self.len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
