use parking_lot::Mutex;
use std::any::{type_name, Any, TypeId};
use std::sync::{Arc, Weak};

/// Lifecycle policy of a registered factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyScope {
    /// A new instance per resolution.
    #[default]
    Transient,
    /// One instance reused while something outside the resolver keeps it
    /// alive. The resolver only holds a weak reference, so once every strong
    /// owner is gone the next resolution runs the factory again.
    Shared,
}

/// Type-erased `Arc<T>` as handed out by a factory.
pub(crate) type ErasedArc = Box<dyn Any + Send + Sync>;

type ErasedFactory = Box<dyn Fn() -> (ErasedArc, Box<dyn ErasedWeak>) + Send + Sync>;

/// Weak half of a produced instance with the concrete type erased.
pub(crate) trait ErasedWeak: Send + Sync {
    fn upgrade_erased(&self) -> Option<ErasedArc>;
    fn is_alive(&self) -> bool;
}

impl<T: ?Sized + Send + Sync + 'static> ErasedWeak for Weak<T> {
    fn upgrade_erased(&self) -> Option<ErasedArc> {
        self.upgrade().map(|strong| Box::new(strong) as ErasedArc)
    }

    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

/// One registry entry: a name, a factory and a scope.
///
/// Immutable after construction except for the weak cache of a
/// [`DependencyScope::Shared`] entry.
pub struct Dependency {
    pub key: String,
    pub scope: DependencyScope,
    produced: TypeId,
    produced_name: &'static str,
    factory: ErasedFactory,
    cached: Mutex<Option<Box<dyn ErasedWeak>>>,
}

impl Dependency {
    /// Build an entry whose factory yields `Arc<T>`.
    ///
    /// `T` may be unsized, so trait objects register as `Arc<dyn Trait>`.
    pub fn new<T, F>(key: impl Into<String>, scope: DependencyScope, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            scope,
            produced: TypeId::of::<Arc<T>>(),
            produced_name: type_name::<T>(),
            factory: Box::new(move || {
                let strong = factory();
                let weak: Box<dyn ErasedWeak> = Box::new(Arc::downgrade(&strong));
                (Box::new(strong) as ErasedArc, weak)
            }),
            cached: Mutex::new(None),
        }
    }

    /// Entry registered under the canonical name of `T`.
    pub fn for_type<T, F>(scope: DependencyScope, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        Self::new(type_name::<T>(), scope, factory)
    }

    /// Canonical name of the type this entry produces.
    pub fn produced_type_name(&self) -> &'static str {
        self.produced_name
    }

    /// Whether a value of this entry can be viewed as `Arc<T>`.
    pub fn produces<T: ?Sized + 'static>(&self) -> bool {
        self.produced == TypeId::of::<Arc<T>>()
    }

    /// Whether a shared instance is currently alive in the weak cache.
    pub fn cached_instance_alive(&self) -> bool {
        self.cached
            .lock()
            .as_ref()
            .map(|weak| weak.is_alive())
            .unwrap_or(false)
    }

    /// Produce a value per scope and view it as `Arc<T>`.
    ///
    /// A type mismatch yields `None`, exactly like a missing entry.
    pub(crate) fn instance<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        if !self.produces::<T>() {
            return None;
        }
        let erased = match self.scope {
            DependencyScope::Transient => (self.factory)().0,
            DependencyScope::Shared => {
                // Held across the factory call so concurrent resolvers of a
                // stale entry agree on one new instance.
                let mut cached = self.cached.lock();
                match cached.as_ref().and_then(|weak| weak.upgrade_erased()) {
                    Some(alive) => alive,
                    None => {
                        let (strong, weak) = (self.factory)();
                        *cached = Some(weak);
                        strong
                    }
                }
            }
        };
        erased.downcast::<Arc<T>>().ok().map(|boxed| *boxed)
    }
}

impl std::fmt::Debug for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependency")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .field("produces", &self.produced_name)
            .finish()
    }
}
