//! Lazy, memoizing injection handles.
//!
//! A handle is declared wherever a dependency is needed and resolves on its
//! first access. Once a value has been obtained it is kept for the lifetime
//! of the handle and the resolver is never queried again, even if the
//! registry changes later. Two handles for the same name are independent.
//!
//! ```rust
//! use linchpin::dependencies::{global, DependencyScope, OptionalInject};
//! use std::sync::Arc;
//!
//! global().register_factory(Some("greeting"), DependencyScope::Transient, || {
//!     Arc::new(String::from("hello"))
//! });
//!
//! let greeting: OptionalInject<String> = OptionalInject::named("greeting");
//! assert_eq!(greeting.get().as_deref().map(String::as_str), Some("hello"));
//! ```

use crate::dependencies::global::global;
use crate::dependencies::resolver::DependencyResolver;
use crate::errors::LinchpinResult;
use once_cell::sync::OnceCell;
use std::any::type_name;
use std::sync::Arc;

struct InjectValue<T: ?Sized> {
    name: Option<String>,
    via: Option<String>,
    root: Option<Arc<DependencyResolver>>,
    storage: OnceCell<Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> InjectValue<T> {
    fn new(name: Option<String>, via: Option<String>) -> Self {
        Self {
            name,
            via,
            root: None,
            storage: OnceCell::new(),
        }
    }

    fn resolved(value: Arc<T>) -> Self {
        Self {
            name: None,
            via: None,
            root: None,
            storage: OnceCell::with_value(value),
        }
    }

    /// Resolver the target is looked up in: the `via` component if it
    /// resolves to a resolver, otherwise the root.
    fn resolver(&self) -> Arc<DependencyResolver> {
        let root = self.root.as_ref().unwrap_or_else(|| global());
        match self.via.as_deref() {
            Some(via) => root
                .resolve_optional::<DependencyResolver>(Some(via))
                .unwrap_or_else(|| {
                    log::debug!("'{}' is not a resolver, using the root", via);
                    Arc::clone(root)
                }),
            None => Arc::clone(root),
        }
    }

    fn get(&self) -> LinchpinResult<Arc<T>> {
        self.storage
            .get_or_try_init(|| self.resolver().resolve::<T>(self.name.as_deref()))
            .map(Arc::clone)
    }

    fn target(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| type_name::<T>())
    }
}

/// Required injection handle.
///
/// [`get`](Inject::get) panics when the dependency cannot be resolved;
/// [`try_get`](Inject::try_get) reports the failure instead.
pub struct Inject<T: ?Sized> {
    value: InjectValue<T>,
}

impl<T: ?Sized + Send + Sync + 'static> Inject<T> {
    /// Handle for `T` under its canonical name.
    pub fn new() -> Self {
        Self {
            value: InjectValue::new(None, None),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            value: InjectValue::new(Some(name.into()), None),
        }
    }

    /// Resolve through the resolver registered as `resolver_name`.
    pub fn via(resolver_name: impl Into<String>) -> Self {
        Self {
            value: InjectValue::new(None, Some(resolver_name.into())),
        }
    }

    pub fn named_via(name: impl Into<String>, resolver_name: impl Into<String>) -> Self {
        Self {
            value: InjectValue::new(Some(name.into()), Some(resolver_name.into())),
        }
    }

    /// Handle already holding `value`; never consults a resolver.
    pub fn resolved(value: Arc<T>) -> Self {
        Self {
            value: InjectValue::resolved(value),
        }
    }

    /// Use `root` instead of the global root resolver.
    pub fn with_root(mut self, root: Arc<DependencyResolver>) -> Self {
        self.value.root = Some(root);
        self
    }

    pub fn try_get(&self) -> LinchpinResult<Arc<T>> {
        self.value.get()
    }

    /// # Panics
    /// When the dependency cannot be resolved.
    pub fn get(&self) -> Arc<T> {
        match self.value.get() {
            Ok(value) => value,
            Err(_) => panic!("Dependency '{}' not resolved!", self.value.target()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.value.storage.get().is_some()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Optional injection handle; an unresolved dependency reads as `None`.
///
/// Only successful lookups are memoized, so a miss is retried on the next
/// access.
pub struct OptionalInject<T: ?Sized> {
    value: InjectValue<T>,
}

impl<T: ?Sized + Send + Sync + 'static> OptionalInject<T> {
    pub fn new() -> Self {
        Self {
            value: InjectValue::new(None, None),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            value: InjectValue::new(Some(name.into()), None),
        }
    }

    pub fn via(resolver_name: impl Into<String>) -> Self {
        Self {
            value: InjectValue::new(None, Some(resolver_name.into())),
        }
    }

    pub fn named_via(name: impl Into<String>, resolver_name: impl Into<String>) -> Self {
        Self {
            value: InjectValue::new(Some(name.into()), Some(resolver_name.into())),
        }
    }

    pub fn with_root(mut self, root: Arc<DependencyResolver>) -> Self {
        self.value.root = Some(root);
        self
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.value.get().ok()
    }

    pub fn is_resolved(&self) -> bool {
        self.value.storage.get().is_some()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Default for OptionalInject<T> {
    fn default() -> Self {
        Self::new()
    }
}
