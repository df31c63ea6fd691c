//! The process-wide root resolver.
//!
//! Created on first access and alive until process exit. There is no reset:
//! the rest of the system may hold handles that captured it.

use crate::dependencies::resolver::DependencyResolver;
use crate::dependencies::types::DependencyScope;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Literal name under which the root resolver is registered in itself.
pub const PARENT_RESOLVER_NAME: &str = "parent";

static ROOT_RESOLVER: Lazy<Arc<DependencyResolver>> = Lazy::new(|| {
    let resolver = Arc::new(DependencyResolver::new());
    // Factories run only after this initializer has returned.
    resolver.register_factory(
        Some(PARENT_RESOLVER_NAME),
        DependencyScope::Shared,
        || Arc::clone(global()),
    );
    resolver.register_factory::<DependencyResolver, _>(None, DependencyScope::Shared, || {
        Arc::clone(global())
    });
    log::debug!("Root resolver initialized");
    resolver
});

/// The root resolver.
///
/// Factories that need "the resolver resolving me" can request
/// `Arc<DependencyResolver>` under either [`PARENT_RESOLVER_NAME`] or the
/// canonical type name.
pub fn global() -> &'static Arc<DependencyResolver> {
    &ROOT_RESOLVER
}
