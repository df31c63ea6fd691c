//! Startup registration of the built-in components.
//!
//! Until [`configure`] (or [`configure_with`]) has run, resolving any of the
//! components below from the root resolver fails as unresolved.

use crate::codec::{
    DataDecoder, DataEncoder, JsonDecoder, JsonEncoder, UrlDataEncoder, UrlFormEncoder,
};
use crate::config::RuntimeConfig;
use crate::context::{AppContext, ContextHandler, ContextStore, Persistence, RayonDispatcher};
use crate::dependencies::{global, DependencyScope};
use crate::errors::LinchpinResult;
use once_cell::sync::{Lazy, OnceCell};
use std::sync::Arc;

pub const JSON_DECODER: &str = "JSONDecoder";
pub const JSON_ENCODER: &str = "JSONEncoder";
pub const URL_DATA_ENCODER: &str = "URLDataEncoder";

static PERSISTENCE: Lazy<Arc<ContextStore>> = Lazy::new(|| Arc::new(ContextStore::new()));
static APP_CONTEXT: OnceCell<Arc<ContextHandler>> = OnceCell::new();

/// [`configure_with`] using the default configuration.
pub fn configure() -> LinchpinResult<()> {
    configure_with(&RuntimeConfig::default())
}

/// Register the codecs, the process context store and the process context
/// handler into the root resolver.
///
/// Safe to call repeatedly: later calls re-register equivalent entries and
/// keep the handler (and its notification pool) built by the first call.
pub fn configure_with(config: &RuntimeConfig) -> LinchpinResult<()> {
    config.validate()?;
    let context = APP_CONTEXT.get_or_try_init(|| -> LinchpinResult<Arc<ContextHandler>> {
        let dispatcher = RayonDispatcher::new(&config.notifier)?;
        Ok(Arc::new(ContextHandler::new(Arc::new(dispatcher))))
    })?;

    let root = global();
    root.register_factory::<dyn DataDecoder, _>(
        Some(JSON_DECODER),
        DependencyScope::Transient,
        || Arc::new(JsonDecoder) as Arc<dyn DataDecoder>,
    );
    root.register_factory::<dyn DataEncoder, _>(
        Some(JSON_ENCODER),
        DependencyScope::Transient,
        || Arc::new(JsonEncoder) as Arc<dyn DataEncoder>,
    );
    root.register_factory::<dyn UrlDataEncoder, _>(
        Some(URL_DATA_ENCODER),
        DependencyScope::Transient,
        || Arc::new(UrlFormEncoder) as Arc<dyn UrlDataEncoder>,
    );

    let store = Arc::clone(&PERSISTENCE);
    root.register_factory::<dyn Persistence, _>(None, DependencyScope::Shared, move || {
        Arc::clone(&store) as Arc<dyn Persistence>
    });
    let context = Arc::clone(context);
    root.register_factory::<dyn AppContext, _>(None, DependencyScope::Shared, move || {
        Arc::clone(&context) as Arc<dyn AppContext>
    });

    log::info!("Registered built-in components into the root resolver");
    Ok(())
}

/// Register an application factory into the root resolver.
pub fn inject_dependency<T, F>(name: Option<&str>, scope: DependencyScope, factory: F)
where
    T: ?Sized + Send + Sync + 'static,
    F: Fn() -> Arc<T> + Send + Sync + 'static,
{
    global().register_factory(name, scope, factory);
}
