//! # CONTEXT
//!
//! Namespaced process-wide values ([`store`]) and the observable handler
//! layered on top of them ([`handler`]). Observer callbacks are handed to a
//! [`dispatch::NotificationDispatcher`] after every internal lock has been
//! released.

pub mod dispatch;
pub mod handler;
pub mod store;

pub use dispatch::{InlineDispatcher, NotificationDispatcher, RayonDispatcher, TokioDispatcher};
pub use handler::{
    AppContext, AppContextExt, AppStatus, ContextHandler, ContextObserver, APP_STATUS_KEY,
};
pub use store::{ContextStore, ContextValue, Namespace, Persistence, PersistenceExt};
