pub use crate::bootstrap::{configure, configure_with, inject_dependency};
pub use crate::codec::{DataDecoder, DataEncoder, UrlDataEncoder};
pub use crate::config::{LogConfig, NotifierConfig, RuntimeConfig};
pub use crate::context::{
    AppContext, AppContextExt, AppStatus, ContextHandler, ContextObserver, ContextStore,
    ContextValue, InlineDispatcher, Namespace, NotificationDispatcher, Persistence,
    PersistenceExt, RayonDispatcher, TokioDispatcher, APP_STATUS_KEY,
};
pub use crate::dependencies::{
    global, Dependency, DependencyResolver, DependencyScope, Inject, OptionalInject,
    PARENT_RESOLVER_NAME,
};
pub use crate::errors::{LinchpinError, LinchpinResult};
pub use crate::logging::init_logging;
