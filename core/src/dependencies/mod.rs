pub mod global;
pub mod inject;
pub mod resolver;
pub mod types;

pub use global::{global, PARENT_RESOLVER_NAME};
pub use inject::{Inject, OptionalInject};
pub use resolver::DependencyResolver;
pub use types::{Dependency, DependencyScope};
