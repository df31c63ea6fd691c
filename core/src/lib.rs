//! # LINCHPIN CORE LIBRARY
//!
//! **HIERARCHICAL DEPENDENCY RESOLVER WITH AN OBSERVABLE CONTEXT STORE**
//!
//! **ARCHITECTURE**: Named factories resolved through parent-delegating resolvers
//! **GUARANTEE**: Linearizable registry access from any number of threads
//! **CONTEXT**: Namespaced process-wide values with weakly held observers
//!
//! ## USAGE
//!
//! ```rust
//! use linchpin::api::*;
//! use std::sync::Arc;
//!
//! configure().unwrap();
//! global().register_factory(Some("motd"), DependencyScope::Shared, || {
//!     Arc::new(String::from("welcome"))
//! });
//!
//! let motd: Inject<String> = Inject::named("motd");
//! assert_eq!(motd.get().as_str(), "welcome");
//!
//! let context: Inject<dyn AppContext> = Inject::new();
//! let status = AppStatus::Active(std::time::SystemTime::now());
//! context.get().set_context_value(status, APP_STATUS_KEY);
//! assert!(context.get().get_context_as::<AppStatus>(APP_STATUS_KEY).is_some());
//! ```

pub mod api;
pub mod bootstrap;
pub mod codec;
pub mod config;
pub mod context;
pub mod dependencies;
pub mod errors;
pub mod logging;

#[cfg(test)]
mod tests {
    use crate::api::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc, Mutex};
    use std::time::Duration;

    struct Channelled {
        tx: Mutex<mpsc::Sender<(String, Option<u32>)>>,
    }

    impl ContextObserver for Channelled {
        fn change_context(
            &self,
            key: &str,
            new_value: Option<&ContextValue>,
            _old_value: Option<&ContextValue>,
        ) {
            let value = new_value
                .and_then(|v| v.clone().downcast::<u32>().ok())
                .map(|v| *v);
            let _ = self.tx.lock().unwrap().send((key.to_string(), value));
        }
    }

    // **RESOLVER + CONTEXT PIPELINE**
    #[test]
    fn test_handler_resolved_from_child_resolver() {
        let root = Arc::new(DependencyResolver::new());
        let store = Arc::new(ContextStore::new());
        let shared_store = Arc::clone(&store);
        root.register_factory::<dyn Persistence, _>(None, DependencyScope::Shared, move || {
            Arc::clone(&shared_store) as Arc<dyn Persistence>
        });

        let persistence: Inject<dyn Persistence> = Inject::new().with_root(Arc::clone(&root));
        let handler = Arc::new(ContextHandler::with_persistence_handle(
            persistence,
            Arc::new(InlineDispatcher),
        ));
        let exposed = Arc::clone(&handler);
        root.register_factory::<dyn AppContext, _>(None, DependencyScope::Shared, move || {
            Arc::clone(&exposed) as Arc<dyn AppContext>
        });

        let child = root.child();
        let context = child.resolve::<dyn AppContext>(None).unwrap();
        context.set_context_value(9u32, "level");

        assert_eq!(*handler.get_context_as::<u32>("level").unwrap(), 9);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rayon_notifications_arrive_off_thread() {
        let config = NotifierConfig {
            worker_threads: 2,
            thread_name_prefix: "lib-test".to_string(),
        };
        let dispatcher = RayonDispatcher::new(&config).unwrap();
        let handler = ContextHandler::with_persistence(
            Arc::new(ContextStore::new()),
            Arc::new(dispatcher),
        );

        let (tx, rx) = mpsc::channel();
        let observer = Arc::new(Channelled { tx: Mutex::new(tx) });
        handler.observe(&observer, "k");

        handler.set_context_value(1u32, "k");
        let (key, value) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(key, "k");
        assert_eq!(value, Some(1));
    }

    #[test]
    fn test_shared_factory_invoked_once_under_contention() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let resolver = Arc::new(DependencyResolver::new());
        resolver.register_factory(Some("pool"), DependencyScope::Shared, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(String::from("pool"))
        });
        let held = resolver.resolve::<String>(Some("pool")).unwrap();

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                std::thread::spawn(move || resolver.resolve::<String>(Some("pool")).unwrap())
            })
            .collect();
        for worker in workers {
            assert!(Arc::ptr_eq(&worker.join().unwrap(), &held));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
