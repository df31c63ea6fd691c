use crate::context::dispatch::NotificationDispatcher;
use crate::context::store::{ContextValue, Namespace, Persistence};
use crate::dependencies::Inject;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::SystemTime;

/// Context key under which the [`AppStatus`] is published.
pub const APP_STATUS_KEY: &str = "appstatus";

/// Application status since a point in time.
#[derive(Debug, Clone, Copy)]
pub enum AppStatus {
    Inactive(SystemTime),
    Active(SystemTime),
}

/// Statuses compare by state only; the timestamp is ignored.
impl PartialEq for AppStatus {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (AppStatus::Inactive(_), AppStatus::Inactive(_))
                | (AppStatus::Active(_), AppStatus::Active(_))
        )
    }
}

impl Eq for AppStatus {}

/// Listener for context changes.
///
/// The calling thread depends on the handler's dispatcher: a pool worker for
/// [`RayonDispatcher`](crate::context::RayonDispatcher) and
/// [`TokioDispatcher`](crate::context::TokioDispatcher), the thread that
/// changed the value for [`InlineDispatcher`](crate::context::InlineDispatcher).
/// A panic is logged and does not reach other observers or the caller.
pub trait ContextObserver: Send + Sync {
    fn change_context(
        &self,
        key: &str,
        new_value: Option<&ContextValue>,
        old_value: Option<&ContextValue>,
    );
}

/// **APPLICATION CONTEXT**
///
/// Process-wide typed values with change notification.
pub trait AppContext: Send + Sync {
    /// Store `value` under `key` (`None` clears it) and notify the live
    /// observers registered for `key`.
    fn set_context(&self, value: Option<ContextValue>, key: &str);

    fn get_context(&self, key: &str) -> Option<ContextValue>;

    /// Register a weakly held observer for `key`. Registrations are not
    /// deduplicated.
    fn register(&self, observer: Weak<dyn ContextObserver>, key: &str);
}

/// Generic conveniences over [`AppContext`].
pub trait AppContextExt: AppContext {
    fn set_context_value<T: Any + Send + Sync>(&self, value: T, key: &str) {
        self.set_context(Some(Arc::new(value)), key);
    }

    fn clear_context(&self, key: &str) {
        self.set_context(None, key);
    }

    /// Read `key` as `T`; another type reads as absent.
    fn get_context_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get_context(key)?.downcast::<T>().ok()
    }

    /// Register `observer` without transferring ownership.
    fn observe<O: ContextObserver + 'static>(&self, observer: &Arc<O>, key: &str) {
        let weak: Weak<O> = Arc::downgrade(observer);
        self.register(weak, key);
    }
}

impl<C: AppContext + ?Sized> AppContextExt for C {}

struct ObserverRegistration {
    observer: Weak<dyn ContextObserver>,
    key: String,
}

/// Default [`AppContext`] backed by an injected [`Persistence`].
pub struct ContextHandler {
    persistence: Inject<dyn Persistence>,
    namespace: Namespace,
    observers: Mutex<Vec<ObserverRegistration>>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl ContextHandler {
    /// Handler whose store is resolved lazily from the root resolver.
    ///
    /// # Panics
    /// On first use, if no `dyn Persistence` is registered in the root.
    pub fn new(dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self::with_persistence_handle(Inject::new(), dispatcher)
    }

    /// Handler over an explicit store.
    pub fn with_persistence(
        persistence: Arc<dyn Persistence>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self::with_persistence_handle(Inject::resolved(persistence), dispatcher)
    }

    pub fn with_persistence_handle(
        persistence: Inject<dyn Persistence>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            persistence,
            namespace: Namespace::of::<ContextHandler>(),
            observers: Mutex::new(Vec::new()),
            dispatcher,
        }
    }

    /// Current number of registrations, stale ones included until the next
    /// prune.
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Live observers for `key`; drops every expired registration when any
    /// is found.
    fn live_observers(&self, key: &str) -> Vec<Arc<dyn ContextObserver>> {
        let mut observers = self.observers.lock();
        let mut stale = false;
        let mut matching = Vec::new();
        for registration in observers.iter() {
            match registration.observer.upgrade() {
                Some(observer) if registration.key == key => matching.push(observer),
                Some(_) => {}
                None => stale = true,
            }
        }
        if stale {
            let before = observers.len();
            observers.retain(|registration| registration.observer.strong_count() > 0);
            log::debug!(
                "Pruned {} released context observers",
                before - observers.len()
            );
        }
        matching
    }
}

/// Deliver one change, containing a panicking observer.
fn notify_observer(
    observer: &dyn ContextObserver,
    key: &str,
    new_value: Option<&ContextValue>,
    old_value: Option<&ContextValue>,
) {
    let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
        observer.change_context(key, new_value, old_value)
    }));
    if delivered.is_err() {
        log::error!("Context observer for '{}' panicked; notification dropped", key);
    }
}

impl AppContext for ContextHandler {
    fn set_context(&self, value: Option<ContextValue>, key: &str) {
        let old_value = self
            .persistence
            .get()
            .replace_value(value.clone(), key, &self.namespace);

        let observers = self.live_observers(key);
        if observers.is_empty() {
            return;
        }

        let key = key.to_string();
        self.dispatcher.dispatch(Box::new(move || {
            for observer in observers {
                notify_observer(observer.as_ref(), &key, value.as_ref(), old_value.as_ref());
            }
        }));
    }

    fn get_context(&self, key: &str) -> Option<ContextValue> {
        self.persistence.get().get_value(key, &self.namespace)
    }

    fn register(&self, observer: Weak<dyn ContextObserver>, key: &str) {
        self.observers.lock().push(ObserverRegistration {
            observer,
            key: key.to_string(),
        });
    }
}

impl std::fmt::Debug for ContextHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextHandler")
            .field("namespace", &self.namespace)
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::dispatch::InlineDispatcher;
    use crate::context::store::ContextStore;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, Option<String>, Option<String>)>>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<(String, Option<String>, Option<String>)> {
            self.seen.lock().clone()
        }
    }

    fn as_string(value: Option<&ContextValue>) -> Option<String> {
        value
            .and_then(|v| v.clone().downcast::<String>().ok())
            .map(|s| s.as_str().to_string())
    }

    impl ContextObserver for Recorder {
        fn change_context(
            &self,
            key: &str,
            new_value: Option<&ContextValue>,
            old_value: Option<&ContextValue>,
        ) {
            self.seen
                .lock()
                .push((key.to_string(), as_string(new_value), as_string(old_value)));
        }
    }

    fn inline_handler() -> ContextHandler {
        ContextHandler::with_persistence(Arc::new(ContextStore::new()), Arc::new(InlineDispatcher))
    }

    #[test]
    fn test_notifies_with_new_and_old_values() {
        let handler = inline_handler();
        let recorder = Arc::new(Recorder::default());
        handler.observe(&recorder, "k");

        handler.set_context_value(String::from("v1"), "k");
        handler.set_context_value(String::from("v2"), "k");

        assert_eq!(
            recorder.seen(),
            vec![
                ("k".to_string(), Some("v1".to_string()), None),
                (
                    "k".to_string(),
                    Some("v2".to_string()),
                    Some("v1".to_string())
                ),
            ]
        );
    }

    #[test]
    fn test_other_keys_are_not_notified() {
        let handler = inline_handler();
        let watched = Arc::new(Recorder::default());
        let other = Arc::new(Recorder::default());
        handler.observe(&watched, "k");
        handler.observe(&other, "other");

        handler.set_context_value(String::from("v"), "k");

        assert_eq!(watched.seen().len(), 1);
        assert!(other.seen().is_empty());
    }

    #[test]
    fn test_duplicate_registrations_notify_twice() {
        let handler = inline_handler();
        let recorder = Arc::new(Recorder::default());
        handler.observe(&recorder, "k");
        handler.observe(&recorder, "k");

        handler.set_context_value(String::from("v"), "k");
        assert_eq!(recorder.seen().len(), 2);
    }

    #[test]
    fn test_released_observer_is_pruned_on_any_set() {
        let handler = inline_handler();
        let kept = Arc::new(Recorder::default());
        let released = Arc::new(Recorder::default());
        handler.observe(&kept, "k");
        handler.observe(&released, "gone");
        assert_eq!(handler.observer_count(), 2);

        drop(released);
        // Pruning is not triggered by reads or registrations.
        let _ = handler.get_context("gone");
        assert_eq!(handler.observer_count(), 2);

        handler.set_context_value(1u8, "unrelated");
        assert_eq!(handler.observer_count(), 1);
        assert!(kept.seen().is_empty());
    }

    struct Faulty;

    impl ContextObserver for Faulty {
        fn change_context(&self, _: &str, _: Option<&ContextValue>, _: Option<&ContextValue>) {
            panic!("observer failure");
        }
    }

    #[test]
    fn test_panicking_observer_does_not_starve_others() {
        let handler = inline_handler();
        let faulty = Arc::new(Faulty);
        let healthy = Arc::new(Recorder::default());
        handler.observe(&faulty, "k");
        handler.observe(&healthy, "k");

        handler.set_context_value(String::from("v1"), "k");
        handler.set_context_value(String::from("v2"), "k");

        assert_eq!(healthy.seen().len(), 2);
        assert_eq!(handler.get_context_as::<String>("k").unwrap().as_str(), "v2");
    }

    #[test]
    fn test_cleared_context_reads_empty() {
        let handler = inline_handler();
        handler.set_context_value(String::from("v"), "k");
        assert_eq!(handler.get_context_as::<String>("k").unwrap().as_str(), "v");

        handler.clear_context("k");
        assert!(handler.get_context("k").is_none());
    }

    #[test]
    fn test_typed_read_of_wrong_type_is_empty() {
        let handler = inline_handler();
        handler.set_context_value(5u16, "n");
        assert!(handler.get_context_as::<String>("n").is_none());
        assert_eq!(*handler.get_context_as::<u16>("n").unwrap(), 5);
    }

    #[test]
    fn test_values_are_namespaced_by_handler() {
        let store = Arc::new(ContextStore::new());
        let handler = ContextHandler::with_persistence(
            Arc::clone(&store) as Arc<dyn Persistence>,
            Arc::new(InlineDispatcher),
        );
        handler.set_context_value(String::from("v"), "k");

        assert!(store.get_value("k", &Namespace::new("elsewhere")).is_none());
        assert!(store
            .get_value("k", &Namespace::of::<ContextHandler>())
            .is_some());
    }

    #[test]
    fn test_app_status_equality_ignores_timestamp() {
        let earlier = SystemTime::UNIX_EPOCH;
        let now = SystemTime::now();
        assert_eq!(AppStatus::Active(earlier), AppStatus::Active(now));
        assert_ne!(AppStatus::Active(now), AppStatus::Inactive(now));
    }
}
