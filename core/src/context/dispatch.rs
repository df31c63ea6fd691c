use crate::config::NotifierConfig;
use crate::errors::{LinchpinError, LinchpinResult};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

/// Unit of notification work.
pub type NotificationJob = Box<dyn FnOnce() + Send + 'static>;

/// Fire-and-forget executor for observer notifications.
///
/// No ordering is promised between two dispatched jobs.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, job: NotificationJob);
}

/// Runs notifications on a dedicated rayon pool.
pub struct RayonDispatcher {
    pool: Arc<ThreadPool>,
}

impl RayonDispatcher {
    pub fn new(config: &NotifierConfig) -> LinchpinResult<Self> {
        let prefix = config.thread_name_prefix.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads.max(1))
            .thread_name(move |idx| format!("{}-{}", prefix, idx))
            .panic_handler(|_| log::error!("Notification job panicked"))
            .build()
            .map_err(|e| LinchpinError::System {
                code: "LINCHPIN_NOTIFIER_POOL_BUILD_FAILED".to_string(),
                message: format!("Failed to create notification pool: {}", e),
            })?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl NotificationDispatcher for RayonDispatcher {
    fn dispatch(&self, job: NotificationJob) {
        self.pool.spawn(job);
    }
}

/// Runs notifications on a tokio runtime's blocking pool.
pub struct TokioDispatcher {
    handle: tokio::runtime::Handle,
}

impl TokioDispatcher {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Dispatcher bound to the runtime of the calling task.
    pub fn current() -> LinchpinResult<Self> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| LinchpinError::System {
                code: "LINCHPIN_NOTIFIER_NO_RUNTIME".to_string(),
                message: format!("No tokio runtime available: {}", e),
            })
    }
}

impl NotificationDispatcher for TokioDispatcher {
    fn dispatch(&self, job: NotificationJob) {
        // Observers are synchronous and may block.
        drop(self.handle.spawn_blocking(job));
    }
}

/// Runs notifications on the calling thread, in dispatch order.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl NotificationDispatcher for InlineDispatcher {
    fn dispatch(&self, job: NotificationJob) {
        job();
    }
}
