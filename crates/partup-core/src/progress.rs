//! Progress reporting for uploads.
//!
//! A caller supplies either an async callback or a plain blocking one; extra
//! context the callback needs is captured by the closure. Blocking callbacks run
//! on the runtime's blocking pool so they cannot stall the upload loop.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::runtime::Handle;

type AsyncFn = dyn Fn(u64, u64) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync;
type BlockingFn = dyn Fn(u64, u64) + Send + Sync;

/// User progress callback invoked with `(current, total)` bytes.
#[derive(Clone)]
pub enum ProgressCallback {
    Async(Arc<AsyncFn>),
    Blocking(Arc<BlockingFn>),
}

impl ProgressCallback {
    /// Wrap an async callback; it is awaited on the upload task.
    pub fn asynchronous<F, Fut>(f: F) -> Self
    where
        F: Fn(u64, u64) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        ProgressCallback::Async(Arc::new(
            move |current: u64, total: u64| -> Pin<Box<dyn Future<Output = ()> + Send>> {
                Box::pin(f(current, total))
            },
        ))
    }

    /// Wrap a blocking callback; it runs on a blocking thread.
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(u64, u64) + Send + Sync + 'static,
    {
        ProgressCallback::Blocking(Arc::new(f))
    }
}

impl std::fmt::Debug for ProgressCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressCallback::Async(_) => f.write_str("ProgressCallback::Async"),
            ProgressCallback::Blocking(_) => f.write_str("ProgressCallback::Blocking"),
        }
    }
}

/// Snapshot of upload progress. Counts parts handed to workers, not parts
/// acknowledged by the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl ProgressState {
    /// Progress after `parts_dispatched` parts of `part_size` bytes.
    pub fn after_parts(parts_dispatched: u32, part_size: u64, total_bytes: u64) -> Self {
        Self {
            bytes_transferred: (u64::from(parts_dispatched) * part_size).min(total_bytes),
            total_bytes,
        }
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_transferred as f64 / self.total_bytes as f64).min(1.0)
    }
}

/// Uniform single-argument notifier built from an optional callback.
pub struct ProgressNotifier {
    callback: Option<ProgressCallback>,
    total: u64,
    executor: Option<Handle>,
}

impl ProgressNotifier {
    /// `executor` selects where blocking callbacks run (default: the current runtime).
    pub fn new(callback: Option<ProgressCallback>, total: u64, executor: Option<Handle>) -> Self {
        Self {
            callback,
            total,
            executor,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.callback.is_none()
    }

    /// Report `current` bytes; waits for the callback to finish.
    pub async fn notify(&self, current: u64) {
        let total = self.total;
        match &self.callback {
            None => {}
            Some(ProgressCallback::Async(f)) => f(current, total).await,
            Some(ProgressCallback::Blocking(f)) => {
                let f = Arc::clone(f);
                let handle = self.executor.clone().unwrap_or_else(Handle::current);
                if let Err(e) = handle.spawn_blocking(move || f(current, total)).await {
                    tracing::warn!(current, total, error = %e, "progress callback failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn progress_state_is_clamped() {
        let s = ProgressState::after_parts(3, 512, 1000);
        assert_eq!(s.bytes_transferred, 1000);
        assert!((s.fraction() - 1.0).abs() < 1e-9);
        let s = ProgressState::after_parts(1, 512, 1000);
        assert_eq!(s.bytes_transferred, 512);
        assert!((s.fraction() - 0.512).abs() < 1e-9);
    }

    #[tokio::test]
    async fn noop_notifier_does_nothing() {
        let n = ProgressNotifier::new(None, 10, None);
        assert!(n.is_noop());
        n.notify(5).await;
    }

    #[tokio::test]
    async fn async_callback_receives_current_and_total() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let label = String::from("upload-1");
        let cb = ProgressCallback::asynchronous(move |current, total| {
            let sink = Arc::clone(&sink);
            let label = label.clone();
            async move {
                sink.lock().unwrap().push((label, current, total));
            }
        });
        let n = ProgressNotifier::new(Some(cb), 100, None);
        n.notify(40).await;
        n.notify(100).await;
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![("upload-1".to_string(), 40, 100), ("upload-1".to_string(), 100, 100)]
        );
    }

    #[tokio::test]
    async fn blocking_callback_runs_off_the_runtime_thread() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let runtime_thread = std::thread::current().id();
        let cb = ProgressCallback::blocking(move |current, total| {
            sink.lock()
                .unwrap()
                .push((current, total, std::thread::current().id() != runtime_thread));
        });
        let n = ProgressNotifier::new(Some(cb), 8, None);
        n.notify(8).await;
        assert_eq!(*seen.lock().unwrap(), vec![(8, 8, true)]);
    }

    #[tokio::test]
    async fn panicking_blocking_callback_is_contained() {
        let cb = ProgressCallback::blocking(|_, _| panic!("callback bug"));
        let n = ProgressNotifier::new(Some(cb), 1, Some(Handle::current()));
        n.notify(1).await;
    }
}
