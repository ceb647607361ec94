use std::future::Future;
use std::time::Duration;

use futures::future::{abortable, AbortHandle};

/// Platform-independent helper to spawn an async task that runs in the background.
#[cfg(target_arch = "wasm32")]
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Platform-independent helper to spawn an async task that runs in the background.
///
/// Tasks are attached to the ambient tokio runtime when one is running; otherwise they are
/// handed to a lazily created background runtime.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    use std::sync::LazyLock;
    use tokio::runtime::{Builder, Handle, Runtime};

    static BACKGROUND_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
        Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("feature-flags-background")
            .enable_all()
            .build()
            .expect("failed to build background tokio runtime")
    });

    if let Ok(handle) = Handle::try_current() {
        handle.spawn(future);
    } else {
        let _ = BACKGROUND_RUNTIME.spawn(future);
    }
}

/// Owns a background task spawned with [`spawn_cancellable`].
///
/// Dropping the guard aborts the task at its next suspension point.
#[derive(Debug)]
pub struct TaskGuard {
    handle: AbortHandle,
}

impl TaskGuard {
    /// Aborts the task without waiting for the guard to be dropped.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_aborted()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns a background task whose lifetime is bound to the returned [`TaskGuard`].
#[cfg(target_arch = "wasm32")]
pub fn spawn_cancellable<F>(future: F) -> TaskGuard
where
    F: Future<Output = ()> + 'static,
{
    let (task, handle) = abortable(future);
    spawn_detached(async move {
        let _ = task.await;
    });
    TaskGuard { handle }
}

/// Spawns a background task whose lifetime is bound to the returned [`TaskGuard`].
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_cancellable<F>(future: F) -> TaskGuard
where
    F: Future<Output = ()> + Send + 'static,
{
    let (task, handle) = abortable(future);
    spawn_detached(async move {
        let _ = task.await;
    });
    TaskGuard { handle }
}

/// Asynchronously waits for the provided duration in a platform-compatible way.
pub async fn sleep(duration: Duration) {
    if duration.is_zero() {
        return;
    }

    sleep_impl(duration).await;
}

#[cfg(target_arch = "wasm32")]
async fn sleep_impl(duration: Duration) {
    use gloo_timers::future::sleep;
    sleep(duration).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn sleep_impl(duration: Duration) {
    use tokio::time::sleep;
    sleep(duration).await;
}
