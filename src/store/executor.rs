//! Where asynchronous store operations run.

use tokio::runtime::Handle;
use tokio::task::JoinError;
use tracing::debug;

/// Execution context for the async store variants.
///
/// Async operations run their synchronous body on a blocking-pool thread
/// and suspend the caller until it finishes. Without an explicit runtime
/// handle the runtime driving the caller is used.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    handle: Option<Handle>,
}

impl Executor {
    /// Uses whichever tokio runtime awaits the operation.
    pub fn ambient() -> Self {
        Self::default()
    }

    /// Pins the runtime active on the calling thread, if any.
    pub fn current() -> Self {
        Self {
            handle: Handle::try_current().ok(),
        }
    }

    /// Runs operations on `handle`'s blocking pool.
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Returns true if a runtime handle is pinned.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.handle.is_some()
    }

    /// Runs `f` on the blocking pool and waits for its result.
    ///
    /// Runs `f` inline when no runtime is pinned and none is driving the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns the join error if `f` panics on the blocking pool.
    pub async fn run<F, R>(&self, f: F) -> Result<R, JoinError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        match self.runtime() {
            Some(handle) => handle.spawn_blocking(f).await,
            None => {
                debug!("No tokio runtime available, running async operation inline");
                Ok(f())
            },
        }
    }

    /// Starts `f` in the background without waiting.
    ///
    /// Runs `f` inline when no runtime is reachable from this thread.
    pub fn schedule<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self.runtime() {
            Some(handle) => {
                drop(handle.spawn_blocking(f));
            },
            None => {
                debug!("No tokio runtime available, running scheduled work inline");
                f();
            },
        }
    }

    fn runtime(&self) -> Option<Handle> {
        self.handle.clone().or_else(|| Handle::try_current().ok())
    }
}
