//! Graceful Shutdown
//!
//! One `ShutdownController` is shared by `main`, the HTTP server and the
//! request-tracking middleware. Stopping flips a flag and wakes the server's
//! graceful-shutdown future; `main` then waits for the in-flight count to reach
//! zero before the GeoIP reader is dropped.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

struct Inner {
    stopping: AtomicBool,
    requests: AtomicUsize,
    stop_tx: broadcast::Sender<()>,
    idle: Notify,
}

/// Cloneable handle on the process-wide stop state.
#[derive(Clone)]
pub struct ShutdownController {
    inner: Arc<Inner>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(Inner {
                stopping: AtomicBool::new(false),
                requests: AtomicUsize::new(0),
                stop_tx,
                idle: Notify::new(),
            }),
        }
    }

    /// Resolves once [`shutdown`](Self::shutdown) has been called, including
    /// when it was called before this future was created.
    ///
    /// Handed to `axum::serve(..).with_graceful_shutdown(..)`.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.inner.stop_tx.subscribe();
        let inner = self.inner.clone();
        async move {
            if !inner.stopping.load(Ordering::SeqCst) {
                let _ = rx.recv().await;
            }
        }
    }

    /// Start stopping. Later calls are no-ops.
    pub fn shutdown(&self) {
        if self.inner.stopping.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("stopping: no new connections, draining requests");
        let _ = self.inner.stop_tx.send(());
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.stopping.load(Ordering::SeqCst)
    }

    /// Requests currently inside the router.
    pub fn in_flight(&self) -> usize {
        self.inner.requests.load(Ordering::SeqCst)
    }

    /// Count one request until the returned guard is dropped.
    pub fn request_guard(&self) -> RequestGuard {
        self.inner.requests.fetch_add(1, Ordering::SeqCst);
        RequestGuard {
            inner: self.inner.clone(),
        }
    }

    /// Wait up to `limit` for the in-flight count to reach zero.
    /// Returns false when requests were still running at the deadline.
    pub async fn wait_for_drain(&self, limit: Duration) -> bool {
        let idle = self.inner.idle.notified();
        tokio::pin!(idle);
        // registered before the count is read, a guard dropped in between still wakes us
        idle.as_mut().enable();

        if self.in_flight() == 0 {
            return true;
        }

        match tokio::time::timeout(limit, idle).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    "drain deadline passed with {} requests in flight",
                    self.in_flight()
                );
                false
            }
        }
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Held by the middleware for the lifetime of one request.
pub struct RequestGuard {
    inner: Arc<Inner>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        if self.inner.requests.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

/// Resolve on Ctrl+C or SIGTERM and start stopping.
///
/// A handler that cannot be installed is logged and never fires.
#[cfg_attr(coverage_nightly, coverage(off))]
pub async fn shutdown_signal(controller: ShutdownController) {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "Ctrl+C",
            Err(e) => {
                tracing::error!("cannot listen for Ctrl+C: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                tracing::error!("cannot listen for SIGTERM: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let received = tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    };
    tracing::info!("received {}", received);

    controller.shutdown();
}
