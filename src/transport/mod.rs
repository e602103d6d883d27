//! Out-of-process signing transport.
//!
//! # Data Flow
//! ```text
//! connector
//!     → SigningSurface::execute (register id, open surface, await outcome)
//!     → SurfaceHost (opens the wallet page, handles blocked opens)
//!     → SigningSurface::deliver (routes posted messages back by id)
//! ```
//!
//! # Design Decisions
//! - Outcomes correlate by a per-operation id embedded in the request URL,
//!   never by arrival order
//! - A closure poll turns "user closed the window" into a first-class
//!   cancellation instead of a hang
//! - Interim and malformed messages are logged and dropped; only terminal
//!   statuses resolve a waiter

pub mod message;
pub mod pending;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ConnectorError, ConnectorResult};

pub use message::{OutcomeStatus, WalletMessage};
pub use pending::PendingOperations;

/// How often the surface is checked for user closure.
const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Failures opening the signing surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The host refused the open outside a user gesture. Recoverable: prompt
    /// for a gesture and retry.
    #[error("surface open blocked, user gesture required")]
    OpenBlocked,

    #[error("failed to open signing surface: {0}")]
    Open(String),
}

/// Environment hook that opens the wallet's signing page.
#[async_trait]
pub trait SurfaceHost: Send + Sync {
    /// Open the surface at `url`.
    async fn open(&self, url: &str) -> Result<Arc<dyn SurfaceHandle>, SurfaceError>;

    /// Ask the user for an explicit gesture after a blocked open. Returns
    /// false if the user declined.
    async fn request_user_gesture(&self) -> bool;
}

/// A live signing surface.
pub trait SurfaceHandle: Send + Sync {
    fn is_closed(&self) -> bool;
    fn close(&self);
}

/// Orchestrates one signing round-trip through an external surface.
pub struct SigningSurface {
    host: Arc<dyn SurfaceHost>,
    pending: Arc<PendingOperations>,
}

impl SigningSurface {
    pub fn new(host: Arc<dyn SurfaceHost>) -> Self {
        Self {
            host,
            pending: Arc::new(PendingOperations::new()),
        }
    }

    /// Run one operation: open the surface at the URL built from a fresh
    /// correlation id and wait for its terminal outcome.
    ///
    /// A blocked open prompts for a user gesture and retries once. Closing
    /// the surface before an outcome arrives yields
    /// [`ConnectorError::Cancelled`].
    pub async fn execute<F>(&self, build_url: F) -> ConnectorResult<WalletMessage>
    where
        F: FnOnce(Uuid) -> String,
    {
        let (id, receiver) = self.pending.register();
        let url = build_url(id);

        let handle = match self.open_with_gesture_retry(&url).await {
            Ok(handle) => handle,
            Err(e) => {
                self.pending.cancel(id);
                return Err(e);
            }
        };

        self.spawn_closure_poll(id, handle.clone());

        let result = match receiver.await {
            Ok(message) => match message.status {
                Some(OutcomeStatus::Success) => Ok(message),
                Some(OutcomeStatus::Failure) => Err(ConnectorError::Rejected(
                    message
                        .error_message
                        .unwrap_or_else(|| "wallet reported failure".to_string()),
                )),
                other => Err(ConnectorError::InvalidResponse(format!(
                    "non-terminal outcome delivered: {other:?}"
                ))),
            },
            // Waiter dropped: the closure poll saw the surface close.
            Err(_) => Err(ConnectorError::Cancelled),
        };

        handle.close();
        result
    }

    /// Route one message posted by the surface to its waiter.
    ///
    /// Messages carrying `method` are surface-originated requests, not
    /// outcomes. Interim statuses leave the waiter armed.
    pub fn deliver(&self, payload: serde_json::Value) {
        let message: WalletMessage = match serde_json::from_value(payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable surface message");
                return;
            }
        };
        if let Some(method) = &message.method {
            tracing::debug!(method, "Ignoring surface request message");
            return;
        }
        let Some(id) = message.id else {
            tracing::warn!("Dropping surface outcome without correlation id");
            return;
        };
        match message.status {
            Some(OutcomeStatus::Success | OutcomeStatus::Failure) => {
                if !self.pending.resolve(id, message) {
                    tracing::debug!(%id, "Late or duplicate outcome dropped");
                }
            }
            status => {
                tracing::debug!(%id, ?status, "Interim surface status, still waiting");
            }
        }
    }

    async fn open_with_gesture_retry(
        &self,
        url: &str,
    ) -> ConnectorResult<Arc<dyn SurfaceHandle>> {
        match self.host.open(url).await {
            Ok(handle) => Ok(handle),
            Err(SurfaceError::OpenBlocked) => {
                tracing::info!("Surface open blocked, requesting user gesture");
                if !self.host.request_user_gesture().await {
                    return Err(ConnectorError::Cancelled);
                }
                match self.host.open(url).await {
                    Ok(handle) => Ok(handle),
                    Err(e) => Err(ConnectorError::Surface(e.to_string())),
                }
            }
            Err(e) => Err(ConnectorError::Surface(e.to_string())),
        }
    }

    fn spawn_closure_poll(&self, id: Uuid, handle: Arc<dyn SurfaceHandle>) {
        let pending = self.pending.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLOSE_POLL_INTERVAL).await;
                if !pending.contains(id) {
                    return;
                }
                if handle.is_closed() {
                    tracing::info!(%id, "Signing surface closed by user");
                    pending.cancel(id);
                    return;
                }
            }
        });
    }
}

impl std::fmt::Debug for SigningSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSurface").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct TestHandle {
        closed: AtomicBool,
    }

    impl SurfaceHandle for TestHandle {
        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    struct TestHost {
        blocked_opens: AtomicUsize,
        grant_gesture: bool,
        last_url: Mutex<Option<String>>,
        handle: Arc<TestHandle>,
    }

    impl TestHost {
        fn new(blocked_opens: usize, grant_gesture: bool) -> Self {
            Self {
                blocked_opens: AtomicUsize::new(blocked_opens),
                grant_gesture,
                last_url: Mutex::new(None),
                handle: Arc::new(TestHandle {
                    closed: AtomicBool::new(false),
                }),
            }
        }
    }

    #[async_trait]
    impl SurfaceHost for TestHost {
        async fn open(&self, url: &str) -> Result<Arc<dyn SurfaceHandle>, SurfaceError> {
            *self.last_url.lock().unwrap() = Some(url.to_string());
            if self
                .blocked_opens
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(SurfaceError::OpenBlocked);
            }
            Ok(self.handle.clone())
        }

        async fn request_user_gesture(&self) -> bool {
            self.grant_gesture
        }
    }

    fn outcome(id: Uuid, status: &str) -> serde_json::Value {
        serde_json::json!({ "id": id.to_string(), "status": status })
    }

    #[tokio::test]
    async fn test_success_outcome_resolves_operation() {
        let host = Arc::new(TestHost::new(0, true));
        let surface = Arc::new(SigningSurface::new(host.clone()));

        let runner = surface.clone();
        let task = tokio::spawn(async move {
            runner
                .execute(|id| format!("https://wallet.test/sign?id={id}"))
                .await
        });

        // Wait until the surface opened, then post the outcome back.
        let id = loop {
            if let Some(url) = host.last_url.lock().unwrap().clone() {
                let raw = url.rsplit_once("id=").unwrap().1.to_string();
                break raw.parse::<Uuid>().unwrap();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        };
        surface.deliver(outcome(id, "success"));

        let message = task.await.unwrap().unwrap();
        assert_eq!(message.status, Some(OutcomeStatus::Success));
        assert!(host.handle.is_closed());
    }

    #[tokio::test]
    async fn test_closed_surface_cancels_operation() {
        let host = Arc::new(TestHost::new(0, true));
        let surface = SigningSurface::new(host.clone());

        host.handle.closed.store(true, Ordering::SeqCst);
        let result = surface.execute(|id| format!("https://wallet.test/{id}")).await;
        assert!(matches!(result, Err(ConnectorError::Cancelled)));
    }

    #[tokio::test]
    async fn test_blocked_open_retries_after_gesture() {
        let host = Arc::new(TestHost::new(1, true));
        let surface = Arc::new(SigningSurface::new(host.clone()));

        let runner = surface.clone();
        let task = tokio::spawn(async move {
            runner.execute(|id| format!("https://wallet.test/{id}")).await
        });

        let id = loop {
            if let Some(url) = host.last_url.lock().unwrap().clone() {
                if host.blocked_opens.load(Ordering::SeqCst) == 0 {
                    break url.rsplit_once('/').unwrap().1.parse::<Uuid>().unwrap();
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        };
        surface.deliver(outcome(id, "success"));
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_declined_gesture_cancels() {
        let host = Arc::new(TestHost::new(1, false));
        let surface = SigningSurface::new(host);
        let result = surface.execute(|id| format!("https://wallet.test/{id}")).await;
        assert!(matches!(result, Err(ConnectorError::Cancelled)));
    }

    #[tokio::test]
    async fn test_failure_outcome_maps_to_rejection() {
        let host = Arc::new(TestHost::new(0, true));
        let surface = Arc::new(SigningSurface::new(host.clone()));

        let runner = surface.clone();
        let task = tokio::spawn(async move {
            runner.execute(|id| format!("https://wallet.test/{id}")).await
        });

        let id = loop {
            if let Some(url) = host.last_url.lock().unwrap().clone() {
                break url.rsplit_once('/').unwrap().1.parse::<Uuid>().unwrap();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        };
        surface.deliver(serde_json::json!({
            "id": id.to_string(),
            "status": "failure",
            "errorMessage": "User rejected the request",
        }));

        match task.await.unwrap() {
            Err(ConnectorError::Rejected(reason)) => {
                assert_eq!(reason, "User rejected the request");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_and_interim_messages_are_ignored() {
        let host = Arc::new(TestHost::new(0, true));
        let surface = Arc::new(SigningSurface::new(host.clone()));

        let runner = surface.clone();
        let task = tokio::spawn(async move {
            runner.execute(|id| format!("https://wallet.test/{id}")).await
        });

        let id = loop {
            if let Some(url) = host.last_url.lock().unwrap().clone() {
                break url.rsplit_once('/').unwrap().1.parse::<Uuid>().unwrap();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        };
        // Neither a request message nor a pending status resolves the waiter.
        surface.deliver(serde_json::json!({ "method": "handshake" }));
        surface.deliver(outcome(id, "pending"));
        surface.deliver(outcome(id, "success"));

        assert!(task.await.unwrap().is_ok());
    }
}
