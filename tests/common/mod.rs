//! Shared test doubles: a scripted chain endpoint and a recording popup host.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;
use uuid::Uuid;

use near_connector::rpc::{JsonRpcTransport, RpcError, RpcRequest, RpcResult};
use near_connector::transport::{SurfaceError, SurfaceHandle, SurfaceHost};

pub const BLOCK_HASH: [u8; 32] = [42; 32];

/// Simulated chain node: serves context queries, records submissions, and
/// optionally fails the first N attempts at transport level.
///
/// Clones share state, so a test can keep one while the client owns another.
#[derive(Clone)]
pub struct ChainSim {
    pub key_nonce: u64,
    failures_remaining: Arc<AtomicUsize>,
    pub submissions: Arc<Mutex<Vec<String>>>,
    pub endpoints_hit: Arc<Mutex<Vec<String>>>,
}

impl ChainSim {
    pub fn new(key_nonce: u64) -> Self {
        Self::failing_first(key_nonce, 0)
    }

    pub fn failing_first(key_nonce: u64, failures: usize) -> Self {
        Self {
            key_nonce,
            failures_remaining: Arc::new(AtomicUsize::new(failures)),
            submissions: Arc::new(Mutex::new(Vec::new())),
            endpoints_hit: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn attempts(&self) -> usize {
        self.endpoints_hit.lock().unwrap().len()
    }
}

#[async_trait]
impl JsonRpcTransport for ChainSim {
    async fn send(
        &self,
        endpoint: &str,
        request: &RpcRequest,
        _timeout: Duration,
    ) -> RpcResult<serde_json::Value> {
        self.endpoints_hit.lock().unwrap().push(endpoint.to_string());
        if self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(RpcError::Network {
                status: 503,
                message: "unavailable".into(),
            });
        }
        match request.method.as_str() {
            "block" => Ok(serde_json::json!({
                "header": { "height": 100, "hash": bs58::encode(BLOCK_HASH).into_string() }
            })),
            "query" => Ok(serde_json::json!({ "nonce": self.key_nonce })),
            "send_tx" => {
                let encoded = request.params["signed_tx_base64"].as_str().unwrap();
                self.submissions.lock().unwrap().push(encoded.to_string());
                Ok(serde_json::json!({ "status": "executed" }))
            }
            "tx" => Ok(serde_json::json!({
                "resolved": request.params["tx_hash"].as_str().unwrap(),
            })),
            other => panic!("unexpected RPC method {other}"),
        }
    }
}

/// Transport that replays a fixed script of responses.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<RpcResult<serde_json::Value>>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<RpcResult<serde_json::Value>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl JsonRpcTransport for ScriptedTransport {
    async fn send(
        &self,
        _endpoint: &str,
        _request: &RpcRequest,
        _timeout: Duration,
    ) -> RpcResult<serde_json::Value> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted")
    }
}

pub struct PopupHandle {
    pub closed: AtomicBool,
}

impl SurfaceHandle for PopupHandle {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Popup host that records opened URLs for the test to answer.
pub struct PopupHost {
    pub opens: AtomicUsize,
    last_url: Mutex<Option<String>>,
    pub handle: Arc<PopupHandle>,
    /// When set, every opened surface reports closed immediately.
    pub close_on_open: bool,
}

impl PopupHost {
    pub fn new() -> Self {
        Self {
            opens: AtomicUsize::new(0),
            last_url: Mutex::new(None),
            handle: Arc::new(PopupHandle {
                closed: AtomicBool::new(false),
            }),
            close_on_open: false,
        }
    }

    pub fn closing() -> Self {
        Self {
            close_on_open: true,
            ..Self::new()
        }
    }

    /// Wait for the next opened URL, consuming it so sequential operations
    /// in one test never observe a stale surface.
    pub async fn opened_url(&self) -> Url {
        loop {
            if let Some(url) = self.last_url.lock().unwrap().take() {
                return Url::parse(&url).unwrap();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl SurfaceHost for PopupHost {
    async fn open(&self, url: &str) -> Result<Arc<dyn SurfaceHandle>, SurfaceError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(url.to_string());
        if self.close_on_open {
            self.handle.closed.store(true, Ordering::SeqCst);
        }
        Ok(self.handle.clone())
    }

    async fn request_user_gesture(&self) -> bool {
        true
    }
}

/// Pull the correlation id out of a wallet page URL's callback parameter.
pub fn correlation_id(url: &Url) -> Uuid {
    let callback = url
        .query_pairs()
        .find(|(k, _)| k == "callbackUrl" || k == "success_url")
        .map(|(_, v)| v.into_owned())
        .expect("no callback parameter");
    let callback = Url::parse(&callback).unwrap();
    callback
        .query_pairs()
        .find(|(k, _)| k == "id")
        .map(|(_, v)| v.parse().unwrap())
        .expect("no correlation id")
}
