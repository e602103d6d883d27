//! Resilient JSON-RPC client with endpoint rotation and adaptive timeouts.
//!
//! # Responsibilities
//! - Send JSON-RPC requests to one of several candidate endpoints
//! - Rotate to the next endpoint on transport failures, with paced retries
//! - Adapt the per-request timeout: shrink after successes, grow after
//!   timeouts
//! - Propagate chain-level rejections immediately, untouched
//!
//! All pool state (current endpoint index, adaptive timeout) is scoped to the
//! client instance; independent clients never interfere.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::DeserializeOwned;

use crate::config::RpcConfig;
use crate::rpc::transport::{HttpTransport, JsonRpcTransport};
use crate::rpc::types::{
    AccessKeyView, BlockView, CallFunctionView, RpcError, RpcRequest, RpcResult,
};

/// Hard ceiling for the adaptive timeout.
const MAX_TIMEOUT: Duration = Duration::from_secs(60);
/// Pacing base: attempt `n` may not start earlier than `n * 500ms` after the
/// previous attempt began.
const RETRY_PACE: Duration = Duration::from_millis(500);
/// Adaptation factor for both growth and shrinkage.
const TIMEOUT_FACTOR: f64 = 1.2;

struct PoolState {
    current_index: usize,
    timeout: Duration,
}

/// Multi-endpoint JSON-RPC client.
pub struct RpcClient {
    transport: Box<dyn JsonRpcTransport>,
    endpoints: Vec<String>,
    pool: Mutex<PoolState>,
    /// Floor the timeout shrinks back toward after recovery.
    floor: Duration,
    adaptive: bool,
    tries_per_endpoint: u32,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client over the production HTTP transport.
    pub fn new(endpoints: Vec<String>, config: &RpcConfig) -> Self {
        Self::with_transport(endpoints, config, Box::new(HttpTransport::new()))
    }

    /// Create a client over a custom transport (used by tests).
    pub fn with_transport(
        endpoints: Vec<String>,
        config: &RpcConfig,
        transport: Box<dyn JsonRpcTransport>,
    ) -> Self {
        debug_assert!(!endpoints.is_empty(), "endpoint pool must not be empty");
        let timeout = Duration::from_millis(config.timeout_ms);
        tracing::debug!(
            endpoints = endpoints.len(),
            timeout_ms = config.timeout_ms,
            "RPC client initialized"
        );
        Self {
            transport,
            endpoints,
            pool: Mutex::new(PoolState {
                current_index: 0,
                timeout,
            }),
            floor: timeout,
            adaptive: config.adaptive_timeout,
            tries_per_endpoint: config.tries_per_endpoint,
            next_id: AtomicU64::new(123),
        }
    }

    /// Index of the endpoint the next request will hit.
    pub fn current_endpoint_index(&self) -> usize {
        self.pool.lock().expect("pool lock poisoned").current_index
    }

    /// Current adaptive timeout.
    pub fn current_timeout(&self) -> Duration {
        self.pool.lock().expect("pool lock poisoned").timeout
    }

    /// Send one JSON-RPC call, rotating endpoints on transport failures.
    ///
    /// Chain-level rejections (`RpcError::Handler`) propagate immediately and
    /// never count against the retry budget. Transport failures rotate to the
    /// next endpoint (wrapping) and retry with pacing, up to
    /// `endpoints.len() * tries_per_endpoint` total attempts.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> RpcResult<T> {
        let budget = self.endpoints.len() as u32 * self.tries_per_endpoint;
        let mut attempts: u32 = 0;

        loop {
            let (endpoint, timeout) = {
                let pool = self.pool.lock().expect("pool lock poisoned");
                (self.endpoints[pool.current_index].clone(), pool.timeout)
            };
            let request = RpcRequest {
                jsonrpc: "2.0",
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                method: method.to_string(),
                params: params.clone(),
            };

            let started = Instant::now();
            match self.transport.send(&endpoint, &request, timeout).await {
                Ok(value) => {
                    self.record_success();
                    return serde_json::from_value(value).map_err(|e| RpcError::Network {
                        status: 200,
                        message: format!("unexpected result shape: {e}"),
                    });
                }
                Err(error) => {
                    if matches!(error, RpcError::Timeout) {
                        self.record_timeout();
                    }
                    if !error.is_transport() {
                        return Err(error);
                    }

                    self.rotate();
                    if attempts + 1 > budget {
                        tracing::warn!(
                            method,
                            attempts = attempts + 1,
                            error = %error,
                            "RPC retry budget exhausted"
                        );
                        return Err(error);
                    }
                    tracing::warn!(
                        method,
                        endpoint = %endpoint,
                        error = %error,
                        "RPC transport failure, rotating endpoint"
                    );

                    let pace = RETRY_PACE * attempts;
                    let elapsed = started.elapsed();
                    if elapsed < pace {
                        tokio::time::sleep(pace - elapsed).await;
                    }
                    attempts += 1;
                }
            }
        }
    }

    fn record_success(&self) {
        let mut pool = self.pool.lock().expect("pool lock poisoned");
        let shrunk = pool.timeout.div_f64(TIMEOUT_FACTOR);
        pool.timeout = shrunk.max(self.floor);
    }

    fn record_timeout(&self) {
        if !self.adaptive {
            return;
        }
        let mut pool = self.pool.lock().expect("pool lock poisoned");
        let grown = pool.timeout.mul_f64(TIMEOUT_FACTOR);
        pool.timeout = grown.min(MAX_TIMEOUT);
    }

    fn rotate(&self) {
        let mut pool = self.pool.lock().expect("pool lock poisoned");
        pool.current_index = (pool.current_index + 1) % self.endpoints.len();
    }

    // ------------------------------------------------------------------
    // Typed helpers
    // ------------------------------------------------------------------

    /// Fetch a block by finality (`"final"` or `"optimistic"`).
    pub async fn block(&self, finality: &str) -> RpcResult<BlockView> {
        self.call("block", serde_json::json!({ "finality": finality }))
            .await
    }

    /// Current state of one access key, optimistic finality.
    pub async fn view_access_key(
        &self,
        account_id: &str,
        public_key: &str,
    ) -> RpcResult<AccessKeyView> {
        self.call(
            "query",
            serde_json::json!({
                "request_type": "view_access_key",
                "finality": "optimistic",
                "account_id": account_id,
                "public_key": public_key,
            }),
        )
        .await
    }

    /// Call a contract view method, decoding the returned bytes as JSON.
    pub async fn view_function<T: DeserializeOwned>(
        &self,
        contract_id: &str,
        method_name: &str,
        args: &serde_json::Value,
    ) -> RpcResult<T> {
        let args_base64 = BASE64.encode(serde_json::to_vec(args).map_err(|e| {
            RpcError::Handler {
                error_type: "InvalidArgs".to_string(),
                message: e.to_string(),
            }
        })?);
        let view: CallFunctionView = self
            .call(
                "query",
                serde_json::json!({
                    "request_type": "call_function",
                    "finality": "optimistic",
                    "account_id": contract_id,
                    "method_name": method_name,
                    "args_base64": args_base64,
                }),
            )
            .await?;
        serde_json::from_slice(&view.result).map_err(|e| RpcError::Handler {
            error_type: "InvalidResponse".to_string(),
            message: format!("view result is not valid JSON: {e}"),
        })
    }

    /// Submit a serialized signed transaction, waiting for optimistic
    /// execution.
    pub async fn send_transaction(&self, signed_tx: &[u8]) -> RpcResult<serde_json::Value> {
        self.call(
            "send_tx",
            serde_json::json!({
                "signed_tx_base64": BASE64.encode(signed_tx),
                "wait_until": "EXECUTED_OPTIMISTIC",
            }),
        )
        .await
    }

    /// Submit a serialized signed transaction and wait for finality.
    pub async fn broadcast_tx_commit(&self, signed_tx: &[u8]) -> RpcResult<serde_json::Value> {
        self.call(
            "broadcast_tx_commit",
            serde_json::json!([BASE64.encode(signed_tx)]),
        )
        .await
    }

    /// Poll the status of a previously submitted transaction.
    pub async fn tx_status(
        &self,
        tx_hash: &str,
        sender_account_id: &str,
        wait_until: &str,
    ) -> RpcResult<serde_json::Value> {
        self.call(
            "tx",
            serde_json::json!({
                "tx_hash": tx_hash,
                "sender_account_id": sender_account_id,
                "wait_until": wait_until,
            }),
        )
        .await
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pool = self.pool.lock().expect("pool lock poisoned");
        f.debug_struct("RpcClient")
            .field("endpoints", &self.endpoints)
            .field("current_index", &pool.current_index)
            .field("timeout", &pool.timeout)
            .finish()
    }
}
