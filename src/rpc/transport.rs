//! Single-attempt JSON-RPC transport.
//!
//! The retry/failover loop in [`crate::rpc::client`] drives this trait; tests
//! substitute scripted implementations to exercise rotation behavior without
//! a network.

use std::time::Duration;

use async_trait::async_trait;

use crate::rpc::types::{RpcError, RpcRequest, RpcResponse, RpcResult};

/// One HTTP round trip to one endpoint with a bounded timeout.
#[async_trait]
pub trait JsonRpcTransport: Send + Sync {
    async fn send(
        &self,
        endpoint: &str,
        request: &RpcRequest,
        timeout: Duration,
    ) -> RpcResult<serde_json::Value>;
}

/// Production transport over reqwest.
#[derive(Debug, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JsonRpcTransport for HttpTransport {
    async fn send(
        &self,
        endpoint: &str,
        request: &RpcRequest,
        timeout: Duration,
    ) -> RpcResult<serde_json::Value> {
        let response = tokio::time::timeout(
            timeout,
            self.http.post(endpoint).json(request).send(),
        )
        .await
        .map_err(|_| RpcError::Timeout)?
        .map_err(|e| RpcError::Network {
            status: 0,
            message: format!("connection failed: {e}"),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RpcError::Network {
                status: status.as_u16(),
                message: body,
            });
        }

        let envelope: RpcResponse = tokio::time::timeout(timeout, response.json())
            .await
            .map_err(|_| RpcError::Timeout)?
            .map_err(|e| RpcError::Network {
                status: status.as_u16(),
                message: format!("malformed response body: {e}"),
            })?;

        if let Some(error) = envelope.error {
            return Err(error.classify());
        }

        envelope.result.ok_or_else(|| RpcError::Network {
            status: status.as_u16(),
            message: "response carried neither result nor error".to_string(),
        })
    }
}
