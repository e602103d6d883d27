//! Endpoint failover behavior through the public client API.

mod common;

use common::{ChainSim, ScriptedTransport, BLOCK_HASH};
use near_connector::config::RpcConfig;
use near_connector::rpc::{RpcClient, RpcError};

fn endpoints(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("http://node-{i}.test")).collect()
}

fn config() -> RpcConfig {
    RpcConfig {
        timeout_ms: 50,
        tries_per_endpoint: 2,
        adaptive_timeout: true,
    }
}

#[tokio::test]
async fn failing_endpoints_are_skipped_transparently() {
    let chain = Box::new(ChainSim::failing_first(5, 2));
    let client = RpcClient::with_transport(endpoints(3), &config(), chain);

    let block = client.block("final").await.unwrap();
    assert_eq!(block.header.hash, bs58::encode(BLOCK_HASH).into_string());
    // The caller saw one successful call; the pool moved past both bad nodes.
    assert_eq!(client.current_endpoint_index(), 2);
}

#[tokio::test]
async fn rotation_wraps_around_the_pool() {
    let chain = ChainSim::failing_first(7, 3);
    let client = RpcClient::with_transport(endpoints(2), &config(), Box::new(chain.clone()));

    let key = client
        .view_access_key("alice.near", "ed25519:key")
        .await
        .unwrap();
    assert_eq!(key.nonce, 7);
    // Three rotations across two endpoints wrap back to index 1.
    assert_eq!(client.current_endpoint_index(), 1);
    assert_eq!(chain.attempts(), 4);
    // The fourth attempt landed on the wrapped-around first endpoint.
    let hits = chain.endpoints_hit.lock().unwrap().clone();
    assert_eq!(hits[3], "http://node-1.test");
}

#[tokio::test]
async fn chain_rejections_bypass_the_retry_loop() {
    let transport = Box::new(ScriptedTransport::new(vec![Err(RpcError::Handler {
        error_type: "UNKNOWN_ACCESS_KEY".into(),
        message: "access key not found".into(),
    })]));
    let client = RpcClient::with_transport(endpoints(3), &config(), transport);

    let result = client.view_access_key("alice.near", "ed25519:key").await;
    match result {
        Err(RpcError::Handler { error_type, .. }) => {
            assert_eq!(error_type, "UNKNOWN_ACCESS_KEY");
        }
        other => panic!("expected handler error, got {other:?}"),
    }
    // A second call would panic on the exhausted script if the client had
    // retried; the pool also never rotated.
    assert_eq!(client.current_endpoint_index(), 0);
}

#[tokio::test]
async fn retry_budget_bounds_total_attempts() {
    // The client retries endpoints * tries_per_endpoint times after the
    // initial attempt; the failure after that surfaces. The trailing success
    // must never be reached.
    let mut script: Vec<_> = (0..5)
        .map(|_| {
            Err(RpcError::Network {
                status: 502,
                message: "bad gateway".into(),
            })
        })
        .collect();
    script.push(Ok(serde_json::json!({ "unreachable": true })));
    let client = RpcClient::with_transport(
        endpoints(2),
        &config(),
        Box::new(ScriptedTransport::new(script)),
    );

    let result: Result<serde_json::Value, _> =
        client.call("block", serde_json::json!({})).await;
    assert!(matches!(result, Err(RpcError::Network { status: 502, .. })));
}

#[tokio::test]
async fn timeout_failures_grow_the_window_until_recovery() {
    let script = vec![
        Err(RpcError::Timeout),
        Err(RpcError::Timeout),
        Ok(serde_json::json!(null)),
    ];
    let config = RpcConfig {
        timeout_ms: 1000,
        tries_per_endpoint: 3,
        adaptive_timeout: true,
    };
    let client = RpcClient::with_transport(
        endpoints(2),
        &config,
        Box::new(ScriptedTransport::new(script)),
    );

    let _: serde_json::Value = client.call("block", serde_json::json!({})).await.unwrap();
    // Two growths then one shrink leaves the window above the floor.
    assert!(client.current_timeout() > std::time::Duration::from_millis(1000));

    // Successes keep shrinking it, but never below the floor.
    let more: Vec<_> = (0..10).map(|_| Ok(serde_json::json!(null))).collect();
    let client = RpcClient::with_transport(
        endpoints(1),
        &config,
        Box::new(ScriptedTransport::new(more)),
    );
    for _ in 0..10 {
        let _: serde_json::Value = client.call("block", serde_json::json!({})).await.unwrap();
    }
    assert_eq!(
        client.current_timeout(),
        std::time::Duration::from_millis(1000)
    );
}

#[tokio::test]
async fn adaptive_growth_can_be_disabled() {
    let script = vec![Err(RpcError::Timeout), Ok(serde_json::json!(null))];
    let config = RpcConfig {
        timeout_ms: 1000,
        tries_per_endpoint: 2,
        adaptive_timeout: false,
    };
    let client = RpcClient::with_transport(
        endpoints(2),
        &config,
        Box::new(ScriptedTransport::new(script)),
    );
    let _: serde_json::Value = client.call("block", serde_json::json!({})).await.unwrap();
    assert_eq!(
        client.current_timeout(),
        std::time::Duration::from_millis(1000)
    );
}
