//! Wire messages posted back by the external signing surface.

use serde::Deserialize;
use uuid::Uuid;

/// Terminal or interim status reported by the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failure,
    Pending,
    #[serde(other)]
    Unknown,
}

/// One message from the signing surface.
///
/// Messages carrying a `method` field are requests from the surface itself
/// (handshakes, feature probes), not outcomes, and are ignored by the
/// dispatcher. Field names follow the wallet's JSON convention.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletMessage {
    /// Correlation id echoed from the request URL.
    pub id: Option<Uuid>,
    pub status: Option<OutcomeStatus>,
    pub method: Option<String>,
    /// Comma-separated transaction hashes for signed-and-sent batches.
    pub transaction_hashes: Option<String>,
    /// Signed message payload for off-chain message signing.
    pub signed_request: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub account_id: Option<String>,
    pub public_key: Option<String>,
    /// Anything else the wallet attached.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
