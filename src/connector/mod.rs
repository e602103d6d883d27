//! Wallet connector surface.
//!
//! # Data Flow
//! ```text
//! application
//!     → WalletConnector (backend-agnostic operations)
//!     → popup.rs (external wallet over a popup surface)
//!         → keys/ (local signing when a scoped key covers the request)
//!         → transport/ (everything else, through the wallet's pages)
//!         → rpc/ (chain context, submission, status polling)
//! ```

pub mod popup;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::actions::ConnectorAction;
use crate::error::ConnectorResult;

pub use popup::PopupWallet;

/// One account exposed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// Sign-in request. A non-empty `contract_id` asks the wallet to add a
/// function-call key scoped to that contract.
#[derive(Debug, Clone, Default)]
pub struct SignInParams {
    pub contract_id: String,
    pub method_names: Vec<String>,
}

/// One transaction to sign: a receiver plus an ordered action list. The
/// signer defaults to the session account.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub receiver_id: String,
    pub actions: Vec<ConnectorAction>,
}

/// Off-chain message signing request (NEP-413 shape).
#[derive(Debug, Clone)]
pub struct SignMessageParams {
    pub message: String,
    pub recipient: String,
    pub nonce: [u8; 32],
    pub state: Option<String>,
}

/// Outcome of an off-chain message signing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessage {
    pub account_id: String,
    pub public_key: String,
    /// Base64 signature over the serialized NEP-413 payload.
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Backend-agnostic wallet operations.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Establish a session, optionally requesting a scoped function-call key.
    async fn sign_in(&self, params: &SignInParams) -> ConnectorResult<Vec<Account>>;

    /// Tear down the session and every scoped key.
    async fn sign_out(&self) -> ConnectorResult<()>;

    /// Accounts of the current session.
    async fn get_accounts(&self) -> ConnectorResult<Vec<Account>>;

    /// Sign and submit one transaction, locally when a scoped key covers it.
    async fn sign_and_send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> ConnectorResult<serde_json::Value>;

    /// Sign and submit an ordered batch.
    async fn sign_and_send_transactions(
        &self,
        requests: &[TransactionRequest],
    ) -> ConnectorResult<Vec<serde_json::Value>>;

    /// Sign an off-chain message.
    async fn sign_message(&self, params: &SignMessageParams) -> ConnectorResult<SignedMessage>;

    /// Prove ownership of the signed-in account to a dapp. Backends without
    /// a dedicated flow return [`ConnectorError::Unsupported`].
    ///
    /// [`ConnectorError::Unsupported`]: crate::error::ConnectorError::Unsupported
    async fn verify_owner(&self, message: &str) -> ConnectorResult<SignedMessage>;

    /// Generate a scoped key and stage it until the chain confirms it.
    /// Returns the new key in text form for the caller's `AddKey` action.
    async fn generate_function_call_key(
        &self,
        contract_id: &str,
        method_names: &[String],
    ) -> ConnectorResult<String>;

    /// Promote a staged key once its `AddKey` transaction landed.
    async fn confirm_function_call_key(&self, public_key: &str) -> ConnectorResult<()>;

    /// Drop the scoped key for one contract.
    async fn remove_function_call_key(&self, contract_id: &str) -> ConnectorResult<()>;
}
