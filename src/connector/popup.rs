//! External wallet backend over a popup signing surface.
//!
//! # Responsibilities
//! - Establish and tear down wallet sessions
//! - Route each signing request: locally with a scoped key when the policy
//!   allows, otherwise through the wallet's signing pages
//! - Correlate wallet redirects back to their originating operation
//!
//! # Design Decisions
//! - Local signing failures degrade to the external path with a warning; the
//!   user sees an extra prompt instead of an error
//! - Scoped keys are staged at sign-in URL build time and promoted only after
//!   the wallet confirms the session

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use url::Url;
use uuid::Uuid;

use crate::config::ConnectorConfig;
use crate::connector::{
    Account, SignInParams, SignMessageParams, SignedMessage, TransactionRequest, WalletConnector,
};
use crate::error::{ConnectorError, ConnectorResult};
use crate::keys::{CapabilityStore, FunctionCallCapability, LocalSigner};
use crate::rpc::RpcClient;
use crate::storage::KeyValueStorage;
use crate::transaction::{TransactionAssembler, TransactionIntent};
use crate::transport::{SigningSurface, SurfaceHost, WalletMessage};

/// Wallet connector backed by an external web wallet in a popup.
pub struct PopupWallet {
    config: ConnectorConfig,
    rpc: Arc<RpcClient>,
    surface: SigningSurface,
    store: CapabilityStore,
}

impl PopupWallet {
    pub fn new(
        config: ConnectorConfig,
        storage: Arc<dyn KeyValueStorage>,
        host: Arc<dyn SurfaceHost>,
    ) -> Self {
        let rpc = Arc::new(RpcClient::new(
            config.network.endpoints.clone(),
            &config.rpc,
        ));
        Self::with_rpc(config, storage, host, rpc)
    }

    /// Construct over an existing RPC client (shared pools, tests).
    pub fn with_rpc(
        config: ConnectorConfig,
        storage: Arc<dyn KeyValueStorage>,
        host: Arc<dyn SurfaceHost>,
        rpc: Arc<RpcClient>,
    ) -> Self {
        let store = CapabilityStore::new(storage, &config.network.network_id);
        Self {
            config,
            rpc,
            surface: SigningSurface::new(host),
            store,
        }
    }

    /// Feed one message posted by the wallet surface back into the
    /// correlation table.
    pub fn handle_wallet_message(&self, payload: serde_json::Value) {
        self.surface.deliver(payload);
    }

    fn require_account(&self) -> ConnectorResult<String> {
        self.store.account_id().ok_or(ConnectorError::NotSignedIn)
    }

    fn wallet_page(&self, path: &str) -> ConnectorResult<Url> {
        Url::parse(&self.config.network.wallet_url)
            .and_then(|base| base.join(path))
            .map_err(|e| ConnectorError::Surface(format!("bad wallet URL: {e}")))
    }

    fn callback_url(&self, id: Uuid) -> String {
        format!("{}?id={}", self.config.network.app_url, id)
    }

    /// Sign with the scoped key and submit directly over RPC.
    async fn sign_and_send_locally(
        &self,
        capability: &FunctionCallCapability,
        signer_id: &str,
        requests: &[TransactionRequest],
    ) -> ConnectorResult<Vec<serde_json::Value>> {
        let signer = LocalSigner::from_secret_text(&capability.secret_key)?;
        let intents: Vec<TransactionIntent> = requests
            .iter()
            .map(|r| TransactionIntent {
                signer_id: signer_id.to_string(),
                receiver_id: r.receiver_id.clone(),
                actions: r.actions.clone(),
            })
            .collect();

        let assembler = TransactionAssembler::new(&self.rpc);
        let batch = assembler
            .assemble_batch(&intents, &signer.public_key())
            .await?;

        // Submitted in order so positional nonces land in order.
        let mut outcomes = Vec::with_capacity(batch.len());
        for transaction in batch {
            let signed = signer.sign_transaction(transaction)?;
            outcomes.push(self.rpc.send_transaction(&signed.to_bytes()?).await?);
        }
        Ok(outcomes)
    }

    /// Send the batch through the wallet's sign page and resolve the
    /// resulting transaction hashes into execution outcomes.
    async fn sign_and_send_via_wallet(
        &self,
        signer_id: &str,
        requests: &[TransactionRequest],
    ) -> ConnectorResult<Vec<serde_json::Value>> {
        let intents: Vec<TransactionIntent> = requests
            .iter()
            .map(|r| TransactionIntent {
                signer_id: signer_id.to_string(),
                receiver_id: r.receiver_id.clone(),
                actions: r.actions.clone(),
            })
            .collect();

        let assembler = TransactionAssembler::new(&self.rpc);
        let batch = assembler.assemble_batch_unkeyed(&intents).await?;
        let encoded = batch
            .iter()
            .map(|tx| tx.to_bytes().map(|bytes| BASE64.encode(bytes)))
            .collect::<ConnectorResult<Vec<String>>>()?
            .join(",");

        let page = self.wallet_page("sign")?;
        let outcome = self
            .surface
            .execute(|id| {
                let mut url = page;
                url.query_pairs_mut()
                    .append_pair("transactions", &encoded)
                    .append_pair("callbackUrl", &self.callback_url(id));
                url.to_string()
            })
            .await?;

        let hashes = outcome
            .transaction_hashes
            .ok_or_else(|| ConnectorError::InvalidResponse("no transaction hashes".into()))?;
        let mut outcomes = Vec::new();
        for hash in hashes.split(',').filter(|h| !h.is_empty()) {
            // The node resolves the transaction by hash; the sender field only
            // routes the query and any value is accepted.
            outcomes.push(self.rpc.tx_status(hash, "unused", "NONE").await?);
        }
        Ok(outcomes)
    }

    fn session_from_outcome(&self, outcome: &WalletMessage) -> ConnectorResult<String> {
        outcome
            .account_id
            .clone()
            .ok_or_else(|| ConnectorError::InvalidResponse("sign-in outcome without account".into()))
    }
}

#[async_trait]
impl WalletConnector for PopupWallet {
    async fn sign_in(&self, params: &SignInParams) -> ConnectorResult<Vec<Account>> {
        // Stage a fresh scoped key before the surface opens; the wallet adds
        // it on-chain as part of the session grant.
        let staged_key = if params.contract_id.is_empty() {
            None
        } else {
            let signer = LocalSigner::generate();
            let public_key = signer.public_key().to_string();
            self.store.stage_pending(
                &public_key,
                &FunctionCallCapability {
                    secret_key: signer.secret_text(),
                    contract_id: params.contract_id.clone(),
                    methods: params.method_names.clone(),
                },
            );
            Some(public_key)
        };

        let page = self.wallet_page("login")?;
        let result = self
            .surface
            .execute(|id| {
                let mut url = page;
                {
                    let mut query = url.query_pairs_mut();
                    let callback = self.callback_url(id);
                    query
                        .append_pair("success_url", &callback)
                        .append_pair("failure_url", &callback);
                    if let Some(public_key) = &staged_key {
                        query
                            .append_pair("contract_id", &params.contract_id)
                            .append_pair("public_key", public_key);
                        if !params.method_names.is_empty() {
                            query.append_pair("methodNames", &params.method_names.join(","));
                        }
                    }
                }
                url.to_string()
            })
            .await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Some(public_key) = &staged_key {
                    self.store.remove_pending(public_key);
                }
                return Err(e);
            }
        };

        let account_id = self.session_from_outcome(&outcome)?;
        self.store.set_account_id(&account_id);
        if let Some(public_key) = &staged_key {
            self.store.confirm_pending(public_key)?;
        }
        tracing::info!(account_id, "Wallet session established");

        Ok(vec![Account {
            account_id,
            public_key: staged_key,
        }])
    }

    async fn sign_out(&self) -> ConnectorResult<()> {
        let account = self.store.account_id();
        self.store.sign_out();
        if let Some(account_id) = account {
            tracing::info!(account_id, "Wallet session cleared");
        }
        Ok(())
    }

    async fn get_accounts(&self) -> ConnectorResult<Vec<Account>> {
        Ok(self
            .store
            .account_id()
            .map(|account_id| Account {
                account_id,
                public_key: None,
            })
            .into_iter()
            .collect())
    }

    async fn sign_and_send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> ConnectorResult<serde_json::Value> {
        let mut outcomes = self
            .sign_and_send_transactions(std::slice::from_ref(request))
            .await?;
        outcomes
            .pop()
            .ok_or_else(|| ConnectorError::InvalidResponse("empty outcome batch".into()))
    }

    async fn sign_and_send_transactions(
        &self,
        requests: &[TransactionRequest],
    ) -> ConnectorResult<Vec<serde_json::Value>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        let signer_id = self.require_account()?;

        // The whole batch signs locally only when one scoped key covers every
        // transaction in it.
        let local_key = self
            .store
            .capability_for(&requests[0].receiver_id)
            .filter(|capability| {
                requests
                    .iter()
                    .all(|r| capability.can_sign(&r.receiver_id, &r.actions))
            });
        if let Some(capability) = local_key {
            match self
                .sign_and_send_locally(&capability, &signer_id, requests)
                .await
            {
                Ok(outcomes) => return Ok(outcomes),
                Err(e) => {
                    tracing::warn!(
                        contract_id = capability.contract_id,
                        error = %e,
                        "Local signing failed, falling back to wallet"
                    );
                }
            }
        }

        self.sign_and_send_via_wallet(&signer_id, requests).await
    }

    async fn sign_message(&self, params: &SignMessageParams) -> ConnectorResult<SignedMessage> {
        let page = self.wallet_page("sign-message")?;
        let outcome = self
            .surface
            .execute(|id| {
                let mut url = page;
                {
                    let mut query = url.query_pairs_mut();
                    query
                        .append_pair("message", &params.message)
                        .append_pair("recipient", &params.recipient)
                        .append_pair("nonce", &BASE64.encode(params.nonce))
                        .append_pair("callbackUrl", &self.callback_url(id));
                    if let Some(state) = &params.state {
                        query.append_pair("state", state);
                    }
                }
                url.to_string()
            })
            .await?;

        let signed = outcome
            .signed_request
            .ok_or_else(|| ConnectorError::InvalidResponse("no signed message payload".into()))?;
        serde_json::from_value(signed)
            .map_err(|e| ConnectorError::InvalidResponse(format!("bad signed message: {e}")))
    }

    async fn verify_owner(&self, _message: &str) -> ConnectorResult<SignedMessage> {
        // The wallet's pages have no owner-verification flow; NEP-413 message
        // signing covers the use case.
        Err(ConnectorError::Unsupported("verify_owner"))
    }

    async fn generate_function_call_key(
        &self,
        contract_id: &str,
        method_names: &[String],
    ) -> ConnectorResult<String> {
        let signer = LocalSigner::generate();
        let public_key = signer.public_key().to_string();
        self.store.stage_pending(
            &public_key,
            &FunctionCallCapability {
                secret_key: signer.secret_text(),
                contract_id: contract_id.to_string(),
                methods: method_names.to_vec(),
            },
        );
        tracing::debug!(contract_id, public_key, "Staged new function call key");
        Ok(public_key)
    }

    async fn confirm_function_call_key(&self, public_key: &str) -> ConnectorResult<()> {
        let capability = self.store.confirm_pending(public_key)?;
        tracing::info!(
            contract_id = capability.contract_id,
            public_key,
            "Function call key confirmed"
        );
        Ok(())
    }

    async fn remove_function_call_key(&self, contract_id: &str) -> ConnectorResult<()> {
        self.store.remove_capability(contract_id);
        Ok(())
    }
}

impl std::fmt::Debug for PopupWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopupWallet")
            .field("network_id", &self.config.network.network_id)
            .field("wallet_url", &self.config.network.wallet_url)
            .finish_non_exhaustive()
    }
}
