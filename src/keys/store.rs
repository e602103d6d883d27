//! Capability and session persistence.
//!
//! # Responsibilities
//! - Persist the signed-in account id and per-contract function-call keys
//! - Stage tentatively issued keys until the wallet confirms them on-chain
//! - Sweep every scoped key on sign-out
//! - One-time transform of the legacy storage layout
//!
//! # Design Decisions
//! - Slots are namespaced per network, so one storage can back several
//!   connectors without capability leakage between networks
//! - The storage contract has no key enumeration; an index slot tracks which
//!   contracts hold keys so sign-out can clear them through `get`/`set`/
//!   `remove` alone
//! - Exactly one capability per contract: a newer key overwrites the older

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::ConnectorError;
use crate::keys::capability::FunctionCallCapability;
use crate::storage::KeyValueStorage;

const ACCOUNT_SLOT: &str = "signedAccountId";
const CAPABILITY_PREFIX: &str = "functionCallKey";
const PENDING_PREFIX: &str = "pendingFunctionCallKey";
const INDEX_SLOT: &str = "functionCallKey:index";

// Legacy (pre-namespace) slots, read once and removed.
const LEGACY_AUTH_SLOT: &str = "near_app_wallet_auth_key";
const LEGACY_CONTRACT_SLOT: &str = "near-wallet-selector:contract";

/// Per-network capability store over the durable key-value contract.
pub struct CapabilityStore {
    storage: Arc<dyn KeyValueStorage>,
    network_id: String,
}

impl CapabilityStore {
    /// Open a store, applying the one-time legacy transform if the old
    /// layout is present.
    pub fn new(storage: Arc<dyn KeyValueStorage>, network_id: &str) -> Self {
        let store = Self {
            storage,
            network_id: network_id.to_string(),
        };
        store.migrate_legacy();
        store
    }

    fn slot(&self, key: &str) -> String {
        format!("{}:{}", self.network_id, key)
    }

    /// Currently signed-in account, if any.
    pub fn account_id(&self) -> Option<String> {
        self.storage.get(&self.slot(ACCOUNT_SLOT))
    }

    pub fn set_account_id(&self, account_id: &str) {
        self.storage.set(&self.slot(ACCOUNT_SLOT), account_id);
    }

    /// Active capability for one contract, if cached.
    pub fn capability_for(&self, contract_id: &str) -> Option<FunctionCallCapability> {
        let raw = self
            .storage
            .get(&self.slot(&format!("{CAPABILITY_PREFIX}:{contract_id}")))?;
        match serde_json::from_str::<FunctionCallCapability>(&raw) {
            Ok(mut capability) => {
                // The contract id is implied by the slot, not stored in it.
                capability.contract_id = contract_id.to_string();
                Some(capability)
            }
            Err(e) => {
                tracing::warn!(contract_id, error = %e, "Discarding undecodable stored key");
                None
            }
        }
    }

    /// Persist a capability under its contract slot, overwriting any older
    /// key for the same contract.
    pub fn store_capability(&self, capability: &FunctionCallCapability) {
        let slot = self.slot(&format!("{CAPABILITY_PREFIX}:{}", capability.contract_id));
        if let Ok(json) = serde_json::to_string(capability) {
            self.storage.set(&slot, &json);
            self.index_add(&capability.contract_id);
        }
    }

    /// Stage a freshly generated key until the wallet confirms it.
    pub fn stage_pending(&self, public_key: &str, capability: &FunctionCallCapability) {
        let slot = self.slot(&format!("{PENDING_PREFIX}:{public_key}"));
        if let Ok(json) = serde_json::to_string(capability) {
            self.storage.set(&slot, &json);
        }
    }

    /// Promote a staged key to its per-contract slot.
    pub fn confirm_pending(&self, public_key: &str) -> Result<FunctionCallCapability, ConnectorError> {
        let slot = self.slot(&format!("{PENDING_PREFIX}:{public_key}"));
        let raw = self.storage.get(&slot).ok_or_else(|| {
            ConnectorError::Storage(format!(
                "no pending function call key for public key {public_key}"
            ))
        })?;
        let capability: FunctionCallCapability = serde_json::from_str(&raw)
            .map_err(|e| ConnectorError::Storage(format!("undecodable pending key: {e}")))?;
        self.store_capability(&capability);
        self.storage.remove(&slot);
        Ok(capability)
    }

    /// Discard a staged key that will not be confirmed.
    pub fn remove_pending(&self, public_key: &str) {
        self.storage
            .remove(&self.slot(&format!("{PENDING_PREFIX}:{public_key}")));
    }

    /// Remove the active capability for one contract.
    pub fn remove_capability(&self, contract_id: &str) {
        self.storage
            .remove(&self.slot(&format!("{CAPABILITY_PREFIX}:{contract_id}")));
        let mut index = self.index();
        if index.remove(contract_id) {
            if let Ok(json) = serde_json::to_string(&index) {
                self.storage.set(&self.slot(INDEX_SLOT), &json);
            }
        }
    }

    /// Clear the session and every scoped key for this network.
    pub fn sign_out(&self) {
        self.storage.remove(&self.slot(ACCOUNT_SLOT));
        for contract_id in self.index() {
            self.storage
                .remove(&self.slot(&format!("{CAPABILITY_PREFIX}:{contract_id}")));
        }
        self.storage.remove(&self.slot(INDEX_SLOT));
    }

    fn index(&self) -> BTreeSet<String> {
        self.storage
            .get(&self.slot(INDEX_SLOT))
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn index_add(&self, contract_id: &str) {
        let mut index = self.index();
        if index.insert(contract_id.to_string()) {
            if let Ok(json) = serde_json::to_string(&index) {
                self.storage.set(&self.slot(INDEX_SLOT), &json);
            }
        }
    }

    /// One-time transform of the legacy layout: the old auth record becomes
    /// the account slot, and the legacy keystore entry (scoped by the old
    /// selector contract record) becomes a per-contract key.
    fn migrate_legacy(&self) {
        let Some(raw_auth) = self.storage.get(LEGACY_AUTH_SLOT) else {
            return;
        };
        let account_id = serde_json::from_str::<serde_json::Value>(&raw_auth)
            .ok()
            .and_then(|v| v.get("accountId").and_then(|a| a.as_str().map(String::from)));
        let Some(account_id) = account_id else {
            self.storage.remove(LEGACY_AUTH_SLOT);
            return;
        };

        self.set_account_id(&account_id);
        self.storage.remove(LEGACY_AUTH_SLOT);
        tracing::info!(account_id, "Migrated legacy wallet session");

        let keystore_slot = format!("near-api-js:keystore:{account_id}:{}", self.network_id);
        if let Some(secret_key) = self.storage.get(&keystore_slot) {
            let contract_record = self
                .storage
                .get(LEGACY_CONTRACT_SLOT)
                .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
                .unwrap_or_default();
            let contract_id = contract_record
                .get("contractId")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let methods = contract_record
                .get("methodNames")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();

            if !contract_id.is_empty() {
                self.store_capability(&FunctionCallCapability {
                    secret_key,
                    contract_id,
                    methods,
                });
            }
            self.storage.remove(&keystore_slot);
        }
    }
}
