//! Function-call capability and the local signing decision policy.

use serde::{Deserialize, Serialize};

use crate::actions::ConnectorAction;

/// A locally held signing capability scoped to one contract.
///
/// An empty `methods` list permits any method on the contract. The key can
/// never move value: eligibility requires a zero deposit regardless of the
/// allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallCapability {
    #[serde(rename = "privateKey")]
    pub secret_key: String,
    #[serde(rename = "contractId", default)]
    pub contract_id: String,
    #[serde(default)]
    pub methods: Vec<String>,
}

impl FunctionCallCapability {
    /// Decide whether this capability covers the requested transaction.
    ///
    /// Local signing is permitted only for a single zero-deposit function
    /// call addressed to the scoped contract, with the method either on the
    /// allow-list or the list empty. Everything else goes through the
    /// external signer.
    pub fn can_sign(&self, receiver_id: &str, actions: &[ConnectorAction]) -> bool {
        if self.contract_id != receiver_id {
            return false;
        }
        let [action] = actions else {
            return false;
        };
        if !action.is_zero_deposit_call() {
            return false;
        }
        match action.method_name() {
            Some(method) => {
                self.methods.is_empty() || self.methods.iter().any(|m| m == method)
            }
            None => false,
        }
    }
}
