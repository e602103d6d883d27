//! Transaction action model shared by all wallet backends.
//!
//! # Responsibilities
//! - Define the closed set of action variants a connector can request
//! - Serialize to the `{"type": ..., "params": ...}` JSON shape the external
//!   signing surfaces consume
//!
//! # Design Decisions
//! - Actions are immutable once constructed; nothing mutates a variant after
//!   creation
//! - Amounts (`deposit`, `stake`, `allowance`) travel as decimal strings, the
//!   wire convention for 128-bit token values

use serde::{Deserialize, Serialize};

/// Permission attached to an access key added via [`ConnectorAction::AddKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddKeyPermission {
    /// Unrestricted key, identified by the literal string `"FullAccess"`.
    FullAccess(FullAccessMarker),
    /// Key restricted to calls on one contract.
    FunctionCall {
        #[serde(rename = "receiverId")]
        receiver_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        allowance: Option<String>,
        #[serde(rename = "methodNames", skip_serializing_if = "Option::is_none")]
        method_names: Option<Vec<String>>,
    },
}

/// Serde marker for the `"FullAccess"` string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FullAccessMarker {
    FullAccess,
}

impl AddKeyPermission {
    pub fn full_access() -> Self {
        AddKeyPermission::FullAccess(FullAccessMarker::FullAccess)
    }
}

/// Access key description carried by an `AddKey` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeySpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    pub permission: AddKeyPermission,
}

/// Reference to a contract published in the global registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GlobalContractIdentifier {
    AccountId {
        #[serde(rename = "accountId")]
        account_id: String,
    },
    /// Base58 encoded code hash.
    CodeHash {
        #[serde(rename = "codeHash")]
        code_hash: String,
    },
}

/// How a global contract deployment is identified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalDeployMode {
    CodeHash,
    AccountId,
}

/// One action inside a transaction request.
///
/// The set is closed: every backend understands exactly these variants, and
/// per-SDK translators map them onto whatever the third party expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum ConnectorAction {
    CreateAccount,
    DeployContract {
        code: Vec<u8>,
    },
    FunctionCall {
        #[serde(rename = "methodName")]
        method_name: String,
        args: serde_json::Value,
        gas: String,
        deposit: String,
    },
    Transfer {
        deposit: String,
    },
    Stake {
        stake: String,
        #[serde(rename = "publicKey")]
        public_key: String,
    },
    AddKey {
        #[serde(rename = "publicKey")]
        public_key: String,
        #[serde(rename = "accessKey")]
        access_key: AccessKeySpec,
    },
    DeleteKey {
        #[serde(rename = "publicKey")]
        public_key: String,
    },
    DeleteAccount {
        #[serde(rename = "beneficiaryId")]
        beneficiary_id: String,
    },
    UseGlobalContract {
        #[serde(rename = "contractIdentifier")]
        contract_identifier: GlobalContractIdentifier,
    },
    DeployGlobalContract {
        code: Vec<u8>,
        #[serde(rename = "deployMode")]
        deploy_mode: GlobalDeployMode,
    },
}

impl ConnectorAction {
    /// Convenience constructor for the most common action shape.
    pub fn function_call(
        method_name: impl Into<String>,
        args: serde_json::Value,
        gas: u64,
        deposit: u128,
    ) -> Self {
        ConnectorAction::FunctionCall {
            method_name: method_name.into(),
            args,
            gas: gas.to_string(),
            deposit: deposit.to_string(),
        }
    }

    pub fn transfer(deposit: u128) -> Self {
        ConnectorAction::Transfer {
            deposit: deposit.to_string(),
        }
    }

    /// Whether this is a function call with no attached deposit.
    ///
    /// A missing or `"0"` deposit counts as zero; anything else moves value.
    pub fn is_zero_deposit_call(&self) -> bool {
        match self {
            ConnectorAction::FunctionCall { deposit, .. } => {
                deposit.is_empty() || deposit == "0"
            }
            _ => false,
        }
    }

    /// Method name, for function calls only.
    pub fn method_name(&self) -> Option<&str> {
        match self {
            ConnectorAction::FunctionCall { method_name, .. } => Some(method_name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_call_wire_shape() {
        let action = ConnectorAction::function_call(
            "set_greeting",
            serde_json::json!({ "greeting": "hello" }),
            30_000_000_000_000,
            0,
        );
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "FunctionCall");
        assert_eq!(json["params"]["methodName"], "set_greeting");
        assert_eq!(json["params"]["deposit"], "0");
    }

    #[test]
    fn test_create_account_has_no_params() {
        let json = serde_json::to_value(ConnectorAction::CreateAccount).unwrap();
        assert_eq!(json["type"], "CreateAccount");
    }

    #[test]
    fn test_add_key_permission_roundtrip() {
        let action = ConnectorAction::AddKey {
            public_key: "ed25519:6E8sCci9badyRkXb3JoRpBj5p8C6Tw41ELDZoiihKEtp".into(),
            access_key: AccessKeySpec {
                nonce: None,
                permission: AddKeyPermission::FunctionCall {
                    receiver_id: "app.near".into(),
                    allowance: Some("250000000000000000000000".into()),
                    method_names: Some(vec!["set".into()]),
                },
            },
        };
        let json = serde_json::to_string(&action).unwrap();
        let decoded: ConnectorAction = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, action);
    }

    #[test]
    fn test_full_access_serializes_as_string() {
        let spec = AccessKeySpec {
            nonce: None,
            permission: AddKeyPermission::full_access(),
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["permission"], "FullAccess");
    }

    #[test]
    fn test_zero_deposit_detection() {
        assert!(ConnectorAction::function_call("get", serde_json::json!({}), 1, 0)
            .is_zero_deposit_call());
        assert!(!ConnectorAction::function_call("buy", serde_json::json!({}), 1, 1)
            .is_zero_deposit_call());
        assert!(!ConnectorAction::transfer(5).is_zero_deposit_call());
    }
}
