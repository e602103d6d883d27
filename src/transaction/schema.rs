//! Binary transaction wire schema.
//!
//! The chain consumes a fixed borsh layout for `Transaction` and
//! `SignedTransaction`. This module treats that layout as an opaque external
//! contract: it populates the semantic fields (signer, receiver, key, nonce,
//! block hash, actions, signature) and round-trips the bytes; nothing here
//! validates chain rules. Variant order is part of the contract and must not
//! be rearranged.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::actions::{
    AddKeyPermission, ConnectorAction, GlobalContractIdentifier, GlobalDeployMode,
};
use crate::error::ConnectorError;

/// 32-byte hash, displayed base58.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CryptoHash(pub [u8; 32]);

impl CryptoHash {
    pub fn from_base58(text: &str) -> Result<Self, ConnectorError> {
        let bytes = bs58::decode(text)
            .into_vec()
            .map_err(|e| ConnectorError::InvalidResponse(format!("bad base58 hash: {e}")))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ConnectorError::InvalidResponse("hash must be 32 bytes".into()))?;
        Ok(CryptoHash(arr))
    }
}

impl std::fmt::Display for CryptoHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", bs58::encode(&self.0).into_string())
    }
}

/// Signing key identifier. Only ed25519 keys are produced by this connector;
/// the discriminant byte is part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum PublicKey {
    Ed25519([u8; 32]),
}

impl PublicKey {
    pub fn from_text(text: &str) -> Result<Self, ConnectorError> {
        let data = text.strip_prefix("ed25519:").ok_or_else(|| {
            ConnectorError::InvalidKey(format!("unsupported key type: {text}"))
        })?;
        let bytes = bs58::decode(data)
            .into_vec()
            .map_err(|e| ConnectorError::InvalidKey(format!("bad base58 key: {e}")))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ConnectorError::InvalidKey("public key must be 32 bytes".into()))?;
        Ok(PublicKey::Ed25519(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        match self {
            PublicKey::Ed25519(bytes) => bytes,
        }
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublicKey::Ed25519(bytes) => {
                write!(f, "ed25519:{}", bs58::encode(bytes).into_string())
            }
        }
    }
}

/// Transaction signature.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Signature {
    Ed25519([u8; 64]),
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signature::Ed25519(bytes) => {
                write!(f, "ed25519:{}", bs58::encode(bytes.as_slice()).into_string())
            }
        }
    }
}

/// Function-call permission payload for [`AccessKeyPermission::FunctionCall`].
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct FunctionCallPermission {
    pub allowance: Option<u128>,
    pub receiver_id: String,
    pub method_names: Vec<String>,
}

/// Access key permission. `FunctionCall` must stay at discriminant 0.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum AccessKeyPermission {
    FunctionCall(FunctionCallPermission),
    FullAccess,
}

/// Access key added to an account.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct AccessKey {
    pub nonce: u64,
    pub permission: AccessKeyPermission,
}

/// Global contract deploy mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum WireGlobalDeployMode {
    CodeHash,
    AccountId,
}

/// Global contract reference.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum WireGlobalContractIdentifier {
    CodeHash(CryptoHash),
    AccountId(String),
}

/// One wire-level action. Variant order is the chain's discriminant order.
#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize)]
pub enum Action {
    CreateAccount,
    DeployContract {
        code: Vec<u8>,
    },
    FunctionCall {
        method_name: String,
        args: Vec<u8>,
        gas: u64,
        deposit: u128,
    },
    Transfer {
        deposit: u128,
    },
    Stake {
        stake: u128,
        public_key: PublicKey,
    },
    AddKey {
        public_key: PublicKey,
        access_key: AccessKey,
    },
    DeleteKey {
        public_key: PublicKey,
    },
    DeleteAccount {
        beneficiary_id: String,
    },
    /// Meta-transaction slot; never produced by this connector but the
    /// discriminant must be occupied to keep later variants aligned.
    Delegate,
    DeployGlobalContract {
        code: Vec<u8>,
        deploy_mode: WireGlobalDeployMode,
    },
    UseGlobalContract {
        contract_identifier: WireGlobalContractIdentifier,
    },
}

/// Unsigned transaction payload.
#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct Transaction {
    pub signer_id: String,
    pub public_key: PublicKey,
    pub nonce: u64,
    pub receiver_id: String,
    pub block_hash: CryptoHash,
    pub actions: Vec<Action>,
}

impl Transaction {
    /// Borsh-encode for signing or transport.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConnectorError> {
        borsh::to_vec(self)
            .map_err(|e| ConnectorError::InvalidResponse(format!("borsh encode failed: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConnectorError> {
        borsh::from_slice(bytes)
            .map_err(|e| ConnectorError::InvalidResponse(format!("borsh decode failed: {e}")))
    }
}

/// Signed transaction payload.
#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signature: Signature,
}

impl SignedTransaction {
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConnectorError> {
        borsh::to_vec(self)
            .map_err(|e| ConnectorError::InvalidResponse(format!("borsh encode failed: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConnectorError> {
        borsh::from_slice(bytes)
            .map_err(|e| ConnectorError::InvalidResponse(format!("borsh decode failed: {e}")))
    }
}

fn parse_amount(text: &str, what: &str) -> Result<u128, ConnectorError> {
    if text.is_empty() {
        return Ok(0);
    }
    text.parse()
        .map_err(|_| ConnectorError::InvalidResponse(format!("invalid {what}: {text:?}")))
}

fn parse_gas(text: &str) -> Result<u64, ConnectorError> {
    if text.is_empty() {
        return Ok(0);
    }
    text.parse()
        .map_err(|_| ConnectorError::InvalidResponse(format!("invalid gas: {text:?}")))
}

/// Lower one connector action to its wire form.
pub fn to_wire_action(action: &ConnectorAction) -> Result<Action, ConnectorError> {
    Ok(match action {
        ConnectorAction::CreateAccount => Action::CreateAccount,
        ConnectorAction::DeployContract { code } => Action::DeployContract { code: code.clone() },
        ConnectorAction::FunctionCall {
            method_name,
            args,
            gas,
            deposit,
        } => Action::FunctionCall {
            method_name: method_name.clone(),
            args: serde_json::to_vec(args)
                .map_err(|e| ConnectorError::InvalidResponse(format!("invalid args: {e}")))?,
            gas: parse_gas(gas)?,
            deposit: parse_amount(deposit, "deposit")?,
        },
        ConnectorAction::Transfer { deposit } => Action::Transfer {
            deposit: parse_amount(deposit, "deposit")?,
        },
        ConnectorAction::Stake { stake, public_key } => Action::Stake {
            stake: parse_amount(stake, "stake")?,
            public_key: PublicKey::from_text(public_key)?,
        },
        ConnectorAction::AddKey {
            public_key,
            access_key,
        } => Action::AddKey {
            public_key: PublicKey::from_text(public_key)?,
            access_key: AccessKey {
                nonce: access_key.nonce.unwrap_or(0),
                permission: match &access_key.permission {
                    AddKeyPermission::FullAccess(_) => AccessKeyPermission::FullAccess,
                    AddKeyPermission::FunctionCall {
                        receiver_id,
                        allowance,
                        method_names,
                    } => AccessKeyPermission::FunctionCall(FunctionCallPermission {
                        allowance: allowance
                            .as_deref()
                            .map(|a| parse_amount(a, "allowance"))
                            .transpose()?,
                        receiver_id: receiver_id.clone(),
                        method_names: method_names.clone().unwrap_or_default(),
                    }),
                },
            },
        },
        ConnectorAction::DeleteKey { public_key } => Action::DeleteKey {
            public_key: PublicKey::from_text(public_key)?,
        },
        ConnectorAction::DeleteAccount { beneficiary_id } => Action::DeleteAccount {
            beneficiary_id: beneficiary_id.clone(),
        },
        ConnectorAction::UseGlobalContract {
            contract_identifier,
        } => Action::UseGlobalContract {
            contract_identifier: match contract_identifier {
                GlobalContractIdentifier::AccountId { account_id } => {
                    WireGlobalContractIdentifier::AccountId(account_id.clone())
                }
                GlobalContractIdentifier::CodeHash { code_hash } => {
                    WireGlobalContractIdentifier::CodeHash(CryptoHash::from_base58(code_hash)?)
                }
            },
        },
        ConnectorAction::DeployGlobalContract { code, deploy_mode } => {
            Action::DeployGlobalContract {
                code: code.clone(),
                deploy_mode: match deploy_mode {
                    GlobalDeployMode::CodeHash => WireGlobalDeployMode::CodeHash,
                    GlobalDeployMode::AccountId => WireGlobalDeployMode::AccountId,
                },
            }
        }
    })
}

/// Lower a full action list, preserving order.
pub fn to_wire_actions(actions: &[ConnectorAction]) -> Result<Vec<Action>, ConnectorError> {
    actions.iter().map(to_wire_action).collect()
}
