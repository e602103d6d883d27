//! Local ed25519 transaction signing.
//!
//! # Security
//! - Secret keys are parsed from storage text and held only in memory
//! - Keys are never logged; `Debug` shows the public half only

use ed25519_dalek::{Signer as _, SigningKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::ConnectorError;
use crate::transaction::schema::{PublicKey, Signature, SignedTransaction, Transaction};

/// Text prefix for ed25519 key material.
const ED25519_PREFIX: &str = "ed25519:";

/// In-memory ed25519 signer.
pub struct LocalSigner {
    signing_key: SigningKey,
}

impl LocalSigner {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Parse from the text form `ed25519:<base58>`.
    ///
    /// Accepts both the 64-byte form (seed followed by public key) and a bare
    /// 32-byte seed.
    pub fn from_secret_text(text: &str) -> Result<Self, ConnectorError> {
        let data = text
            .strip_prefix(ED25519_PREFIX)
            .ok_or_else(|| ConnectorError::InvalidKey("missing ed25519 prefix".into()))?;
        let bytes = bs58::decode(data)
            .into_vec()
            .map_err(|e| ConnectorError::InvalidKey(format!("bad base58 secret: {e}")))?;
        if bytes.len() != 32 && bytes.len() != 64 {
            return Err(ConnectorError::InvalidKey(format!(
                "secret key must be 32 or 64 bytes, got {}",
                bytes.len()
            )));
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[..32]);
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Text form suitable for durable storage.
    pub fn secret_text(&self) -> String {
        let mut bytes = Vec::with_capacity(64);
        bytes.extend_from_slice(&self.signing_key.to_bytes());
        bytes.extend_from_slice(self.signing_key.verifying_key().as_bytes());
        format!("{ED25519_PREFIX}{}", bs58::encode(bytes).into_string())
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::Ed25519(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign sha256 of the borsh-encoded transaction.
    pub fn sign_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<SignedTransaction, ConnectorError> {
        let payload = transaction.to_bytes()?;
        let digest = Sha256::digest(&payload);
        let signature = self.signing_key.sign(&digest);
        Ok(SignedTransaction {
            transaction,
            signature: Signature::Ed25519(signature.to_bytes()),
        })
    }

    /// Sign arbitrary bytes (used for message signing payloads).
    pub fn sign_bytes(&self, message: &[u8]) -> Signature {
        Signature::Ed25519(self.signing_key.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("public_key", &self.public_key().to_string())
            .finish()
    }
}
