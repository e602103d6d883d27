//! Transaction assembly from signing intents.
//!
//! # Responsibilities
//! - Resolve the chain context a transaction needs: a recent block hash and
//!   the signing key's next nonce
//! - Assign strictly increasing nonces across a batch, by position
//! - Produce placeholder transactions when no local key is known, leaving the
//!   nonce and key for the external signer to replace

use crate::actions::ConnectorAction;
use crate::error::{ConnectorError, ConnectorResult};
use crate::keys::LocalSigner;
use crate::rpc::RpcClient;
use crate::transaction::schema::{to_wire_actions, CryptoHash, PublicKey, Transaction};

/// What the caller wants signed: a receiver and an ordered action list on
/// behalf of one account.
#[derive(Debug, Clone)]
pub struct TransactionIntent {
    pub signer_id: String,
    pub receiver_id: String,
    pub actions: Vec<ConnectorAction>,
}

/// Assembles signable transactions against live chain state.
#[derive(Debug)]
pub struct TransactionAssembler<'a> {
    rpc: &'a RpcClient,
}

impl<'a> TransactionAssembler<'a> {
    pub fn new(rpc: &'a RpcClient) -> Self {
        Self { rpc }
    }

    /// Assemble one transaction for a known signing key.
    ///
    /// The nonce is the key's on-chain nonce plus one; the block hash comes
    /// from the latest final block.
    pub async fn assemble(
        &self,
        intent: &TransactionIntent,
        public_key: &PublicKey,
    ) -> ConnectorResult<Transaction> {
        let mut batch = self
            .assemble_batch(std::slice::from_ref(intent), public_key)
            .await?;
        batch
            .pop()
            .ok_or_else(|| ConnectorError::InvalidResponse("empty batch".into()))
    }

    /// Assemble a batch for a known signing key.
    ///
    /// Chain context is fetched once; the transaction at position `i` gets
    /// nonce `on_chain + 1 + i` so the batch lands in order.
    pub async fn assemble_batch(
        &self,
        intents: &[TransactionIntent],
        public_key: &PublicKey,
    ) -> ConnectorResult<Vec<Transaction>> {
        let key_text = public_key.to_string();
        let signer_id = intents
            .first()
            .map(|i| i.signer_id.clone())
            .ok_or_else(|| ConnectorError::InvalidResponse("empty batch".into()))?;

        let (block, access_key) = tokio::try_join!(
            self.rpc.block("final"),
            self.rpc.view_access_key(&signer_id, &key_text),
        )?;
        let block_hash = CryptoHash::from_base58(&block.header.hash)?;
        tracing::debug!(
            signer_id,
            public_key = %key_text,
            nonce = access_key.nonce,
            block_height = block.header.height,
            "Assembling transaction batch"
        );

        intents
            .iter()
            .enumerate()
            .map(|(i, intent)| {
                Ok(Transaction {
                    signer_id: intent.signer_id.clone(),
                    public_key: *public_key,
                    nonce: access_key.nonce + 1 + i as u64,
                    receiver_id: intent.receiver_id.clone(),
                    block_hash,
                    actions: to_wire_actions(&intent.actions)?,
                })
            })
            .collect()
    }

    /// Assemble a batch with no local key.
    ///
    /// The external signer replaces both the key and the nonce when it signs,
    /// so each transaction carries nonce zero and a throwaway key that merely
    /// satisfies the wire layout. Only the block hash is real.
    pub async fn assemble_batch_unkeyed(
        &self,
        intents: &[TransactionIntent],
    ) -> ConnectorResult<Vec<Transaction>> {
        let block = self.rpc.block("final").await?;
        let block_hash = CryptoHash::from_base58(&block.header.hash)?;
        let placeholder = LocalSigner::generate().public_key();

        intents
            .iter()
            .map(|intent| {
                Ok(Transaction {
                    signer_id: intent.signer_id.clone(),
                    public_key: placeholder,
                    nonce: 0,
                    receiver_id: intent.receiver_id.clone(),
                    block_hash,
                    actions: to_wire_actions(&intent.actions)?,
                })
            })
            .collect()
    }
}
