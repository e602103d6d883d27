//! Transaction construction: the binary wire schema and the assembler that
//! resolves chain context (nonce, block hash) for signing intents.

pub mod assembler;
pub mod schema;

pub use assembler::{TransactionAssembler, TransactionIntent};
pub use schema::{
    to_wire_action, to_wire_actions, Action, CryptoHash, PublicKey, Signature, SignedTransaction,
    Transaction,
};
