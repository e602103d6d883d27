//! Resilient NEAR wallet connector.
//!
//! Connects an application to a NEAR account through an external web wallet,
//! while signing eligible transactions locally with scoped function-call keys
//! so routine contract calls never interrupt the user.
//!
//! # Subsystems
//! - [`rpc`]: multi-endpoint JSON-RPC client with rotation and adaptive
//!   timeouts
//! - [`keys`]: scoped capabilities, the signing decision policy, durable
//!   capability storage
//! - [`transaction`]: wire schema and assembly against live chain context
//! - [`transport`]: the out-of-process signing surface and outcome
//!   correlation
//! - [`connector`]: the wallet-facing operation set and the popup backend
//! - [`actions`]: the closed action vocabulary accepted from applications

pub mod actions;
pub mod config;
pub mod connector;
pub mod error;
pub mod keys;
pub mod observability;
pub mod rpc;
pub mod storage;
pub mod transaction;
pub mod transport;

pub use actions::ConnectorAction;
pub use config::ConnectorConfig;
pub use connector::{Account, PopupWallet, SignInParams, TransactionRequest, WalletConnector};
pub use error::{ConnectorError, ConnectorResult};
pub use rpc::RpcClient;
pub use storage::{KeyValueStorage, MemoryStorage};
