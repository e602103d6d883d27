//! Connector-level error taxonomy.

use thiserror::Error;

use crate::rpc::RpcError;

/// Errors surfaced to connector callers.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// RPC failure after the client exhausted its retry budget, or an
    /// immediate chain-level rejection.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The user closed the external signing surface before responding.
    #[error("user closed the window")]
    Cancelled,

    /// The signing surface could not be opened.
    #[error("signing surface error: {0}")]
    Surface(String),

    /// The external signer explicitly declined the request.
    #[error("signing rejected: {0}")]
    Rejected(String),

    /// The backend does not implement this operation by design.
    #[error("operation not supported by this wallet: {0}")]
    Unsupported(&'static str),

    /// Operation requires an authenticated session.
    #[error("wallet not signed in")]
    NotSignedIn,

    /// Stored session or key material could not be decoded.
    #[error("storage error: {0}")]
    Storage(String),

    /// Key material failed to parse or sign.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A request could not be encoded, or a response from the external
    /// surface did not carry the expected fields.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
