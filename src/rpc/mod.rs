//! Resilient RPC subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → client.rs (rotation, pacing, adaptive timeout, retry budget)
//!     → transport.rs (one POST to one endpoint, bounded by timeout)
//!     → types.rs (envelope decode, error classification)
//! ```
//!
//! # Design Decisions
//! - Transport failures rotate endpoints; chain rejections never do
//! - Pool state lives inside the client instance, no process singletons
//! - The single-attempt transport is a trait so tests can script endpoints

pub mod client;
pub mod transport;
pub mod types;

pub use client::RpcClient;
pub use transport::{HttpTransport, JsonRpcTransport};
pub use types::{AccessKeyView, BlockView, RpcError, RpcRequest, RpcResult};
