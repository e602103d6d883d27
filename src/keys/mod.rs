//! Key material: scoped capabilities, the local signing policy, and
//! durable capability storage.

pub mod capability;
pub mod signer;
pub mod store;

pub use capability::FunctionCallCapability;
pub use signer::LocalSigner;
pub use store::CapabilityStore;
