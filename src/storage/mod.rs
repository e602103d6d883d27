//! Durable key-value storage contract.
//!
//! # Responsibilities
//! - Define the minimal storage surface consumed by session and key persistence
//! - Provide an in-memory implementation for tests and headless use
//!
//! # Design Decisions
//! - The contract is deliberately tiny (`get`/`set`/`remove`); host
//!   environments map it onto whatever durable store they have
//!   (browser local storage, a file, a keychain)
//! - No schema migration support beyond the one-time legacy-key transform
//!   performed by the capability store

use dashmap::DashMap;

/// Minimal durable key-value storage.
///
/// Implementations must be safe to share across tasks; last writer wins.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value, `None` if absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, overwriting any previous one.
    fn set(&self, key: &str, value: &str);

    /// Remove a value if present.
    fn remove(&self, key: &str);
}

/// In-memory storage backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}
