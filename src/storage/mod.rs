//! Local key-value persistence for client state
//!
//! Plays the role a browser's local storage plays for a web client: small
//! JSON blobs under fixed keys, written synchronously on the same turn as the
//! state change that produced them.

pub mod file;
pub mod memory;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::AppResult;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Fixed storage keys
pub mod keys {
    pub const CART: &str = "library_cart";
    pub const CATALOG_FILTERS: &str = "catalog_filters";
    pub const AUTH_TOKEN: &str = "auth_token";
}

/// Raw string storage. Implementations use `&self`; the client is single-threaded.
pub trait KeyValueStore {
    /// Returns `Ok(None)` when the key has never been written
    fn get(&self, key: &str) -> AppResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// Read and decode a JSON value. Missing, unreadable or corrupt entries yield `None`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Could not read '{}' from local storage: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Discarding corrupt '{}' entry in local storage: {}", key, e);
            None
        }
    }
}

/// Encode and write a JSON value
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> AppResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}
