//! Application state persisted in a secure key-value store.

pub mod app;
pub mod store;

pub use app::{keys, AppState};
#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;
pub use store::{move_keys, FileKeyStore, KeyValueStore, MemoryKeyStore, SplitStore};
