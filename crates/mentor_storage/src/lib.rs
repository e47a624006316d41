#![forbid(unsafe_code)]

pub mod session_store;

pub use session_store::{SessionStore, StorageError, DEFAULT_LOCK_WAIT, DEFAULT_SHARD_COUNT};
