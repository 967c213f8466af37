#![forbid(unsafe_code)]

pub mod kv;
pub mod sqlite;

pub use kv::{InMemoryKeyValueStore, KeyValueStore, StorageError};
pub use sqlite::{SqliteInitError, SqliteKeyValueStore};
