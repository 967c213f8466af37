use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use exam_core::model::CachedAttempt;
use storage::kv::KeyValueStore;

use crate::error::CacheError;

/// Slot key for the full timed exam attempt.
pub const FULL_EXAM_SLOT: &str = "attempt.exam";
/// Slot key for the daily lesson attempt, kept separate so the two attempt
/// types never collide on one record.
pub const DAILY_LESSON_SLOT: &str = "attempt.daily";

/// A snapshot loaded from the cache, with its staleness-corrected remaining
/// time already computed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSnapshot {
    pub snapshot: CachedAttempt,
    pub corrected_remaining_seconds: u32,
}

/// Durable slot for the active attempt's snapshot.
///
/// Writes happen on the 10-second persistence tick, never per keystroke, to
/// bound write volume. The store and slot key are injected; the cache never
/// hard-codes where it lives.
#[derive(Clone)]
pub struct AttemptCache {
    store: Arc<dyn KeyValueStore>,
    slot_key: String,
}

impl AttemptCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, slot_key: impl Into<String>) -> Self {
        Self {
            store,
            slot_key: slot_key.into(),
        }
    }

    #[must_use]
    pub fn slot_key(&self) -> &str {
        &self.slot_key
    }

    /// Persist the snapshot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if serialization or the store write fails.
    pub async fn save(&self, snapshot: &CachedAttempt) -> Result<(), CacheError> {
        let raw = serde_json::to_string(snapshot)?;
        self.store.put(&self.slot_key, &raw).await?;
        Ok(())
    }

    /// Load the cached snapshot, correcting for time spent away.
    ///
    /// A corrupt record is a cache miss, never an error: it is logged and
    /// the caller falls through to server-driven recovery. A corrected
    /// remaining time of zero means the attempt died while the client was
    /// away; the caller must route that to completion, not to resume.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` only if the store itself cannot be read.
    pub async fn load(&self, now: DateTime<Utc>) -> Result<Option<LoadedSnapshot>, CacheError> {
        let Some(raw) = self.store.get(&self.slot_key).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<CachedAttempt>(&raw) {
            Ok(snapshot) => {
                let corrected_remaining_seconds = snapshot.corrected_remaining(now);
                Ok(Some(LoadedSnapshot {
                    snapshot,
                    corrected_remaining_seconds,
                }))
            }
            Err(error) => {
                warn!(slot = %self.slot_key, %error, "discarding unreadable attempt snapshot");
                Ok(None)
            }
        }
    }

    /// Drop the cached snapshot. Clearing an empty slot is fine.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the store cannot be written.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.store.remove(&self.slot_key).await?;
        Ok(())
    }
}
