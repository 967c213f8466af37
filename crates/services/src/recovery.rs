use std::sync::Arc;

use tracing::{debug, warn};

use exam_core::Clock;
use exam_core::model::AttemptId;

use crate::cache::{AttemptCache, LoadedSnapshot};
use crate::error::RecoveryError;
use crate::gateway::{CompletedAttemptInfo, SyncGateway};

/// What to do with this mount, decided once before any attempt UI shows.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryDecision {
    /// A cached snapshot with time left: rebuild entirely locally, no
    /// network question fetch.
    ResumeFromCache(LoadedSnapshot),
    /// A cached snapshot whose corrected remaining time already reached
    /// zero: the attempt died while the client was away. Route directly to
    /// completion, never back into the attempt.
    CompleteExpired(LoadedSnapshot),
    /// No usable cache, but the server still reports an active attempt
    /// (different device, cleared storage). Requires a full `resume` fetch.
    ResumeFromServer {
        attempt_id: AttemptId,
        time_remaining_seconds: Option<u32>,
    },
    /// No active attempt, but a finished one whose results can be offered.
    /// User-selectable; never auto-entered, and never a reason to silently
    /// start a fresh attempt instead.
    PastResultsAvailable(CompletedAttemptInfo),
    /// Nothing to recover. Starting fresh is gated on quota by the caller.
    StartFresh,
}

/// Runs once per mount: decides between cache resume, server resume, past
/// results, and a fresh start.
pub struct RecoveryCoordinator {
    cache: AttemptCache,
    gateway: Arc<dyn SyncGateway>,
    clock: Clock,
}

impl RecoveryCoordinator {
    #[must_use]
    pub fn new(cache: AttemptCache, gateway: Arc<dyn SyncGateway>, clock: Clock) -> Self {
        Self {
            cache,
            gateway,
            clock,
        }
    }

    /// Decide how to enter the attempt screen.
    ///
    /// The local cache wins over the server when both know the attempt: the
    /// snapshot already holds the question set, so resuming from it skips
    /// the network fetch entirely. A failing cache read falls through to the
    /// server rather than blocking entry.
    ///
    /// # Errors
    ///
    /// Returns `RecoveryError` only if the active-attempt probe fails; cache
    /// trouble is logged and treated as a miss.
    pub async fn decide(&self) -> Result<RecoveryDecision, RecoveryError> {
        let cached = match self.cache.load(self.clock.now()).await {
            Ok(cached) => cached,
            Err(error) => {
                warn!(%error, "attempt cache unreadable, falling back to server recovery");
                None
            }
        };

        if let Some(loaded) = cached {
            if loaded.corrected_remaining_seconds == 0 {
                debug!(attempt_id = %loaded.snapshot.attempt_id, "cached attempt expired while away");
                return Ok(RecoveryDecision::CompleteExpired(loaded));
            }
            debug!(
                attempt_id = %loaded.snapshot.attempt_id,
                remaining = loaded.corrected_remaining_seconds,
                "resuming attempt from cache"
            );
            return Ok(RecoveryDecision::ResumeFromCache(loaded));
        }

        let active = self.gateway.check_active_attempt().await?;
        if active.has_active_attempt {
            if let Some(attempt_id) = active.attempt_id {
                debug!(%attempt_id, "resuming server-known attempt without local cache");
                return Ok(RecoveryDecision::ResumeFromServer {
                    attempt_id,
                    time_remaining_seconds: active.time_remaining_seconds,
                });
            }
            warn!("backend reported an active attempt without an id");
        }

        if let Some(info) = active.last_completed_attempt {
            return Ok(RecoveryDecision::PastResultsAvailable(info));
        }

        Ok(RecoveryDecision::StartFresh)
    }
}
