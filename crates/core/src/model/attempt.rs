use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AttemptId, ExamId, OptionId, Question, QuestionId};

/// Lifecycle status of an attempt. The backend enforces that at most one
/// attempt is `InProgress` per user; the client trusts and reflects that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl AttemptStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptStatus::Completed)
    }
}

/// Persisted shape of one answer inside the cached attempt record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAnswer {
    pub selected_answer: Vec<OptionId>,
    pub time_spent_seconds: u32,
    pub submitted_to_backend: bool,
}

/// The single durable local record for an in-progress attempt.
///
/// One JSON-serializable snapshot per cache slot; it must survive reloads and
/// crashes, so it carries everything needed to rebuild the in-memory state
/// without a network fetch, plus `last_synced_at_epoch_ms` for correcting
/// time spent away from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAttempt {
    pub attempt_id: AttemptId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_id: Option<ExamId>,
    pub is_dynamic: bool,
    pub questions: Vec<Question>,
    pub current_question_index: usize,
    pub answers: HashMap<QuestionId, CachedAnswer>,
    pub time_remaining_seconds: u32,
    pub last_synced_at_epoch_ms: i64,
}

impl CachedAttempt {
    /// Remaining seconds after correcting for time spent away from the tab.
    ///
    /// The countdown keeps running while the client is closed, crashed, or
    /// backgrounded, so loading at `t0 + d` a snapshot persisted at `t0` with
    /// `T` seconds left yields `max(0, T - d)`. A snapshot from the future
    /// (clock skew) corrects nothing.
    #[must_use]
    pub fn corrected_remaining(&self, now: DateTime<Utc>) -> u32 {
        let elapsed_ms = now
            .timestamp_millis()
            .saturating_sub(self.last_synced_at_epoch_ms);
        let elapsed_secs = u32::try_from(elapsed_ms.max(0) / 1000).unwrap_or(u32::MAX);
        self.time_remaining_seconds.saturating_sub(elapsed_secs)
    }
}
