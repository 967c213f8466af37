//! The only component that talks to the backend.
//!
//! One operation per backend capability. Every operation is safe to retry
//! except `complete`, which the server itself treats as idempotent (repeated
//! calls return the same result without double-scoring).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use exam_core::model::{AttemptId, AttemptStatus, ExamId, OptionId, Question, QuestionId};

use crate::error::GatewayError;

mod http;
mod memory;

pub use http::{GatewayConfig, HttpSyncGateway};
pub use memory::InMemoryGateway;

/// What to start: a pre-built exam or a server-generated dynamic set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamSelector {
    Exam(ExamId),
    Dynamic(DynamicExamRequest),
}

/// Request body for a dynamic exam, generated server-side at start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicExamRequest {
    pub subject_ids: Vec<String>,
    pub question_count: u32,
}

/// Response of the start operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedAttempt {
    pub attempt_id: AttemptId,
    pub questions: Vec<Question>,
    pub time_remaining_seconds: u32,
}

/// One previously answered question, as reported by the resume endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub question_id: QuestionId,
    pub selected_answer: Vec<OptionId>,
    #[serde(default)]
    pub time_spent_seconds: u32,
}

/// Response of the resume operation: the full question set plus everything
/// needed to re-attach client state after a reload or cache loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumedAttempt {
    pub questions: Vec<Question>,
    pub time_remaining_seconds: u32,
    pub current_question_index: usize,
    #[serde(default)]
    pub answered_questions: Vec<AnsweredQuestion>,
}

/// Lightweight status of a known attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub status: AttemptStatus,
    pub time_remaining_seconds: u32,
}

/// Body of the answer submission endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    pub selected_answer: Vec<OptionId>,
    pub time_spent_seconds: u32,
    pub time_remaining_seconds: u32,
}

/// Pointer to a finished attempt whose results can be offered for viewing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedAttemptInfo {
    pub attempt_id: AttemptId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_percent: Option<f64>,
}

/// Response of the active-attempt probe, the entry point recovery uses
/// before deciding to start fresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveAttempt {
    pub has_active_attempt: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_id: Option<AttemptId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_attempt: Option<CompletedAttemptInfo>,
}

/// Graded results of a completed attempt. Scoring is entirely server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResults {
    pub attempt_id: AttemptId,
    pub total_questions: u32,
    pub correct_count: u32,
    pub score_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Backend contract consumed by the attempt session and recovery.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    /// Start a fresh attempt for the selected exam.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend rejects or the call fails.
    async fn start(&self, selector: &ExamSelector) -> Result<StartedAttempt, GatewayError>;

    /// Re-fetch the full state of a server-known in-progress attempt.
    ///
    /// Used when the local cache is absent but the server still reports an
    /// active attempt (different device, cleared storage).
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the attempt is unknown or the call fails.
    async fn resume(&self, attempt_id: &AttemptId) -> Result<ResumedAttempt, GatewayError>;

    /// Fetch the status and remaining time of an attempt.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the attempt is unknown or the call fails.
    async fn summary(&self, attempt_id: &AttemptId) -> Result<AttemptSummary, GatewayError>;

    /// Submit one answer. Fire-and-forget from the caller's perspective:
    /// the UI advances regardless of this call's outcome.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on failure; callers log and keep the local
    /// answer authoritative.
    async fn submit_answer(
        &self,
        attempt_id: &AttemptId,
        submission: &AnswerSubmission,
    ) -> Result<(), GatewayError>;

    /// Ask the backend whether this user already has an attempt in flight.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the call fails.
    async fn check_active_attempt(&self) -> Result<ActiveAttempt, GatewayError>;

    /// Complete the attempt and fetch graded results.
    ///
    /// Bulk grading may legitimately take up to two minutes; implementations
    /// must use an extended timeout for this call specifically, and callers
    /// must not treat slowness as failure.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on failure; the attempt stays in progress and
    /// the call can be retried.
    async fn complete(&self, attempt_id: &AttemptId) -> Result<ExamResults, GatewayError>;

    /// Fetch the results of a previously completed attempt.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the attempt is unknown or the call fails.
    async fn results(&self, attempt_id: &AttemptId) -> Result<ExamResults, GatewayError>;
}
