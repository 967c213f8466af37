use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use exam_core::model::{AttemptId, AttemptStatus, Question};

use crate::error::GatewayError;

use super::{
    ActiveAttempt, AnswerSubmission, AttemptSummary, CompletedAttemptInfo, ExamResults,
    ExamSelector, ResumedAttempt, StartedAttempt, SyncGateway,
};

struct GatewayState {
    questions: Vec<Question>,
    duration_seconds: u32,
    next_attempt: u64,
    active: Option<(AttemptId, u32)>,
    last_completed: Option<CompletedAttemptInfo>,
    resumed: Option<ResumedAttempt>,
    submissions: Vec<(AttemptId, AnswerSubmission)>,
    completed: HashMap<AttemptId, ExamResults>,
    complete_calls: u32,
    fail_submits: bool,
    fail_completes: bool,
}

/// Simple in-memory gateway implementation for testing and prototyping.
///
/// Scripted responses, recorded submissions, idempotent completion.
#[derive(Clone)]
pub struct InMemoryGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new(questions: Vec<Question>, duration_seconds: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(GatewayState {
                questions,
                duration_seconds,
                next_attempt: 1,
                active: None,
                last_completed: None,
                resumed: None,
                submissions: Vec::new(),
                completed: HashMap::new(),
                complete_calls: 0,
                fail_submits: false,
                fail_completes: false,
            })),
        }
    }

    /// Script a server-known active attempt for `check_active_attempt`.
    #[must_use]
    pub fn with_active_attempt(self, attempt_id: AttemptId, time_remaining_seconds: u32) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.active = Some((attempt_id, time_remaining_seconds));
        }
        self
    }

    /// Script a previously completed attempt for `check_active_attempt`.
    #[must_use]
    pub fn with_last_completed(self, info: CompletedAttemptInfo) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.last_completed = Some(info.clone());
            state.completed.insert(
                info.attempt_id.clone(),
                ExamResults {
                    attempt_id: info.attempt_id,
                    total_questions: 0,
                    correct_count: 0,
                    score_percent: info.score_percent.unwrap_or(0.0),
                    completed_at: info.completed_at,
                },
            );
        }
        self
    }

    /// Script the payload the resume endpoint returns.
    #[must_use]
    pub fn with_resumed(self, resumed: ResumedAttempt) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.resumed = Some(resumed);
        }
        self
    }

    /// Make every `submit_answer` fail until flipped back. Lets tests
    /// exercise the swallowed-failure path and the drain on completion.
    pub fn set_fail_submits(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_submits = fail;
        }
    }

    /// Make every `complete` fail until flipped back, for retry tests.
    pub fn set_fail_completes(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_completes = fail;
        }
    }

    /// All submissions recorded so far.
    #[must_use]
    pub fn submissions(&self) -> Vec<(AttemptId, AnswerSubmission)> {
        self.state
            .lock()
            .map(|state| state.submissions.clone())
            .unwrap_or_default()
    }

    /// How many times `complete` has been called.
    #[must_use]
    pub fn complete_calls(&self) -> u32 {
        self.state
            .lock()
            .map(|state| state.complete_calls)
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, GatewayState>, GatewayError> {
        self.state
            .lock()
            .map_err(|e| GatewayError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl SyncGateway for InMemoryGateway {
    async fn start(&self, _selector: &ExamSelector) -> Result<StartedAttempt, GatewayError> {
        let mut state = self.lock()?;
        let attempt_id = AttemptId::new(format!("attempt-{}", state.next_attempt));
        state.next_attempt += 1;
        state.active = Some((attempt_id.clone(), state.duration_seconds));
        Ok(StartedAttempt {
            attempt_id,
            questions: state.questions.clone(),
            time_remaining_seconds: state.duration_seconds,
        })
    }

    async fn resume(&self, attempt_id: &AttemptId) -> Result<ResumedAttempt, GatewayError> {
        let state = self.lock()?;
        if let Some(resumed) = &state.resumed {
            return Ok(resumed.clone());
        }
        match &state.active {
            Some((id, remaining)) if id == attempt_id => Ok(ResumedAttempt {
                questions: state.questions.clone(),
                time_remaining_seconds: *remaining,
                current_question_index: 0,
                answered_questions: Vec::new(),
            }),
            _ => Err(GatewayError::UnknownAttempt(attempt_id.to_string())),
        }
    }

    async fn summary(&self, attempt_id: &AttemptId) -> Result<AttemptSummary, GatewayError> {
        let state = self.lock()?;
        if state.completed.contains_key(attempt_id) {
            return Ok(AttemptSummary {
                status: AttemptStatus::Completed,
                time_remaining_seconds: 0,
            });
        }
        match &state.active {
            Some((id, remaining)) if id == attempt_id => Ok(AttemptSummary {
                status: AttemptStatus::InProgress,
                time_remaining_seconds: *remaining,
            }),
            _ => Err(GatewayError::UnknownAttempt(attempt_id.to_string())),
        }
    }

    async fn submit_answer(
        &self,
        attempt_id: &AttemptId,
        submission: &AnswerSubmission,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        if state.fail_submits {
            return Err(GatewayError::Unavailable("scripted submit failure".into()));
        }
        state
            .submissions
            .push((attempt_id.clone(), submission.clone()));
        Ok(())
    }

    async fn check_active_attempt(&self) -> Result<ActiveAttempt, GatewayError> {
        let state = self.lock()?;
        match &state.active {
            Some((id, remaining)) => Ok(ActiveAttempt {
                has_active_attempt: true,
                attempt_id: Some(id.clone()),
                time_remaining_seconds: Some(*remaining),
                last_completed_attempt: state.last_completed.clone(),
            }),
            None => Ok(ActiveAttempt {
                has_active_attempt: false,
                attempt_id: None,
                time_remaining_seconds: None,
                last_completed_attempt: state.last_completed.clone(),
            }),
        }
    }

    async fn complete(&self, attempt_id: &AttemptId) -> Result<ExamResults, GatewayError> {
        let mut state = self.lock()?;
        state.complete_calls += 1;
        if state.fail_completes {
            return Err(GatewayError::Unavailable(
                "scripted completion failure".into(),
            ));
        }
        // Idempotent: a repeat call returns the same result, no re-scoring.
        if let Some(results) = state.completed.get(attempt_id) {
            return Ok(results.clone());
        }
        let total = u32::try_from(state.questions.len()).unwrap_or(u32::MAX);
        let results = ExamResults {
            attempt_id: attempt_id.clone(),
            total_questions: total,
            correct_count: 0,
            score_percent: 0.0,
            completed_at: None,
        };
        state.completed.insert(attempt_id.clone(), results.clone());
        if matches!(&state.active, Some((id, _)) if id == attempt_id) {
            state.active = None;
        }
        Ok(results)
    }

    async fn results(&self, attempt_id: &AttemptId) -> Result<ExamResults, GatewayError> {
        let state = self.lock()?;
        state
            .completed
            .get(attempt_id)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownAttempt(attempt_id.to_string()))
    }
}
