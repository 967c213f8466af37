use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use exam_core::model::{
    Answer, AttemptId, AttemptStatus, CachedAttempt, ExamId, OptionId, Question, QuestionId,
};
use exam_core::{Clock, TimerController, TimerTick};

use crate::attempt_store::{AttemptProgress, AttemptStateStore, SubmittedAnswer};
use crate::cache::{AttemptCache, LoadedSnapshot};
use crate::error::SessionError;
use crate::gateway::{AnswerSubmission, ExamResults, ExamSelector, SyncGateway};

struct SessionInner {
    store: AttemptStateStore,
    timer: TimerController,
}

/// The cohesive owner of one attempt: state store, countdown, cache, and
/// gateway behind a narrow command/query surface for the presentation layer.
///
/// All mutations are short synchronous critical sections on one lock;
/// network work happens outside it. Submissions are detached tasks that
/// outlive the view, so tearing the UI down never cancels an in-flight
/// answer.
#[derive(Clone)]
pub struct AttemptSession {
    inner: Arc<Mutex<SessionInner>>,
    gateway: Arc<dyn SyncGateway>,
    cache: AttemptCache,
    clock: Clock,
}

impl AttemptSession {
    /// Start a brand-new attempt for the selected exam.
    ///
    /// The first snapshot is persisted immediately so a reload before the
    /// first persistence tick can still recover.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the backend rejects the start or delivers
    /// an empty question set.
    pub async fn start_fresh(
        gateway: Arc<dyn SyncGateway>,
        cache: AttemptCache,
        clock: Clock,
        selector: ExamSelector,
    ) -> Result<Self, SessionError> {
        let started = gateway.start(&selector).await?;
        let (exam_id, is_dynamic): (Option<ExamId>, bool) = match &selector {
            ExamSelector::Exam(exam_id) => (Some(exam_id.clone()), false),
            ExamSelector::Dynamic(_) => (None, true),
        };
        let store = AttemptStateStore::from_start(
            started.attempt_id,
            exam_id,
            is_dynamic,
            started.questions,
            started.time_remaining_seconds,
            clock.now(),
        )?;
        let session = Self::assemble(store, started.time_remaining_seconds, gateway, cache, clock);
        session.persist_or_warn().await;
        Ok(session)
    }

    /// Rebuild the session from a cached snapshot, skipping the network
    /// question fetch entirely.
    ///
    /// The caller (recovery) must have routed a corrected remaining time of
    /// zero to [`AttemptSession::complete_expired`] instead.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the cached question set is empty.
    pub fn resume_from_cache(
        gateway: Arc<dyn SyncGateway>,
        cache: AttemptCache,
        clock: Clock,
        loaded: LoadedSnapshot,
    ) -> Result<Self, SessionError> {
        let remaining = loaded.corrected_remaining_seconds;
        let store =
            AttemptStateStore::from_snapshot(loaded.snapshot, remaining, clock.now())?;
        Ok(Self::assemble(store, remaining, gateway, cache, clock))
    }

    /// Re-attach to a server-known attempt with no local cache, fetching the
    /// full question set via the resume endpoint.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the fetch fails or the payload is empty.
    pub async fn resume_from_server(
        gateway: Arc<dyn SyncGateway>,
        cache: AttemptCache,
        clock: Clock,
        attempt_id: AttemptId,
    ) -> Result<Self, SessionError> {
        let resumed = gateway.resume(&attempt_id).await?;
        let remaining = resumed.time_remaining_seconds;
        let store = AttemptStateStore::from_resume(attempt_id, resumed, clock.now())?;
        let session = Self::assemble(store, remaining, gateway, cache, clock);
        session.persist_or_warn().await;
        Ok(session)
    }

    /// Complete an attempt that expired while the client was away, without
    /// rebuilding any session state around it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the completion call fails; the cached
    /// snapshot is kept so the call can be retried.
    pub async fn complete_expired(
        gateway: &dyn SyncGateway,
        cache: &AttemptCache,
        snapshot: &CachedAttempt,
    ) -> Result<ExamResults, SessionError> {
        let results = gateway.complete(&snapshot.attempt_id).await?;
        if let Err(error) = cache.clear().await {
            warn!(%error, "failed to clear cache after completing expired attempt");
        }
        Ok(results)
    }

    /// Fetch the graded results of a previously completed attempt, offered
    /// by recovery as past results. Viewing never starts a new attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the attempt is unknown or the call fails.
    pub async fn view_results(
        gateway: &dyn SyncGateway,
        attempt_id: &AttemptId,
    ) -> Result<ExamResults, SessionError> {
        Ok(gateway.results(attempt_id).await?)
    }

    fn assemble(
        store: AttemptStateStore,
        initial_seconds: u32,
        gateway: Arc<dyn SyncGateway>,
        cache: AttemptCache,
        clock: Clock,
    ) -> Self {
        let mut timer = TimerController::new();
        timer.start(initial_seconds);
        Self {
            inner: Arc::new(Mutex::new(SessionInner { store, timer })),
            gateway,
            cache,
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionInner>, SessionError> {
        self.inner.lock().map_err(|_| SessionError::Poisoned)
    }

    // ─── Commands ──────────────────────────────────────────────────────────

    /// Select or toggle an option on the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for completed attempts or foreign options.
    pub fn select_option(
        &self,
        question_id: &QuestionId,
        option_id: OptionId,
    ) -> Result<(), SessionError> {
        let mut guard = self.lock()?;
        guard.store.select_option(question_id, option_id)?;
        Ok(())
    }

    /// Submit the current selection and advance.
    ///
    /// The backend submission is fire-and-forget: the UI advances
    /// immediately, a failure is logged, and the answer stays pending until
    /// a later successful write overwrites it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for an empty selection (no network call is
    /// made) or a completed attempt.
    pub fn submit_current(&self) -> Result<(), SessionError> {
        let now = self.clock.now();
        let (attempt_id, submitted, remaining) = {
            let mut guard = self.lock()?;
            let remaining = guard.store.time_remaining_seconds();
            let submitted = guard.store.submit_current(now)?;
            (guard.store.attempt_id().clone(), submitted, remaining)
        };
        self.spawn_submission(attempt_id, submitted, remaining);
        Ok(())
    }

    /// Record an explicit skip and advance. Shares the submission path, so
    /// the backend learns about skips the same fire-and-forget way.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for a completed attempt.
    pub fn skip_current(&self) -> Result<(), SessionError> {
        let now = self.clock.now();
        let (attempt_id, submitted, remaining) = {
            let mut guard = self.lock()?;
            let remaining = guard.store.time_remaining_seconds();
            let submitted = guard.store.skip_current(now)?;
            (guard.store.attempt_id().clone(), submitted, remaining)
        };
        self.spawn_submission(attempt_id, submitted, remaining);
        Ok(())
    }

    /// Jump to a question. Never submits or modifies answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for an invalid index or completed attempt.
    pub fn go_to(&self, index: usize) -> Result<(), SessionError> {
        let mut guard = self.lock()?;
        guard.store.go_to(index, self.clock.now())?;
        Ok(())
    }

    /// Move forward one question; no-op on the last.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for a completed attempt.
    pub fn go_next(&self) -> Result<(), SessionError> {
        let mut guard = self.lock()?;
        guard.store.go_next(self.clock.now())?;
        Ok(())
    }

    /// Move back one question; no-op on the first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for a completed attempt.
    pub fn go_previous(&self) -> Result<(), SessionError> {
        let mut guard = self.lock()?;
        guard.store.go_previous(self.clock.now())?;
        Ok(())
    }

    /// Hold the countdown while the start/resume confirmation screen is up.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` only if the state lock is poisoned.
    pub fn pause_timer(&self) -> Result<(), SessionError> {
        self.lock()?.timer.pause();
        Ok(())
    }

    /// Let the countdown run again after the confirmation screen.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` only if the state lock is poisoned.
    pub fn resume_timer(&self) -> Result<(), SessionError> {
        self.lock()?.timer.resume();
        Ok(())
    }

    /// Advance the countdown by one second. Driven by the ticker runtime.
    ///
    /// On expiry the store freezes first (exactly once), then completion
    /// runs as a detached task; a failure there is retryable via
    /// [`AttemptSession::complete`], because the server treats completion as
    /// idempotent.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` only if the state lock is poisoned.
    pub fn tick(&self) -> Result<(), SessionError> {
        let expired = {
            let mut guard = self.lock()?;
            match guard.timer.tick() {
                TimerTick::Running(remaining) => {
                    guard.store.set_time_remaining(remaining);
                    false
                }
                TimerTick::Expired => {
                    guard.store.set_time_remaining(0);
                    guard.store.force_complete();
                    true
                }
                TimerTick::Inactive => false,
            }
        };

        if expired {
            debug!("attempt time expired; completing in the background");
            let session = self.clone();
            tokio::spawn(async move {
                if let Err(error) = session.finish_on_server().await {
                    warn!(%error, "completion after expiry failed; retry via complete()");
                }
            });
        }
        Ok(())
    }

    /// Explicitly complete the attempt and fetch graded results.
    ///
    /// Still-pending answers are drained first so nothing recorded locally
    /// is lost to an earlier swallowed submission failure. If the
    /// completion call fails the attempt stays in progress and the error is
    /// surfaced as retryable.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the completion call fails.
    pub async fn complete(&self) -> Result<ExamResults, SessionError> {
        let (attempt_id, pending, remaining) = {
            let guard = self.lock()?;
            (
                guard.store.attempt_id().clone(),
                guard.store.pending_answers(),
                guard.store.time_remaining_seconds(),
            )
        };

        for submitted in pending {
            let submission = Self::submission_body(&submitted, remaining);
            match self.gateway.submit_answer(&attempt_id, &submission).await {
                Ok(()) => {
                    if let Ok(mut guard) = self.inner.lock() {
                        guard
                            .store
                            .mark_acknowledged(&submitted.question_id, submitted.revision);
                    }
                }
                Err(error) => {
                    warn!(question_id = %submitted.question_id, %error, "pending answer drain failed");
                }
            }
        }

        let results = self.gateway.complete(&attempt_id).await?;
        {
            let mut guard = self.lock()?;
            guard.store.force_complete();
            guard.timer.stop();
        }
        if let Err(error) = self.cache.clear().await {
            warn!(%error, "failed to clear cache after completion");
        }
        Ok(results)
    }

    /// Persist the current snapshot. Driven by the persistence tick; a
    /// no-op once the attempt is no longer in progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the snapshot cannot be written.
    pub async fn persist(&self) -> Result<(), SessionError> {
        let snapshot = {
            let guard = self.lock()?;
            if guard.store.status() == AttemptStatus::InProgress {
                Some(guard.store.snapshot(self.clock.now()))
            } else {
                None
            }
        };
        if let Some(snapshot) = snapshot {
            self.cache.save(&snapshot).await?;
        }
        Ok(())
    }

    // ─── Queries ───────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `SessionError` only if the state lock is poisoned.
    pub fn attempt_id(&self) -> Result<AttemptId, SessionError> {
        Ok(self.lock()?.store.attempt_id().clone())
    }

    /// # Errors
    ///
    /// Returns `SessionError` only if the state lock is poisoned.
    pub fn status(&self) -> Result<AttemptStatus, SessionError> {
        Ok(self.lock()?.store.status())
    }

    /// # Errors
    ///
    /// Returns `SessionError` only if the state lock is poisoned.
    pub fn current_question(&self) -> Result<Question, SessionError> {
        Ok(self.lock()?.store.current_question().clone())
    }

    /// # Errors
    ///
    /// Returns `SessionError` only if the state lock is poisoned.
    pub fn current_index(&self) -> Result<usize, SessionError> {
        Ok(self.lock()?.store.current_index())
    }

    /// # Errors
    ///
    /// Returns `SessionError` only if the state lock is poisoned.
    pub fn current_selection(&self) -> Result<Vec<OptionId>, SessionError> {
        Ok(self.lock()?.store.current_selection().to_vec())
    }

    /// # Errors
    ///
    /// Returns `SessionError` only if the state lock is poisoned.
    pub fn answer(&self, question_id: &QuestionId) -> Result<Option<Answer>, SessionError> {
        Ok(self.lock()?.store.answer(question_id).cloned())
    }

    /// # Errors
    ///
    /// Returns `SessionError` only if the state lock is poisoned.
    pub fn progress(&self) -> Result<AttemptProgress, SessionError> {
        Ok(self.lock()?.store.progress())
    }

    /// # Errors
    ///
    /// Returns `SessionError` only if the state lock is poisoned.
    pub fn time_remaining_seconds(&self) -> Result<u32, SessionError> {
        Ok(self.lock()?.store.time_remaining_seconds())
    }

    // ─── Internals ─────────────────────────────────────────────────────────

    fn submission_body(submitted: &SubmittedAnswer, remaining: u32) -> AnswerSubmission {
        AnswerSubmission {
            question_id: submitted.question_id.clone(),
            selected_answer: submitted.selected_answer.clone(),
            time_spent_seconds: submitted.time_spent_seconds,
            time_remaining_seconds: remaining,
        }
    }

    fn spawn_submission(&self, attempt_id: AttemptId, submitted: SubmittedAnswer, remaining: u32) {
        let gateway = Arc::clone(&self.gateway);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let submission = Self::submission_body(&submitted, remaining);
            match gateway.submit_answer(&attempt_id, &submission).await {
                Ok(()) => {
                    // A stale acknowledgement is dropped by the revision
                    // check; the last local write wins either way.
                    if let Ok(mut guard) = inner.lock() {
                        guard
                            .store
                            .mark_acknowledged(&submitted.question_id, submitted.revision);
                    }
                }
                Err(error) => {
                    warn!(
                        question_id = %submitted.question_id,
                        %error,
                        "answer submission failed; keeping local answer pending"
                    );
                }
            }
        });
    }

    async fn finish_on_server(&self) -> Result<ExamResults, SessionError> {
        let attempt_id = self.lock()?.store.attempt_id().clone();
        let results = self.gateway.complete(&attempt_id).await?;
        self.lock()?.timer.stop();
        if let Err(error) = self.cache.clear().await {
            warn!(%error, "failed to clear cache after expiry completion");
        }
        Ok(results)
    }

    async fn persist_or_warn(&self) {
        if let Err(error) = self.persist().await {
            warn!(%error, "initial attempt snapshot could not be persisted");
        }
    }
}
