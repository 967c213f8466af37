use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use exam_core::model::{
    Answer, AttemptId, AttemptStatus, CachedAnswer, CachedAttempt, ExamId, OptionId, Question,
    QuestionId, SelectionMode, SyncState,
};

use crate::error::AttemptError;
use crate::gateway::ResumedAttempt;

//
// ─── ATTEMPT STATE ─────────────────────────────────────────────────────────────
//

/// Aggregated view of attempt progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptProgress {
    pub total: usize,
    pub answered: usize,
    pub skipped: usize,
    pub is_complete: bool,
}

/// Outcome of submitting or skipping the current question.
///
/// Carries everything the session needs to fire the backend submission and
/// to later relabel the answer when the acknowledgement arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub selected_answer: Vec<OptionId>,
    pub time_spent_seconds: u32,
    pub revision: u64,
}

#[derive(Debug, Clone)]
struct AnswerSlot {
    answer: Answer,
    revision: u64,
}

/// In-memory state of the current attempt.
///
/// Questions are immutable after load and never re-ordered; only `answers`
/// and the current position change while the attempt is in progress. Every
/// mutation fails once the attempt is completed.
pub struct AttemptStateStore {
    attempt_id: AttemptId,
    exam_id: Option<ExamId>,
    is_dynamic: bool,
    status: AttemptStatus,
    questions: Vec<Question>,
    current_index: usize,
    answers: HashMap<QuestionId, AnswerSlot>,
    current_selection: Vec<OptionId>,
    question_entered_at: DateTime<Utc>,
    time_remaining_seconds: u32,
    started_at: DateTime<Utc>,
    next_revision: u64,
}

impl AttemptStateStore {
    /// Build the state for a freshly started attempt.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NoQuestions` if the backend delivered an empty
    /// question set.
    pub fn from_start(
        attempt_id: AttemptId,
        exam_id: Option<ExamId>,
        is_dynamic: bool,
        questions: Vec<Question>,
        time_remaining_seconds: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        if questions.is_empty() {
            return Err(AttemptError::NoQuestions);
        }
        Ok(Self {
            attempt_id,
            exam_id,
            is_dynamic,
            status: AttemptStatus::InProgress,
            questions,
            current_index: 0,
            answers: HashMap::new(),
            current_selection: Vec::new(),
            question_entered_at: now,
            time_remaining_seconds,
            started_at: now,
            next_revision: 1,
        })
    }

    /// Rebuild the state from the server's resume payload (no local cache).
    ///
    /// Server-known answers arrive already acknowledged.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NoQuestions` for an empty question set.
    pub fn from_resume(
        attempt_id: AttemptId,
        resumed: ResumedAttempt,
        now: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        let mut store = Self::from_start(
            attempt_id,
            None,
            false,
            resumed.questions,
            resumed.time_remaining_seconds,
            now,
        )?;
        for answered in resumed.answered_questions {
            let revision = store.bump_revision();
            store.answers.insert(
                answered.question_id,
                AnswerSlot {
                    answer: Answer::from_persisted(
                        answered.selected_answer,
                        answered.time_spent_seconds,
                        SyncState::Acknowledged,
                    ),
                    revision,
                },
            );
        }
        store.current_index = resumed
            .current_question_index
            .min(store.questions.len() - 1);
        store.refresh_selection_view(now);
        Ok(store)
    }

    /// Rehydrate the state from a cached snapshot.
    ///
    /// `corrected_remaining` is the staleness-corrected remaining time; the
    /// caller must route a zero directly to completion instead of building a
    /// store for a dead attempt.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NoQuestions` for an empty cached question set.
    pub fn from_snapshot(
        snapshot: CachedAttempt,
        corrected_remaining: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        let mut store = Self::from_start(
            snapshot.attempt_id,
            snapshot.exam_id,
            snapshot.is_dynamic,
            snapshot.questions,
            corrected_remaining,
            now,
        )?;
        for (question_id, cached) in snapshot.answers {
            let sync_state = if cached.submitted_to_backend {
                SyncState::Acknowledged
            } else {
                SyncState::Pending
            };
            let revision = store.bump_revision();
            store.answers.insert(
                question_id,
                AnswerSlot {
                    answer: Answer::from_persisted(
                        cached.selected_answer,
                        cached.time_spent_seconds,
                        sync_state,
                    ),
                    revision,
                },
            );
        }
        store.current_index = snapshot
            .current_question_index
            .min(store.questions.len() - 1);
        store.refresh_selection_view(now);
        Ok(store)
    }

    // ─── Queries ───────────────────────────────────────────────────────────

    #[must_use]
    pub fn attempt_id(&self) -> &AttemptId {
        &self.attempt_id
    }

    #[must_use]
    pub fn exam_id(&self) -> Option<&ExamId> {
        self.exam_id.as_ref()
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The question at the current position. `current_index` is clamped by
    /// every constructor and mutation, so the position is always valid.
    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    /// The transient selection for the current question, re-populated from
    /// any existing answer on navigation.
    #[must_use]
    pub fn current_selection(&self) -> &[OptionId] {
        &self.current_selection
    }

    /// The recorded answer for a question: `Some` with an empty selection is
    /// an explicit skip, `None` means not yet visited.
    #[must_use]
    pub fn answer(&self, question_id: &QuestionId) -> Option<&Answer> {
        self.answers.get(question_id).map(|slot| &slot.answer)
    }

    #[must_use]
    pub fn time_remaining_seconds(&self) -> u32 {
        self.time_remaining_seconds
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    #[must_use]
    pub fn progress(&self) -> AttemptProgress {
        let skipped = self
            .answers
            .values()
            .filter(|slot| slot.answer.is_skip())
            .count();
        AttemptProgress {
            total: self.questions.len(),
            answered: self.answers.len() - skipped,
            skipped,
            is_complete: self.is_complete(),
        }
    }

    /// Answers still awaiting a backend acknowledgement, in question order.
    #[must_use]
    pub fn pending_answers(&self) -> Vec<SubmittedAnswer> {
        self.questions
            .iter()
            .filter_map(|question| {
                self.answers.get(&question.id).and_then(|slot| {
                    if slot.answer.is_pending() {
                        Some(SubmittedAnswer {
                            question_id: question.id.clone(),
                            selected_answer: slot.answer.selected_option_ids().to_vec(),
                            time_spent_seconds: slot.answer.time_spent_seconds(),
                            revision: slot.revision,
                        })
                    } else {
                        None
                    }
                })
            })
            .collect()
    }

    // ─── Mutations ─────────────────────────────────────────────────────────

    /// Select an option on the current question.
    ///
    /// Single-choice questions replace the selection; multiple-choice
    /// questions toggle membership.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if the attempt is completed, the question is
    /// not the current one, or the option does not belong to it.
    pub fn select_option(
        &mut self,
        question_id: &QuestionId,
        option_id: OptionId,
    ) -> Result<(), AttemptError> {
        self.ensure_in_progress()?;
        let current = self.current_question();
        if &current.id != question_id {
            return Err(AttemptError::NotCurrent(question_id.clone()));
        }
        if !current.has_option(&option_id) {
            return Err(AttemptError::UnknownOption {
                question: question_id.clone(),
                option: option_id,
            });
        }
        match current.selection_mode {
            SelectionMode::Single => {
                self.current_selection = vec![option_id];
            }
            SelectionMode::Multiple => {
                if let Some(pos) = self.current_selection.iter().position(|id| id == &option_id) {
                    self.current_selection.remove(pos);
                } else {
                    self.current_selection.push(option_id);
                }
            }
        }
        Ok(())
    }

    /// Submit the current selection as the answer for the current question
    /// and advance, unless already on the last question.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::EmptySelection` if nothing is selected (no
    /// network call is made in that case), or `AttemptError::Completed`.
    pub fn submit_current(&mut self, now: DateTime<Utc>) -> Result<SubmittedAnswer, AttemptError> {
        self.ensure_in_progress()?;
        if self.current_selection.is_empty() {
            return Err(AttemptError::EmptySelection);
        }
        let selected = self.current_selection.clone();
        Ok(self.record_answer(selected, now))
    }

    /// Record an explicit skip (empty selection, distinct from unvisited)
    /// and advance the same way a submission does.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Completed` once the attempt is finished.
    pub fn skip_current(&mut self, now: DateTime<Utc>) -> Result<SubmittedAnswer, AttemptError> {
        self.ensure_in_progress()?;
        Ok(self.record_answer(Vec::new(), now))
    }

    /// Jump to a question without touching any answer.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::IndexOutOfBounds` for an invalid index, or
    /// `AttemptError::Completed`.
    pub fn go_to(&mut self, index: usize, now: DateTime<Utc>) -> Result<(), AttemptError> {
        self.ensure_in_progress()?;
        if index >= self.questions.len() {
            return Err(AttemptError::IndexOutOfBounds {
                index,
                len: self.questions.len(),
            });
        }
        self.current_index = index;
        self.refresh_selection_view(now);
        Ok(())
    }

    /// Move to the next question; no-op on the last one.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Completed` once the attempt is finished.
    pub fn go_next(&mut self, now: DateTime<Utc>) -> Result<(), AttemptError> {
        self.ensure_in_progress()?;
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.refresh_selection_view(now);
        }
        Ok(())
    }

    /// Move to the previous question; no-op on the first one.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Completed` once the attempt is finished.
    pub fn go_previous(&mut self, now: DateTime<Utc>) -> Result<(), AttemptError> {
        self.ensure_in_progress()?;
        if self.current_index > 0 {
            self.current_index -= 1;
            self.refresh_selection_view(now);
        }
        Ok(())
    }

    /// Mirror the countdown into the store. Frozen once completed.
    pub fn set_time_remaining(&mut self, seconds: u32) {
        if self.status == AttemptStatus::InProgress {
            self.time_remaining_seconds = seconds;
        }
    }

    /// Freeze the attempt. Idempotent; every later mutation fails.
    pub fn force_complete(&mut self) {
        self.status = AttemptStatus::Completed;
    }

    /// Relabel an answer as acknowledged if the confirmation is not stale.
    ///
    /// The revision guards against a slow acknowledgement racing a newer
    /// local write: the last local write always wins, and a confirmation
    /// never alters the answer's content either way.
    pub fn mark_acknowledged(&mut self, question_id: &QuestionId, revision: u64) -> bool {
        match self.answers.get_mut(question_id) {
            Some(slot) if slot.revision == revision => {
                slot.answer.acknowledge();
                true
            }
            _ => false,
        }
    }

    /// Serialize the state into the durable cache record.
    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> CachedAttempt {
        let answers = self
            .answers
            .iter()
            .map(|(question_id, slot)| {
                (
                    question_id.clone(),
                    CachedAnswer {
                        selected_answer: slot.answer.selected_option_ids().to_vec(),
                        time_spent_seconds: slot.answer.time_spent_seconds(),
                        submitted_to_backend: !slot.answer.is_pending(),
                    },
                )
            })
            .collect();
        CachedAttempt {
            attempt_id: self.attempt_id.clone(),
            exam_id: self.exam_id.clone(),
            is_dynamic: self.is_dynamic,
            questions: self.questions.clone(),
            current_question_index: self.current_index,
            answers,
            time_remaining_seconds: self.time_remaining_seconds,
            last_synced_at_epoch_ms: now.timestamp_millis(),
        }
    }

    // ─── Internals ─────────────────────────────────────────────────────────

    fn ensure_in_progress(&self) -> Result<(), AttemptError> {
        if self.status.is_terminal() {
            return Err(AttemptError::Completed);
        }
        Ok(())
    }

    fn bump_revision(&mut self) -> u64 {
        let revision = self.next_revision;
        self.next_revision += 1;
        revision
    }

    fn record_answer(&mut self, selected: Vec<OptionId>, now: DateTime<Utc>) -> SubmittedAnswer {
        let question_id = self.current_question().id.clone();
        let elapsed = (now - self.question_entered_at).num_seconds().max(0);
        let time_spent_seconds = u32::try_from(elapsed).unwrap_or(u32::MAX);
        let revision = self.bump_revision();

        let answer = if selected.is_empty() {
            Answer::skipped(time_spent_seconds)
        } else {
            Answer::new(selected.clone(), time_spent_seconds)
        };
        self.answers.insert(question_id.clone(), AnswerSlot { answer, revision });

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
        }
        self.refresh_selection_view(now);

        SubmittedAnswer {
            question_id,
            selected_answer: selected,
            time_spent_seconds,
            revision,
        }
    }

    fn refresh_selection_view(&mut self, now: DateTime<Utc>) {
        self.current_selection = self
            .answers
            .get(&self.current_question().id)
            .map(|slot| slot.answer.selected_option_ids().to_vec())
            .unwrap_or_default();
        self.question_entered_at = now;
    }
}

impl fmt::Debug for AttemptStateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttemptStateStore")
            .field("attempt_id", &self.attempt_id)
            .field("status", &self.status)
            .field("questions_len", &self.questions.len())
            .field("current_index", &self.current_index)
            .field("answers_len", &self.answers.len())
            .field("time_remaining_seconds", &self.time_remaining_seconds)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::AnsweredQuestion;
    use chrono::Duration;
    use exam_core::model::QuestionOption;
    use exam_core::time::fixed_now;

    fn question(id: u64, mode: SelectionMode) -> Question {
        Question {
            id: QuestionId::new(format!("q-{id}")),
            statement: format!("Question {id}"),
            options: vec![
                QuestionOption {
                    id: OptionId::new(format!("q{id}-a")),
                    label: "A".into(),
                },
                QuestionOption {
                    id: OptionId::new(format!("q{id}-b")),
                    label: "B".into(),
                },
                QuestionOption {
                    id: OptionId::new(format!("q{id}-c")),
                    label: "C".into(),
                },
            ],
            selection_mode: mode,
            subject: None,
        }
    }

    fn build_store(count: u64) -> AttemptStateStore {
        let questions = (1..=count)
            .map(|id| question(id, SelectionMode::Single))
            .collect();
        AttemptStateStore::from_start(
            AttemptId::new("att-1"),
            Some(ExamId::new("exam-7")),
            false,
            questions,
            3600,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn empty_question_set_is_rejected() {
        let err = AttemptStateStore::from_start(
            AttemptId::new("att-1"),
            None,
            true,
            Vec::new(),
            60,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, AttemptError::NoQuestions);
    }

    #[test]
    fn single_choice_replaces_selection() {
        let mut store = build_store(2);
        let q1 = QuestionId::new("q-1");
        store.select_option(&q1, OptionId::new("q1-a")).unwrap();
        store.select_option(&q1, OptionId::new("q1-b")).unwrap();

        assert_eq!(store.current_selection(), &[OptionId::new("q1-b")]);
    }

    #[test]
    fn multiple_choice_toggles_membership() {
        let questions = vec![question(1, SelectionMode::Multiple), question(2, SelectionMode::Single)];
        let mut store = AttemptStateStore::from_start(
            AttemptId::new("att-1"),
            None,
            false,
            questions,
            3600,
            fixed_now(),
        )
        .unwrap();
        let q1 = QuestionId::new("q-1");

        store.select_option(&q1, OptionId::new("q1-a")).unwrap();
        store.select_option(&q1, OptionId::new("q1-c")).unwrap();
        assert_eq!(
            store.current_selection(),
            &[OptionId::new("q1-a"), OptionId::new("q1-c")]
        );

        // Toggling an already-selected option removes it.
        store.select_option(&q1, OptionId::new("q1-a")).unwrap();
        assert_eq!(store.current_selection(), &[OptionId::new("q1-c")]);
    }

    #[test]
    fn selecting_a_foreign_option_is_rejected() {
        let mut store = build_store(2);
        let err = store
            .select_option(&QuestionId::new("q-1"), OptionId::new("q2-a"))
            .unwrap_err();
        assert!(matches!(err, AttemptError::UnknownOption { .. }));
    }

    #[test]
    fn submit_requires_a_selection() {
        let mut store = build_store(2);
        let err = store.submit_current(fixed_now()).unwrap_err();
        assert_eq!(err, AttemptError::EmptySelection);
        assert_eq!(store.current_index(), 0);
    }

    #[test]
    fn submit_advances_by_exactly_one() {
        let mut store = build_store(3);
        store
            .select_option(&QuestionId::new("q-1"), OptionId::new("q1-a"))
            .unwrap();
        let submitted = store.submit_current(fixed_now()).unwrap();

        assert_eq!(submitted.question_id, QuestionId::new("q-1"));
        assert_eq!(store.current_index(), 1);
        // Fresh question: transient selection is empty again.
        assert!(store.current_selection().is_empty());
    }

    #[test]
    fn submit_on_last_question_does_not_advance_or_complete() {
        let mut store = build_store(2);
        store.go_to(1, fixed_now()).unwrap();
        store
            .select_option(&QuestionId::new("q-2"), OptionId::new("q2-b"))
            .unwrap();
        store.submit_current(fixed_now()).unwrap();

        assert_eq!(store.current_index(), 1);
        // No auto-completion: an explicit completion action is required.
        assert!(!store.is_complete());
        // The view now shows the recorded answer.
        assert_eq!(store.current_selection(), &[OptionId::new("q2-b")]);
    }

    #[test]
    fn submit_records_wall_clock_time_spent() {
        let mut store = build_store(2);
        store
            .select_option(&QuestionId::new("q-1"), OptionId::new("q1-a"))
            .unwrap();
        let submitted = store
            .submit_current(fixed_now() + Duration::seconds(42))
            .unwrap();
        assert_eq!(submitted.time_spent_seconds, 42);
    }

    #[test]
    fn skip_is_distinguishable_from_unvisited() {
        let mut store = build_store(3);
        store.skip_current(fixed_now()).unwrap();

        let skipped = store.answer(&QuestionId::new("q-1")).unwrap();
        assert!(skipped.is_skip());
        assert_eq!(skipped, &Answer::skipped(0));
        // Unvisited question has no entry at all.
        assert!(store.answer(&QuestionId::new("q-3")).is_none());
        assert_eq!(store.current_index(), 1);
    }

    #[test]
    fn navigation_never_touches_answers() {
        let mut store = build_store(3);
        store
            .select_option(&QuestionId::new("q-1"), OptionId::new("q1-a"))
            .unwrap();
        store.submit_current(fixed_now()).unwrap();

        store.go_previous(fixed_now()).unwrap();
        assert_eq!(store.current_index(), 0);
        // Selection view re-populated from the recorded answer.
        assert_eq!(store.current_selection(), &[OptionId::new("q1-a")]);
        assert_eq!(store.answer(&QuestionId::new("q-1")).unwrap().sync_state(), SyncState::Pending);

        store.go_next(fixed_now()).unwrap();
        store.go_next(fixed_now()).unwrap();
        assert_eq!(store.current_index(), 2);
        // go_next on the last question is a no-op.
        store.go_next(fixed_now()).unwrap();
        assert_eq!(store.current_index(), 2);
    }

    #[test]
    fn go_to_rejects_out_of_bounds() {
        let mut store = build_store(2);
        let err = store.go_to(5, fixed_now()).unwrap_err();
        assert!(matches!(err, AttemptError::IndexOutOfBounds { len: 2, .. }));
    }

    #[test]
    fn answers_never_exceed_highest_index_reached() {
        let mut store = build_store(5);
        // Answer two questions, reaching index 2 at most.
        for _ in 0..2 {
            let current = store.current_question().id.clone();
            let option = store.current_question().options[0].id.clone();
            store.select_option(&current, option).unwrap();
            store.submit_current(fixed_now()).unwrap();
        }
        let highest_reached = store.current_index();

        for (index, question) in store.questions().iter().enumerate() {
            if store.answer(&question.id).is_some() {
                assert!(index <= highest_reached);
            }
        }
    }

    #[test]
    fn completed_attempt_rejects_every_mutation() {
        let mut store = build_store(2);
        store.force_complete();

        assert_eq!(
            store
                .select_option(&QuestionId::new("q-1"), OptionId::new("q1-a"))
                .unwrap_err(),
            AttemptError::Completed
        );
        assert_eq!(store.submit_current(fixed_now()).unwrap_err(), AttemptError::Completed);
        assert_eq!(store.skip_current(fixed_now()).unwrap_err(), AttemptError::Completed);
        assert_eq!(store.go_next(fixed_now()).unwrap_err(), AttemptError::Completed);

        // Remaining time is frozen too.
        let before = store.time_remaining_seconds();
        store.set_time_remaining(before - 100);
        assert_eq!(store.time_remaining_seconds(), before);
    }

    #[test]
    fn stale_acknowledgement_is_ignored() {
        let mut store = build_store(2);
        let q1 = QuestionId::new("q-1");
        store.select_option(&q1, OptionId::new("q1-a")).unwrap();
        let first = store.submit_current(fixed_now()).unwrap();

        // User goes back and overwrites the answer before the ack lands.
        store.go_previous(fixed_now()).unwrap();
        store.select_option(&q1, OptionId::new("q1-b")).unwrap();
        let second = store.submit_current(fixed_now()).unwrap();

        // The late ack for the first write must not relabel the newer one.
        assert!(!store.mark_acknowledged(&q1, first.revision));
        assert!(store.answer(&q1).unwrap().is_pending());

        assert!(store.mark_acknowledged(&q1, second.revision));
        assert_eq!(store.answer(&q1).unwrap().sync_state(), SyncState::Acknowledged);
        assert_eq!(
            store.answer(&q1).unwrap().selected_option_ids(),
            &[OptionId::new("q1-b")]
        );
    }

    #[test]
    fn pending_answers_lists_only_unacknowledged_in_order() {
        let mut store = build_store(3);
        let first = {
            let q = store.current_question().id.clone();
            let opt = store.current_question().options[0].id.clone();
            store.select_option(&q, opt).unwrap();
            store.submit_current(fixed_now()).unwrap()
        };
        store.skip_current(fixed_now()).unwrap();

        store.mark_acknowledged(&first.question_id, first.revision);

        let pending = store.pending_answers();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].question_id, QuestionId::new("q-2"));
        assert!(pending[0].selected_answer.is_empty());
    }

    #[test]
    fn snapshot_round_trip_preserves_state() {
        let mut store = build_store(3);
        store
            .select_option(&QuestionId::new("q-1"), OptionId::new("q1-b"))
            .unwrap();
        let submitted = store.submit_current(fixed_now()).unwrap();
        store.mark_acknowledged(&submitted.question_id, submitted.revision);
        store.skip_current(fixed_now()).unwrap();

        let snapshot = store.snapshot(fixed_now());
        // Zero elapsed time: rehydration must reproduce the state exactly.
        let corrected = snapshot.corrected_remaining(fixed_now());
        let restored =
            AttemptStateStore::from_snapshot(snapshot, corrected, fixed_now()).unwrap();

        assert_eq!(restored.current_index(), store.current_index());
        assert_eq!(restored.questions(), store.questions());
        assert_eq!(restored.time_remaining_seconds(), store.time_remaining_seconds());
        for question in store.questions() {
            assert_eq!(restored.answer(&question.id), store.answer(&question.id));
        }
    }

    #[test]
    fn resume_payload_seeds_acknowledged_answers() {
        let resumed = ResumedAttempt {
            questions: vec![
                question(1, SelectionMode::Single),
                question(2, SelectionMode::Single),
                question(3, SelectionMode::Single),
            ],
            time_remaining_seconds: 1200,
            current_question_index: 2,
            answered_questions: vec![AnsweredQuestion {
                question_id: QuestionId::new("q-1"),
                selected_answer: vec![OptionId::new("q1-c")],
                time_spent_seconds: 30,
            }],
        };
        let store =
            AttemptStateStore::from_resume(AttemptId::new("att-9"), resumed, fixed_now()).unwrap();

        assert_eq!(store.current_index(), 2);
        assert_eq!(store.time_remaining_seconds(), 1200);
        let answer = store.answer(&QuestionId::new("q-1")).unwrap();
        assert_eq!(answer.sync_state(), SyncState::Acknowledged);
        assert_eq!(answer.selected_option_ids(), &[OptionId::new("q1-c")]);
    }
}
