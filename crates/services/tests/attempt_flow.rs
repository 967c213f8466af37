//! End-to-end attempt lifecycle against the in-memory gateway.

use std::sync::Arc;

use exam_core::Clock;
use exam_core::model::{
    AttemptStatus, ExamId, OptionId, Question, QuestionId, QuestionOption, SelectionMode,
};
use services::cache::FULL_EXAM_SLOT;
use services::{AttemptCache, AttemptSession, ExamSelector, InMemoryGateway, SessionError};
use storage::kv::InMemoryKeyValueStore;

fn question(id: u64) -> Question {
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
        ],
        selection_mode: SelectionMode::Single,
        subject: None,
    }
}

fn questions(count: u64) -> Vec<Question> {
    (1..=count).map(question).collect()
}

struct Harness {
    gateway: Arc<InMemoryGateway>,
    cache: AttemptCache,
    session: AttemptSession,
}

async fn start(question_count: u64, duration_seconds: u32) -> Harness {
    let gateway = Arc::new(InMemoryGateway::new(questions(question_count), duration_seconds));
    let cache = AttemptCache::new(Arc::new(InMemoryKeyValueStore::new()), FULL_EXAM_SLOT);
    let session = AttemptSession::start_fresh(
        Arc::clone(&gateway) as Arc<dyn services::SyncGateway>,
        cache.clone(),
        Clock::default_clock(),
        ExamSelector::Exam(ExamId::new("exam-1")),
    )
    .await
    .unwrap();
    Harness {
        gateway,
        cache,
        session,
    }
}

/// Let detached submission and completion tasks run to completion.
async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn answering_advances_and_reaches_the_backend() {
    let h = start(3, 3600).await;

    h.session
        .select_option(&QuestionId::new("q-1"), OptionId::new("q1-a"))
        .unwrap();
    h.session.submit_current().unwrap();
    h.session.skip_current().unwrap();
    settle().await;

    assert_eq!(h.session.current_index().unwrap(), 2);
    let submissions = h.gateway.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].1.question_id, QuestionId::new("q-1"));
    assert_eq!(submissions[0].1.selected_answer, vec![OptionId::new("q1-a")]);
    // The skip travels as an empty selection.
    assert_eq!(submissions[1].1.question_id, QuestionId::new("q-2"));
    assert!(submissions[1].1.selected_answer.is_empty());

    let progress = h.session.progress().unwrap();
    assert_eq!(progress.answered, 1);
    assert_eq!(progress.skipped, 1);
    assert!(!progress.is_complete);
}

#[tokio::test]
async fn empty_selection_never_reaches_the_backend() {
    let h = start(2, 3600).await;

    let err = h.session.submit_current().unwrap_err();
    assert!(matches!(err, SessionError::Attempt(_)));
    settle().await;

    assert!(h.gateway.submissions().is_empty());
    assert_eq!(h.session.current_index().unwrap(), 0);
}

#[tokio::test]
async fn timer_expiry_freezes_and_completes_exactly_once() {
    let h = start(2, 5).await;

    for _ in 0..5 {
        h.session.tick().unwrap();
    }
    settle().await;

    assert_eq!(h.session.status().unwrap(), AttemptStatus::Completed);
    assert_eq!(h.session.time_remaining_seconds().unwrap(), 0);
    assert_eq!(h.gateway.complete_calls(), 1);
    assert!(h.cache.load(chrono::Utc::now()).await.unwrap().is_none());

    // Ticks after expiry are no-ops and never re-complete.
    h.session.tick().unwrap();
    settle().await;
    assert_eq!(h.gateway.complete_calls(), 1);

    // Interaction after expiry is rejected.
    let err = h
        .session
        .select_option(&QuestionId::new("q-1"), OptionId::new("q1-a"))
        .unwrap_err();
    assert!(matches!(err, SessionError::Attempt(_)));
}

#[tokio::test]
async fn failed_submissions_are_drained_on_completion() {
    let h = start(3, 3600).await;

    h.gateway.set_fail_submits(true);
    h.session
        .select_option(&QuestionId::new("q-1"), OptionId::new("q1-b"))
        .unwrap();
    h.session.submit_current().unwrap();
    h.session
        .select_option(&QuestionId::new("q-2"), OptionId::new("q2-a"))
        .unwrap();
    h.session.submit_current().unwrap();
    settle().await;

    // Failures were swallowed: the UI advanced, nothing reached the server.
    assert_eq!(h.session.current_index().unwrap(), 2);
    assert!(h.gateway.submissions().is_empty());

    h.gateway.set_fail_submits(false);
    let results = h.session.complete().await.unwrap();

    // The drain replayed both answers in question order before completing.
    let submissions = h.gateway.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].1.question_id, QuestionId::new("q-1"));
    assert_eq!(submissions[1].1.question_id, QuestionId::new("q-2"));
    assert_eq!(results.total_questions, 3);
    assert_eq!(h.session.status().unwrap(), AttemptStatus::Completed);
}

#[tokio::test]
async fn completion_clears_the_cache_and_stops_the_countdown() {
    let h = start(2, 3600).await;
    h.session.persist().await.unwrap();
    assert!(h.cache.load(chrono::Utc::now()).await.unwrap().is_some());

    h.session.complete().await.unwrap();

    assert!(h.cache.load(chrono::Utc::now()).await.unwrap().is_none());
    let frozen = h.session.time_remaining_seconds().unwrap();
    h.session.tick().unwrap();
    assert_eq!(h.session.time_remaining_seconds().unwrap(), frozen);

    // Persisting a completed attempt writes nothing.
    h.session.persist().await.unwrap();
    assert!(h.cache.load(chrono::Utc::now()).await.unwrap().is_none());
}

#[tokio::test]
async fn repeated_completion_returns_the_same_results() {
    let h = start(2, 3600).await;

    let first = h.session.complete().await.unwrap();
    let second = h.session.complete().await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn completion_failure_keeps_the_attempt_in_progress() {
    let h = start(2, 3600).await;
    h.session.persist().await.unwrap();

    h.gateway.set_fail_completes(true);
    let err = h.session.complete().await.unwrap_err();
    assert!(matches!(err, SessionError::Gateway(_)));

    // Still resumable: state, countdown, and cache are all untouched.
    assert_eq!(h.session.status().unwrap(), AttemptStatus::InProgress);
    assert!(h.cache.load(chrono::Utc::now()).await.unwrap().is_some());

    h.gateway.set_fail_completes(false);
    h.session.complete().await.unwrap();
    assert_eq!(h.session.status().unwrap(), AttemptStatus::Completed);
    assert!(h.cache.load(chrono::Utc::now()).await.unwrap().is_none());
}
