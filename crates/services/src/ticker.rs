use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::warn;

use crate::session::AttemptSession;

const TICK_PERIOD: Duration = Duration::from_secs(1);
const PERSIST_PERIOD: Duration = Duration::from_secs(10);

/// Background driver for an [`AttemptSession`]: a one-second countdown tick
/// and a ten-second persistence tick.
///
/// Dropping (or stopping) the ticker aborts both loops. Detached submission
/// and completion tasks spawned by the session are not its children and keep
/// running.
pub struct SessionTicker {
    tick_loop: JoinHandle<()>,
    persist_loop: JoinHandle<()>,
}

impl SessionTicker {
    /// Spawn both loops on the current runtime.
    ///
    /// The first tick fires after one full period, not immediately, so
    /// starting the ticker does not cost the attempt a second.
    #[must_use]
    pub fn spawn(session: AttemptSession) -> Self {
        let tick_session = session.clone();
        let tick_loop = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            loop {
                interval.tick().await;
                if let Err(error) = tick_session.tick() {
                    warn!(%error, "countdown tick failed, stopping the tick loop");
                    break;
                }
            }
        });

        let persist_loop = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + PERSIST_PERIOD, PERSIST_PERIOD);
            loop {
                interval.tick().await;
                // A failed write is retried on the next period; the snapshot
                // only goes stale, it is never lost.
                if let Err(error) = session.persist().await {
                    warn!(%error, "periodic snapshot write failed");
                }
            }
        });

        Self {
            tick_loop,
            persist_loop,
        }
    }

    /// Stop both loops. Idempotent via `Drop` as well.
    pub fn stop(&self) {
        self.tick_loop.abort();
        self.persist_loop.abort();
    }
}

impl Drop for SessionTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{AttemptCache, FULL_EXAM_SLOT};
    use crate::gateway::{ExamSelector, InMemoryGateway};
    use exam_core::Clock;
    use exam_core::model::{
        ExamId, OptionId, Question, QuestionId, QuestionOption, SelectionMode,
    };
    use std::sync::Arc;
    use storage::kv::InMemoryKeyValueStore;

    fn questions() -> Vec<Question> {
        vec![Question {
            id: QuestionId::new("q-1"),
            statement: "Q1".into(),
            options: vec![QuestionOption {
                id: OptionId::new("q1-a"),
                label: "A".into(),
            }],
            selection_mode: SelectionMode::Single,
            subject: None,
        }]
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_drive_the_countdown() {
        let gateway = Arc::new(InMemoryGateway::new(questions(), 120));
        let cache = AttemptCache::new(Arc::new(InMemoryKeyValueStore::new()), FULL_EXAM_SLOT);
        let session = AttemptSession::start_fresh(
            gateway,
            cache,
            Clock::default_clock(),
            ExamSelector::Exam(ExamId::new("exam-1")),
        )
        .await
        .unwrap();

        let ticker = SessionTicker::spawn(session.clone());
        // Half-second offset keeps the assertion off a tick boundary.
        tokio::time::sleep(Duration::from_millis(3500)).await;
        tokio::task::yield_now().await;

        assert_eq!(session.time_remaining_seconds().unwrap(), 117);
        ticker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn persistence_tick_writes_the_snapshot() {
        let gateway = Arc::new(InMemoryGateway::new(questions(), 120));
        let store = Arc::new(InMemoryKeyValueStore::new());
        let cache = AttemptCache::new(Arc::clone(&store) as Arc<dyn storage::kv::KeyValueStore>, FULL_EXAM_SLOT);
        let session = AttemptSession::start_fresh(
            gateway,
            cache.clone(),
            Clock::default_clock(),
            ExamSelector::Exam(ExamId::new("exam-1")),
        )
        .await
        .unwrap();
        cache.clear().await.unwrap();

        let ticker = SessionTicker::spawn(session);
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        tokio::task::yield_now().await;

        let reloaded = cache.load(chrono::Utc::now()).await.unwrap();
        assert!(reloaded.is_some());
        ticker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_ticker_leaves_the_countdown_alone() {
        let gateway = Arc::new(InMemoryGateway::new(questions(), 120));
        let cache = AttemptCache::new(Arc::new(InMemoryKeyValueStore::new()), FULL_EXAM_SLOT);
        let session = AttemptSession::start_fresh(
            gateway,
            cache,
            Clock::default_clock(),
            ExamSelector::Exam(ExamId::new("exam-1")),
        )
        .await
        .unwrap();

        let ticker = SessionTicker::spawn(session.clone());
        tokio::time::sleep(Duration::from_millis(2500)).await;
        tokio::task::yield_now().await;
        ticker.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;

        assert_eq!(session.time_remaining_seconds().unwrap(), 118);
    }
}
