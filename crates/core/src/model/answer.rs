use serde::{Deserialize, Serialize};

use crate::model::OptionId;

/// Whether an answer has been confirmed by the backend.
///
/// `Pending` marks a local-only optimistic write; `Acknowledged` means the
/// server confirmed the submission. Acknowledgement never alters the answer's
/// content, it only relabels it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    Pending,
    Acknowledged,
}

/// A recorded answer for one question.
///
/// An empty selection is an explicit skip; a question with no `Answer` at all
/// has simply not been visited yet. The two must stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    selected_option_ids: Vec<OptionId>,
    time_spent_seconds: u32,
    sync_state: SyncState,
}

impl Answer {
    /// A freshly submitted answer, not yet confirmed by the backend.
    #[must_use]
    pub fn new(selected_option_ids: Vec<OptionId>, time_spent_seconds: u32) -> Self {
        Self {
            selected_option_ids,
            time_spent_seconds,
            sync_state: SyncState::Pending,
        }
    }

    /// An explicit skip: the user visited the question and chose nothing.
    #[must_use]
    pub fn skipped(time_spent_seconds: u32) -> Self {
        Self::new(Vec::new(), time_spent_seconds)
    }

    /// Rehydrate an answer from a persisted or server-provided record.
    #[must_use]
    pub fn from_persisted(
        selected_option_ids: Vec<OptionId>,
        time_spent_seconds: u32,
        sync_state: SyncState,
    ) -> Self {
        Self {
            selected_option_ids,
            time_spent_seconds,
            sync_state,
        }
    }

    #[must_use]
    pub fn selected_option_ids(&self) -> &[OptionId] {
        &self.selected_option_ids
    }

    #[must_use]
    pub fn time_spent_seconds(&self) -> u32 {
        self.time_spent_seconds
    }

    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    /// Returns true for an explicit skip (visited, nothing selected).
    #[must_use]
    pub fn is_skip(&self) -> bool {
        self.selected_option_ids.is_empty()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.sync_state == SyncState::Pending
    }

    /// Relabel the answer as server-confirmed.
    pub fn acknowledge(&mut self) {
        self.sync_state = SyncState::Acknowledged;
    }
}
