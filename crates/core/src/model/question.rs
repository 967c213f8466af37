use serde::{Deserialize, Serialize};

use crate::model::{OptionId, QuestionId};

/// Whether a question accepts one selected option or several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionMode {
    #[default]
    Single,
    Multiple,
}

/// One answer option of a question, as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: OptionId,
    pub label: String,
}

/// Subject metadata attached to a question, used for dashboards only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInfo {
    pub id: String,
    pub name: String,
}

/// A question inside an attempt.
///
/// The set of questions is fixed once loaded and never re-ordered; this type
/// is both the wire shape and the in-memory shape, so fields stay public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub statement: String,
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub selection_mode: SelectionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectInfo>,
}

impl Question {
    /// Returns true if `option_id` is one of this question's options.
    #[must_use]
    pub fn has_option(&self, option_id: &OptionId) -> bool {
        self.options.iter().any(|option| &option.id == option_id)
    }
}
