mod answer;
mod attempt;
mod ids;
mod question;

pub use answer::{Answer, SyncState};
pub use attempt::{AttemptStatus, CachedAnswer, CachedAttempt};
pub use ids::{AttemptId, ExamId, OptionId, QuestionId};
pub use question::{Question, QuestionOption, SelectionMode, SubjectInfo};
