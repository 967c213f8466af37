#![forbid(unsafe_code)]

pub mod attempt_store;
pub mod cache;
pub mod error;
pub mod gateway;
pub mod recovery;
pub mod session;
pub mod ticker;

pub use exam_core::Clock;

pub use attempt_store::{AttemptProgress, AttemptStateStore, SubmittedAnswer};
pub use cache::{AttemptCache, LoadedSnapshot};
pub use error::{AttemptError, CacheError, GatewayError, RecoveryError, SessionError};
pub use gateway::{
    ActiveAttempt, AnswerSubmission, AnsweredQuestion, AttemptSummary, CompletedAttemptInfo,
    DynamicExamRequest, ExamResults, ExamSelector, GatewayConfig, HttpSyncGateway, InMemoryGateway,
    ResumedAttempt, StartedAttempt, SyncGateway,
};
pub use recovery::{RecoveryCoordinator, RecoveryDecision};
pub use session::AttemptSession;
pub use ticker::SessionTicker;
