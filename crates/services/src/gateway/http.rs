use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;

use exam_core::model::{AttemptId, ExamId};

use crate::error::GatewayError;

use super::{
    ActiveAttempt, AnswerSubmission, AttemptSummary, ExamResults, ExamSelector, ResumedAttempt,
    StartedAttempt, SyncGateway,
};

/// Default timeout for all gateway calls.
const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Extended timeout for `complete` only: bulk grading of a full attempt may
/// legitimately take this long, and slowness is not failure.
const COMPLETE_TIMEOUT_SECS: u64 = 120;

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_token: Option<String>,
}

impl GatewayConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
        }
    }

    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("EXAM_API_BASE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let api_token = env::var("EXAM_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        Some(Self {
            base_url,
            api_token,
        })
    }
}

/// Reqwest-backed implementation of [`SyncGateway`].
#[derive(Clone)]
pub struct HttpSyncGateway {
    client: Client,
    config: GatewayConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartExamRequest<'a> {
    exam_id: &'a ExamId,
}

impl HttpSyncGateway {
    /// Build a gateway with the default short timeout.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the HTTP client cannot be constructed.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn check_status(
        response: Response,
        attempt_id: Option<&AttemptId>,
    ) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = attempt_id {
                return Err(GatewayError::UnknownAttempt(id.to_string()));
            }
        }
        Err(GatewayError::HttpStatus(status))
    }
}

#[async_trait]
impl SyncGateway for HttpSyncGateway {
    async fn start(&self, selector: &ExamSelector) -> Result<StartedAttempt, GatewayError> {
        let request = match selector {
            ExamSelector::Exam(exam_id) => self
                .authorize(self.client.post(self.url("/exams/start")))
                .json(&StartExamRequest { exam_id }),
            ExamSelector::Dynamic(spec) => self
                .authorize(self.client.post(self.url("/exams/start-dynamic")))
                .json(spec),
        };

        let response = Self::check_status(request.send().await?, None)?;
        Ok(response.json().await?)
    }

    async fn resume(&self, attempt_id: &AttemptId) -> Result<ResumedAttempt, GatewayError> {
        let url = self.url(&format!("/exams/attempts/{attempt_id}/resume"));
        let response = self.authorize(self.client.get(url)).send().await?;
        let response = Self::check_status(response, Some(attempt_id))?;
        Ok(response.json().await?)
    }

    async fn summary(&self, attempt_id: &AttemptId) -> Result<AttemptSummary, GatewayError> {
        let url = self.url(&format!("/exams/attempts/{attempt_id}/summary"));
        let response = self.authorize(self.client.get(url)).send().await?;
        let response = Self::check_status(response, Some(attempt_id))?;
        Ok(response.json().await?)
    }

    async fn submit_answer(
        &self,
        attempt_id: &AttemptId,
        submission: &AnswerSubmission,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!("/exams/attempts/{attempt_id}/answer"));
        let response = self
            .authorize(self.client.post(url))
            .json(submission)
            .send()
            .await?;
        Self::check_status(response, Some(attempt_id))?;
        Ok(())
    }

    async fn check_active_attempt(&self) -> Result<ActiveAttempt, GatewayError> {
        let url = self.url("/exams/active-attempt");
        let response = self.authorize(self.client.get(url)).send().await?;
        let response = Self::check_status(response, None)?;
        Ok(response.json().await?)
    }

    async fn complete(&self, attempt_id: &AttemptId) -> Result<ExamResults, GatewayError> {
        let url = self.url(&format!("/exams/attempts/{attempt_id}/complete"));
        let response = self
            .authorize(self.client.post(url))
            .timeout(Duration::from_secs(COMPLETE_TIMEOUT_SECS))
            .send()
            .await?;
        let response = Self::check_status(response, Some(attempt_id))?;
        Ok(response.json().await?)
    }

    async fn results(&self, attempt_id: &AttemptId) -> Result<ExamResults, GatewayError> {
        let url = self.url(&format!("/exams/attempts/{attempt_id}/results"));
        let response = self.authorize(self.client.get(url)).send().await?;
        let response = Self::check_status(response, Some(attempt_id))?;
        Ok(response.json().await?)
    }
}
