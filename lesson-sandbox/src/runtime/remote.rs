//! HTTP client for a Judge0-compatible sandbox service

use crate::config::RemoteConfig;
use crate::error::{SandboxError, SandboxResult};
use crate::language::Language;
use crate::types::{Backend, ExecutionResult, ExecutionStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Code submitted to the sandbox
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub source_code: String,
    pub language_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_time_limit: Option<f64>,
}

impl Submission {
    pub fn new(source_code: impl Into<String>, language_id: u32) -> Self {
        Self {
            source_code: source_code.into(),
            language_id,
            stdin: None,
            wall_time_limit: None,
        }
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn with_wall_time_limit(mut self, limit: Duration) -> Self {
        self.wall_time_limit = Some(limit.as_secs_f64());
        self
    }

    fn validate(&self) -> SandboxResult<()> {
        if self.source_code.trim().is_empty() {
            return Err(SandboxError::InvalidInput("source code is empty".to_string()));
        }
        if Language::from_id(self.language_id).is_none() {
            return Err(SandboxError::InvalidInput(format!(
                "unrecognized language id {}",
                self.language_id
            )));
        }
        Ok(())
    }
}

/// Opaque token identifying a queued submission
#[derive(Debug, PartialEq, Eq)]
pub struct SubmissionHandle {
    token: String,
}

impl SubmissionHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// State of a submission at one poll
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Pending,
    Complete(ExecutionResult),
}

/// Language entry advertised by the sandbox
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SandboxLanguage {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SubmissionState {
    id: u32,
    #[serde(default)]
    description: String,
}

/// Submission as reported by `GET /submissions/{token}`; unknown fields are ignored
#[derive(Debug, Default, Deserialize)]
struct SubmissionReport {
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    compile_output: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    exit_code: Option<i32>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    status: Option<SubmissionState>,
}

impl SubmissionReport {
    fn into_outcome(self) -> SandboxResult<PollOutcome> {
        let state = self
            .status
            .ok_or_else(|| SandboxError::Decode("submission has no status".to_string()))?;

        let status = match state.id {
            1 | 2 => return Ok(PollOutcome::Pending),
            3 => ExecutionStatus::Succeeded,
            5 => ExecutionStatus::TimedOut,
            _ => ExecutionStatus::Failed,
        };

        let mut stderr = self.stderr.unwrap_or_default();
        if let Some(compile) = self.compile_output.filter(|c| !c.is_empty()) {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&compile);
        }

        let duration = self
            .time
            .and_then(|t| t.parse::<f64>().ok())
            // rejects negative, NaN and out-of-range values
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or_default();

        let result = ExecutionResult::reported(
            Backend::Remote,
            status,
            self.exit_code,
            self.stdout.unwrap_or_default(),
            stderr,
            duration,
        );

        let result = if status == ExecutionStatus::Succeeded {
            result
        } else {
            let reason = match self.message.filter(|m| !m.is_empty()) {
                Some(message) => format!("{}: {}", state.description, message),
                None => state.description,
            };
            result.with_error(reason)
        };

        Ok(PollOutcome::Complete(result))
    }
}

/// Client for the Judge0 submissions API
pub struct Judge0Client {
    http: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
}

impl Judge0Client {
    pub fn new(config: &RemoteConfig) -> SandboxResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SandboxError::ServiceUnavailable(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            health_timeout: config.health_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Languages the service can run
    pub async fn languages(&self) -> SandboxResult<Vec<SandboxLanguage>> {
        let response = self
            .http
            .get(format!("{}/languages", self.base_url))
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(response: reqwest::Response) -> SandboxResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
        return Err(SandboxError::InvalidInput(body));
    }
    if status.is_server_error() {
        return Err(SandboxError::ServiceUnavailable(format!("{}: {}", status, body)));
    }
    Err(SandboxError::UnexpectedResponse {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl super::RemoteSandbox for Judge0Client {
    async fn submit(&self, submission: &Submission) -> SandboxResult<SubmissionHandle> {
        submission.validate()?;

        let response = self
            .http
            .post(format!(
                "{}/submissions?base64_encoded=false&wait=false",
                self.base_url
            ))
            .json(submission)
            .send()
            .await?;
        let response = check_status(response).await?;
        let TokenResponse { token } = response.json().await?;

        tracing::debug!(
            token = %token,
            language_id = submission.language_id,
            "Submitted to sandbox"
        );
        Ok(SubmissionHandle::new(token))
    }

    async fn poll(&self, handle: &SubmissionHandle) -> SandboxResult<PollOutcome> {
        let response = self
            .http
            .get(format!(
                "{}/submissions/{}?base64_encoded=false",
                self.base_url, handle.token
            ))
            .send()
            .await?;
        let response = check_status(response).await?;
        let report: SubmissionReport = response.json().await?;
        report.into_outcome()
    }

    async fn health_check(&self) -> bool {
        let about = self
            .http
            .get(format!("{}/about", self.base_url))
            .timeout(self.health_timeout)
            .send()
            .await;

        match about {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Sandbox health check failed");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sandbox unreachable");
                false
            }
        }
    }

    fn name(&self) -> &str {
        "judge0"
    }
}
