//! Execution backends: local child processes and the remote sandbox service

mod local;
mod remote;

use crate::error::{RunnerError, SandboxResult};
use crate::types::ExecutionResult;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub use local::{terminate, LocalRunner};
pub use remote::{Judge0Client, PollOutcome, SandboxLanguage, Submission, SubmissionHandle};

/// Runs a script on this machine
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run `script` to completion or until `timeout` expires.
    ///
    /// A missing script fails with `RunnerError::NotFound` before anything is
    /// spawned.
    async fn run(
        &self,
        script: &Path,
        timeout: Duration,
        stdin: Option<&str>,
    ) -> Result<ExecutionResult, RunnerError>;

    /// Get runner name
    fn name(&self) -> &str;
}

/// Submit/poll client for an asynchronous code-execution service.
///
/// Retry and backoff policy belongs to the caller; every method here is a
/// single round trip.
#[async_trait]
pub trait RemoteSandbox: Send + Sync {
    /// Queue `submission` and return the token to poll with
    async fn submit(&self, submission: &Submission) -> SandboxResult<SubmissionHandle>;

    /// Fetch the current state of a submission
    async fn poll(&self, handle: &SubmissionHandle) -> SandboxResult<PollOutcome>;

    /// Liveness check with a short fixed timeout
    async fn health_check(&self) -> bool;

    /// Get sandbox name
    fn name(&self) -> &str;
}
