//! Core types for lesson execution

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Execution strategy for a lesson
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Child process on this machine
    #[default]
    Local,
    /// Submission to the remote sandbox service
    Remote,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Local => f.write_str("local"),
            Backend::Remote => f.write_str("remote"),
        }
    }
}

/// Lesson identity: category plus script name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LessonId {
    pub category: String,
    pub name: String,
}

impl LessonId {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// Request to execute a lesson.
///
/// Built once with the `with_*` methods and then handed to the orchestrator;
/// there are no setters afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    lesson: LessonId,
    backend: Backend,
    #[serde(default, with = "humantime_serde")]
    timeout: Option<Duration>,
    #[serde(default)]
    stdin: Option<String>,
}

impl ExecutionRequest {
    pub fn new(lesson: LessonId, backend: Backend) -> Self {
        Self {
            lesson,
            backend,
            timeout: None,
            stdin: None,
        }
    }

    /// Override the configured timeout for this request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Feed `stdin` to the script
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn lesson(&self) -> &LessonId {
        &self.lesson
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }
}

/// Terminal status of one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Succeeded,
    Failed,
    TimedOut,
    BackendUnavailable,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Succeeded => "succeeded",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::TimedOut => "timed_out",
            ExecutionStatus::BackendUnavailable => "backend_unavailable",
        };
        f.write_str(s)
    }
}

/// Which bound expired when a run reports `TimedOut`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutOrigin {
    /// The script itself ran past its limit (local watchdog or sandbox limit)
    Script,
    /// The orchestrator gave up polling the remote sandbox
    PollBudget,
}

/// Normalized outcome of one execution, whichever backend ran it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    status: ExecutionStatus,
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
    #[serde(with = "humantime_serde")]
    duration: Duration,
    backend_used: Backend,
    #[serde(default)]
    timeout_origin: Option<TimeoutOrigin>,
    #[serde(default)]
    error: Option<String>,
}

impl ExecutionResult {
    /// Result of a script that ran to completion.
    ///
    /// Status is derived from the exit code: zero succeeds, anything else fails.
    pub fn exited(
        backend: Backend,
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        duration: Duration,
    ) -> Self {
        let status = if exit_code == 0 {
            ExecutionStatus::Succeeded
        } else {
            ExecutionStatus::Failed
        };
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
            duration,
            backend_used: backend,
            timeout_origin: None,
            error: None,
        }
    }

    /// Result reported by a backend with an explicit status.
    ///
    /// A `Succeeded` status paired with a nonzero exit code is downgraded to
    /// `Failed`.
    pub fn reported(
        backend: Backend,
        status: ExecutionStatus,
        exit_code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        duration: Duration,
    ) -> Self {
        let status = match (status, exit_code) {
            (ExecutionStatus::Succeeded, Some(code)) if code != 0 => ExecutionStatus::Failed,
            (status, _) => status,
        };
        let timeout_origin = (status == ExecutionStatus::TimedOut).then_some(TimeoutOrigin::Script);
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
            duration,
            backend_used: backend,
            timeout_origin,
            error: None,
        }
    }

    /// Run cut short by a timeout
    pub fn timed_out(
        backend: Backend,
        origin: TimeoutOrigin,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            status: ExecutionStatus::TimedOut,
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: None,
            duration,
            backend_used: backend,
            timeout_origin: Some(origin),
            error: None,
        }
    }

    /// Run that never produced an exit status (bad input, missing script, ...)
    pub fn failed(backend: Backend, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            duration,
            backend_used: backend,
            timeout_origin: None,
            error: Some(error.into()),
        }
    }

    /// Remote sandbox could not be reached
    pub fn backend_unavailable(error: impl Into<String>, duration: Duration) -> Self {
        Self {
            status: ExecutionStatus::BackendUnavailable,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            duration,
            backend_used: Backend::Remote,
            timeout_origin: None,
            error: Some(error.into()),
        }
    }

    /// Attach a human readable reason
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub(crate) fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn backend_used(&self) -> Backend {
        self.backend_used
    }

    pub fn timeout_origin(&self) -> Option<TimeoutOrigin> {
        self.timeout_origin
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Check if execution succeeded
    pub fn success(&self) -> bool {
        self.status == ExecutionStatus::Succeeded
    }
}
