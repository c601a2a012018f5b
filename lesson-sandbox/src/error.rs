use std::path::PathBuf;
use thiserror::Error;

/// Errors from the remote sandbox client
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Invalid submission: {0}")]
    InvalidInput(String),

    #[error("Sandbox service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Unexpected sandbox response ({status}): {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("Failed to decode sandbox response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SandboxError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SandboxError::Decode(e.to_string())
        } else {
            // connect, timeout, request and body errors all mean the service
            // could not answer
            SandboxError::ServiceUnavailable(e.to_string())
        }
    }
}

/// Errors from the local runner
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Script not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to spawn {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Process I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// The lesson itself cannot run (missing file, missing interpreter, not
    /// executable), as opposed to the host failing
    pub fn is_lesson_fault(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Spawn { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ),
            Self::Io(_) => false,
        }
    }
}

/// Errors from lesson path resolution
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Lesson not found: {category}/{name}")]
    LessonNotFound { category: String, name: String },

    #[error("Invalid lesson identifier: {0}")]
    InvalidLessonId(String),
}

/// Errors while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid sandbox base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Hard failures of the orchestrator.
///
/// Everything a student can cause (bad lesson name, failing script, dead
/// sandbox) is reported inside `ExecutionResult`; only these escape as `Err`.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Runner(#[from] RunnerError),
}

pub type SandboxResult<T> = Result<T, SandboxError>;
