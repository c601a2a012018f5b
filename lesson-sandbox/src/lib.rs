//! Lesson execution
//!
//! Runs named lesson scripts either as local child processes or through a
//! remote Judge0-compatible sandbox, normalizes both into one result shape and
//! keeps an in-memory history of every run.

mod config;
mod error;
mod execution;
mod language;
mod orchestrator;
mod resolver;
mod runtime;
mod types;

pub use config::{LessonsConfig, LocalConfig, RemoteConfig, SandboxConfig};
pub use error::{
    ConfigError, OrchestratorError, ResolveError, RunnerError, SandboxError, SandboxResult,
};
pub use execution::{ExecutionHistory, ExecutionId, ExecutionPhase, HistoryEntry, Progress};
pub use language::Language;
pub use orchestrator::Orchestrator;
pub use resolver::{DirectoryResolver, LessonResolver};
pub use runtime::{
    terminate, Judge0Client, LocalRunner, PollOutcome, RemoteSandbox, SandboxLanguage,
    ScriptRunner, Submission, SubmissionHandle,
};
pub use types::{
    Backend, ExecutionRequest, ExecutionResult, ExecutionStatus, LessonId, TimeoutOrigin,
};
