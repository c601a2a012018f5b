//! Lesson orchestrator - main entry point

use crate::config::SandboxConfig;
use crate::error::{OrchestratorError, SandboxError, SandboxResult};
use crate::execution::{ExecutionHistory, ExecutionId, ExecutionPhase, HistoryEntry, Progress};
use crate::language::Language;
use crate::resolver::{DirectoryResolver, LessonResolver};
use crate::runtime::{
    Judge0Client, LocalRunner, PollOutcome, RemoteSandbox, ScriptRunner, Submission,
    SubmissionHandle,
};
use crate::types::{Backend, ExecutionRequest, ExecutionResult, LessonId, TimeoutOrigin};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Resolves lessons, dispatches them to a backend and records every run.
///
/// Dispatch is single-shot: nothing is retried. A caller that wants another
/// attempt issues a new request.
pub struct Orchestrator {
    config: SandboxConfig,
    resolver: Arc<dyn LessonResolver>,
    local: Arc<dyn ScriptRunner>,
    remote: Arc<dyn RemoteSandbox>,
    history: ExecutionHistory,
}

impl Orchestrator {
    /// Create an orchestrator with the directory resolver, local runner and
    /// Judge0 client described by `config`
    pub fn new(config: SandboxConfig) -> SandboxResult<Self> {
        let resolver = DirectoryResolver::from_config(&config.lessons);
        let local = LocalRunner::new(config.local.clone());
        let remote = Judge0Client::new(&config.remote)?;
        Ok(Self::from_parts(
            config,
            Arc::new(resolver),
            Arc::new(local),
            Arc::new(remote),
        ))
    }

    /// Create an orchestrator from explicit collaborators
    pub fn from_parts(
        config: SandboxConfig,
        resolver: Arc<dyn LessonResolver>,
        local: Arc<dyn ScriptRunner>,
        remote: Arc<dyn RemoteSandbox>,
    ) -> Self {
        Self {
            config,
            resolver,
            local,
            remote,
            history: ExecutionHistory::new(),
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Run a lesson on the given backend
    pub async fn execute_lesson(
        &self,
        category: &str,
        name: &str,
        backend: Backend,
    ) -> Result<ExecutionResult, OrchestratorError> {
        self.execute(ExecutionRequest::new(LessonId::new(category, name), backend))
            .await
    }

    /// Run a lesson on the configured default backend
    pub async fn execute_default(
        &self,
        category: &str,
        name: &str,
    ) -> Result<ExecutionResult, OrchestratorError> {
        self.execute_lesson(category, name, self.config.default_backend)
            .await
    }

    /// Run a request and append it to the history.
    ///
    /// Exactly one history entry is appended per call, including runs that
    /// never reached a backend and hard failures returned as `Err`.
    pub async fn execute(
        &self,
        request: ExecutionRequest,
    ) -> Result<ExecutionResult, OrchestratorError> {
        let id = ExecutionId::new();
        let start = Instant::now();

        tracing::info!(
            execution_id = %id,
            lesson = %request.lesson(),
            backend = %request.backend(),
            "Executing lesson"
        );

        let mut phase = ExecutionPhase::Pending;
        let outcome = self.dispatch(id, &request, &mut phase, start).await;

        let result = match &outcome {
            Ok(result) => result.clone(),
            Err(e) => ExecutionResult::failed(request.backend(), e.to_string(), start.elapsed()),
        };
        self.transition(id, &mut phase, ExecutionPhase::Finished(result.status()));

        tracing::info!(
            execution_id = %id,
            status = %result.status(),
            exit_code = result.exit_code(),
            duration_ms = result.duration().as_millis() as u64,
            "Lesson finished"
        );

        self.history
            .append(HistoryEntry::new(id, request, result))
            .await;
        outcome
    }

    /// Snapshot of every execution so far, oldest first
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.snapshot().await
    }

    /// Progress summary over the history
    pub async fn progress(&self) -> Progress {
        self.history.progress().await
    }

    async fn dispatch(
        &self,
        id: ExecutionId,
        request: &ExecutionRequest,
        phase: &mut ExecutionPhase,
        start: Instant,
    ) -> Result<ExecutionResult, OrchestratorError> {
        let lesson = request.lesson();
        let script = match self.resolver.resolve(&lesson.category, &lesson.name) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(execution_id = %id, error = %e, "Lesson resolution failed");
                return Ok(ExecutionResult::failed(
                    request.backend(),
                    e.to_string(),
                    start.elapsed(),
                ));
            }
        };

        match request.backend() {
            Backend::Local => {
                self.transition(id, phase, ExecutionPhase::Dispatched);
                self.run_local(&script, request, start).await
            }
            Backend::Remote => Ok(self.run_remote(id, &script, request, phase, start).await),
        }
    }

    async fn run_local(
        &self,
        script: &Path,
        request: &ExecutionRequest,
        start: Instant,
    ) -> Result<ExecutionResult, OrchestratorError> {
        let timeout = request.timeout().unwrap_or(self.config.local.timeout);
        match self.local.run(script, timeout, request.stdin()).await {
            Ok(result) => Ok(result),
            Err(e) if e.is_lesson_fault() => {
                tracing::warn!(script = %script.display(), error = %e, "Lesson could not be started");
                Ok(ExecutionResult::failed(
                    Backend::Local,
                    e.to_string(),
                    start.elapsed(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn run_remote(
        &self,
        id: ExecutionId,
        script: &Path,
        request: &ExecutionRequest,
        phase: &mut ExecutionPhase,
        start: Instant,
    ) -> ExecutionResult {
        if !self.remote.health_check().await {
            tracing::warn!(
                execution_id = %id,
                sandbox = self.remote.name(),
                "Sandbox health check failed, not submitting"
            );
            return ExecutionResult::backend_unavailable(
                format!("{} sandbox failed its health check", self.remote.name()),
                start.elapsed(),
            );
        }

        let submission = match self.submission_for(script, request).await {
            Ok(submission) => submission,
            Err(reason) => return ExecutionResult::failed(Backend::Remote, reason, start.elapsed()),
        };

        self.transition(id, phase, ExecutionPhase::Dispatched);
        let handle = match self.remote.submit(&submission).await {
            Ok(handle) => handle,
            Err(e) => return remote_failure(e, start),
        };

        let budget = match request.timeout() {
            // one extra interval so the sandbox's own time-limit verdict can arrive
            Some(timeout) => timeout + self.config.remote.poll_interval,
            None => self.config.remote.max_wait,
        };
        self.await_completion(id, handle, budget, start).await
    }

    async fn submission_for(
        &self,
        script: &Path,
        request: &ExecutionRequest,
    ) -> Result<Submission, String> {
        let language = Language::from_path(script)
            .ok_or_else(|| format!("Unsupported script type: {}", script.display()))?;
        let source = tokio::fs::read_to_string(script)
            .await
            .map_err(|e| format!("Failed to read {}: {}", script.display(), e))?;

        let mut submission = Submission::new(source, language.id());
        if let Some(stdin) = request.stdin() {
            submission = submission.with_stdin(stdin);
        }
        if let Some(timeout) = request.timeout() {
            submission = submission.with_wall_time_limit(timeout);
        }
        Ok(submission)
    }

    /// Poll until the submission finishes or `budget` runs out.
    ///
    /// The handle is owned by this loop and dropped on every exit path.
    async fn await_completion(
        &self,
        id: ExecutionId,
        handle: SubmissionHandle,
        budget: Duration,
        start: Instant,
    ) -> ExecutionResult {
        let deadline = Instant::now() + budget;
        let interval = self.config.remote.poll_interval;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, self.remote.poll(&handle)).await {
                Ok(Ok(PollOutcome::Complete(result))) => {
                    return result.with_duration(start.elapsed())
                }
                Ok(Ok(PollOutcome::Pending)) => {
                    tracing::debug!(execution_id = %id, token = handle.token(), "Submission pending");
                }
                Ok(Err(e)) => return remote_failure(e, start),
                Err(_) => return budget_exhausted(id, &handle, budget, start),
            }

            let now = Instant::now();
            if now >= deadline {
                return budget_exhausted(id, &handle, budget, start);
            }
            tokio::time::sleep(interval.min(deadline - now)).await;
        }
    }

    fn transition(&self, id: ExecutionId, phase: &mut ExecutionPhase, next: ExecutionPhase) {
        match phase.advance(next) {
            Some(advanced) => {
                tracing::debug!(execution_id = %id, from = ?phase, to = ?advanced, "Phase change");
                *phase = advanced;
            }
            None => {
                tracing::error!(execution_id = %id, from = ?phase, to = ?next, "Illegal phase change");
            }
        }
    }
}

/// A poll in flight when the deadline passes is abandoned
fn budget_exhausted(
    id: ExecutionId,
    handle: &SubmissionHandle,
    budget: Duration,
    start: Instant,
) -> ExecutionResult {
    tracing::warn!(
        execution_id = %id,
        token = handle.token(),
        budget_ms = budget.as_millis() as u64,
        "Gave up polling sandbox"
    );
    ExecutionResult::timed_out(
        Backend::Remote,
        TimeoutOrigin::PollBudget,
        "",
        "",
        start.elapsed(),
    )
    .with_error(format!("No result from sandbox within {:?}", budget))
}

fn remote_failure(error: SandboxError, start: Instant) -> ExecutionResult {
    match error {
        SandboxError::ServiceUnavailable(_) => {
            ExecutionResult::backend_unavailable(error.to_string(), start.elapsed())
        }
        other => ExecutionResult::failed(Backend::Remote, other.to_string(), start.elapsed()),
    }
}
