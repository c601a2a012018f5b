//! Process-based runner

use crate::config::LocalConfig;
use crate::error::RunnerError;
use crate::language::Language;
use crate::types::{Backend, ExecutionResult, TimeoutOrigin};
use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Runs lesson scripts as child processes
pub struct LocalRunner {
    config: LocalConfig,
}

impl LocalRunner {
    pub fn new(config: LocalConfig) -> Self {
        Self { config }
    }

    fn command(&self, script: &Path, with_stdin: bool) -> Command {
        let language = Language::from_path(script);
        let mut cmd = match self.config.interpreter(language) {
            Some(interpreter) => {
                let mut cmd = Command::new(interpreter);
                cmd.arg(script);
                cmd
            }
            None => Command::new(script),
        };

        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if with_stdin {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);
        // Own process group, so a timeout reaches everything the lesson started
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

impl Default for LocalRunner {
    fn default() -> Self {
        Self::new(LocalConfig::default())
    }
}

#[async_trait]
impl super::ScriptRunner for LocalRunner {
    async fn run(
        &self,
        script: &Path,
        timeout: Duration,
        stdin: Option<&str>,
    ) -> Result<ExecutionResult, RunnerError> {
        // Absolute path so a configured working_dir cannot change what runs
        let script = match tokio::fs::canonicalize(script).await {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RunnerError::NotFound(script.to_path_buf()))
            }
            Err(e) => return Err(RunnerError::Io(e)),
        };

        let start = Instant::now();
        let mut child = self
            .command(&script, stdin.is_some())
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                path: script.clone(),
                source,
            })?;

        tracing::debug!(
            script = %script.display(),
            pid = child.id(),
            timeout_ms = timeout.as_millis() as u64,
            "Spawned lesson process"
        );

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            let input = input.to_owned();
            tokio::spawn(async move {
                // Dropping the pipe afterwards closes the child's stdin
                let _ = pipe.write_all(input.as_bytes()).await;
            });
        }

        let stdout = Capture::spawn(child.stdout.take());
        let stderr = Capture::spawn(child.stderr.take());

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => Some(status?),
            Err(_) => {
                if let Err(e) = terminate(&mut child).await {
                    tracing::warn!(error = %e, "Failed to kill timed-out lesson process");
                }
                None
            }
        };

        // Grandchildren can hold the pipes open after the child is gone
        let drain = match status {
            Some(_) => timeout.saturating_sub(start.elapsed()) + self.config.kill_grace,
            None => self.config.kill_grace,
        };
        let stdout = stdout.finish(drain).await;
        let stderr = stderr.finish(drain).await;
        let duration = start.elapsed();

        match status {
            Some(status) => Ok(ExecutionResult::exited(
                Backend::Local,
                exit_code(status),
                stdout,
                stderr,
                duration,
            )),
            None => {
                tracing::warn!(
                    script = %script.display(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Lesson process timed out"
                );
                Ok(ExecutionResult::timed_out(
                    Backend::Local,
                    TimeoutOrigin::Script,
                    stdout,
                    stderr,
                    duration,
                )
                .with_error(format!("Execution timed out after {:?}", timeout)))
            }
        }
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Kill and reap a child process along with its process group.
///
/// Killing a child that has already exited is a no-op.
pub async fn terminate(child: &mut Child) -> std::io::Result<()> {
    if child.try_wait()?.is_some() {
        return Ok(());
    }
    // Unreaped, so the pid still names the group the child leads
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        kill_group(pid)?;
    }
    match child.kill().await {
        Ok(()) => Ok(()),
        // Exited between try_wait and kill
        Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn kill_group(pid: u32) -> std::io::Result<()> {
    let pgid = libc::pid_t::try_from(pid)
        .map_err(|_| std::io::Error::from(std::io::ErrorKind::InvalidInput))?;
    // SAFETY: killpg only sends a signal and touches no memory
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        // Child was not started by LocalRunner and leads no group
        Some(libc::ESRCH) => Ok(()),
        _ => Err(err),
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Output pipe collected in the background; partial output survives a kill
struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl Capture {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = buffer.clone();
        let task = tokio::spawn(async move {
            let Some(mut pipe) = pipe else { return };
            let mut chunk = [0u8; 4096];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => sink.lock().await.extend_from_slice(&chunk[..n]),
                }
            }
        });
        Self { buffer, task }
    }

    async fn finish(self, drain: Duration) -> String {
        let abort = self.task.abort_handle();
        if tokio::time::timeout(drain, self.task).await.is_err() {
            abort.abort();
        }
        let bytes = self.buffer.lock().await;
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
