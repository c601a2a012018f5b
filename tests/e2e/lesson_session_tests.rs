//! A learner session end to end: config file, lesson tree, both backends

#![cfg(unix)]

use anyhow::Result;
use assert_matches::assert_matches;
use lesson_sandbox::{
    Backend, ConfigError, ExecutionStatus, LessonId, Orchestrator, SandboxConfig,
};
use lesson_tests::*;
use std::collections::HashSet;
use std::sync::Arc;
use wiremock::MockServer;

fn write_config(tree: &LessonTree, sandbox_url: &str) -> Result<std::path::PathBuf> {
    let path = tree.root().join("runner.toml");
    let content = format!(
        r#"
default_backend = "remote"

[lessons]
root = "{root}"
default_extension = "sh"

[local]
timeout = "5s"
kill_grace = "100ms"

[remote]
base_url = "{sandbox_url}"
health_timeout = "500ms"
poll_interval = "20ms"
max_wait = "2s"
"#,
        root = tree.root().display(),
    );
    std::fs::write(&path, content)?;
    Ok(path)
}

#[tokio::test]
async fn test_session_from_config_file() -> Result<()> {
    setup_test_logging();
    let server = MockServer::start().await;
    mount_about(&server, 200).await;
    mount_submit(&server, "tok-session", 1).await;
    mount_report(
        &server,
        "tok-session",
        1,
        finished(ACCEPTED, "Accepted", "remote hello\n", Some(0)),
    )
    .await;

    let tree = LessonTree::new()?;
    tree.add("basics", "01_hello.sh", "echo remote hello\n")?;
    tree.add("basics", "02_local.sh", "echo local\n")?;
    tree.add("advanced", "03_broken.sh", "echo oops >&2\nexit 2\n")?;

    let config = SandboxConfig::load(write_config(&tree, &server.uri())?)?;
    assert_eq!(config.default_backend, Backend::Remote);
    let orch = Orchestrator::new(config)?;

    let remote = orch.execute_default("basics", "01_hello").await?;
    let local = orch
        .execute_lesson("basics", "02_local", Backend::Local)
        .await?;
    let broken = orch
        .execute_lesson("advanced", "03_broken", Backend::Local)
        .await?;

    assert!(remote.success());
    assert_eq!(remote.backend_used(), Backend::Remote);
    assert_eq!(local.stdout(), "local\n");
    assert_eq!(broken.status(), ExecutionStatus::Failed);
    assert_eq!(broken.stderr(), "oops\n");

    let history = orch.history().await;
    let lessons: Vec<String> = history.iter().map(|e| e.request().lesson().to_string()).collect();
    assert_eq!(
        lessons,
        ["basics/01_hello", "basics/02_local", "advanced/03_broken"]
    );
    let ids: HashSet<_> = history.iter().map(|e| e.id()).collect();
    assert_eq!(ids.len(), 3);
    assert!(history
        .windows(2)
        .all(|pair| pair[0].recorded_at() <= pair[1].recorded_at()));

    let progress = orch.progress().await;
    assert_eq!(progress.total_runs, 3);
    assert_eq!(progress.count(ExecutionStatus::Succeeded), 2);
    assert_eq!(progress.count(ExecutionStatus::Failed), 1);
    assert!(progress
        .completed_lessons
        .contains(&LessonId::new("basics", "01_hello")));
    assert!(!progress
        .completed_lessons
        .contains(&LessonId::new("advanced", "03_broken")));
    Ok(())
}

#[tokio::test]
async fn test_shared_orchestrator_records_every_run() -> Result<()> {
    let tree = LessonTree::new()?;
    for i in 0..8 {
        tree.add("drills", &format!("d{i}.sh"), &format!("echo {i}\n"))?;
    }
    let orch = Arc::new(Orchestrator::new(tree.config(&unreachable_url()?))?);

    let mut handles = Vec::new();
    for i in 0..8 {
        let orch = orch.clone();
        handles.push(tokio::spawn(async move {
            orch.execute_lesson("drills", &format!("d{i}"), Backend::Local)
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await??.success());
    }

    let history = orch.history().await;
    assert_eq!(history.len(), 8);
    let names: HashSet<_> = history
        .iter()
        .map(|e| e.request().lesson().name.clone())
        .collect();
    assert_eq!(names.len(), 8);
    for entry in &history {
        let expected = entry.request().lesson().name.trim_start_matches('d');
        assert_eq!(entry.result().stdout().trim(), expected);
    }
    Ok(())
}

#[tokio::test]
async fn test_repeated_runs_count_once_as_completed() -> Result<()> {
    let tree = LessonTree::new()?;
    tree.add("basics", "again.sh", "echo again\n")?;
    let orch = Orchestrator::new(tree.config(&unreachable_url()?))?;

    for _ in 0..3 {
        orch.execute_default("basics", "again").await?;
    }
    orch.execute_lesson("basics", "again", Backend::Remote)
        .await?;

    let progress = orch.progress().await;
    assert_eq!(progress.total_runs, 4);
    assert_eq!(progress.completed_lessons.len(), 1);
    assert_eq!(progress.count(ExecutionStatus::BackendUnavailable), 1);
    Ok(())
}

#[test]
fn test_config_errors() -> Result<()> {
    let tree = LessonTree::new()?;

    assert_matches!(
        SandboxConfig::load(tree.root().join("missing.toml")),
        Err(ConfigError::Read { .. })
    );
    assert_matches!(
        SandboxConfig::from_toml_str("[remote]\nbase_url = \"not a url\"\n"),
        Err(ConfigError::InvalidBaseUrl { .. })
    );
    assert_matches!(
        SandboxConfig::from_toml_str("default_backend = \"cloud\"\n"),
        Err(ConfigError::Parse(_))
    );
    Ok(())
}
