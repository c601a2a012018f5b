//! Execution identity, lifecycle and history

use crate::types::{ExecutionRequest, ExecutionResult, ExecutionStatus, LessonId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

/// Unique execution identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub uuid::Uuid);

impl ExecutionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of one request: `Pending -> Dispatched -> Finished`.
///
/// Requests rejected before dispatch (unknown lesson, dead sandbox) go
/// straight from `Pending` to `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPhase {
    Pending,
    Dispatched,
    Finished(ExecutionStatus),
}

impl ExecutionPhase {
    /// Move to `next`, or `None` if the transition is not allowed
    pub fn advance(self, next: ExecutionPhase) -> Option<ExecutionPhase> {
        use ExecutionPhase::*;
        match (self, next) {
            (Pending, Dispatched) | (Pending, Finished(_)) | (Dispatched, Finished(_)) => {
                Some(next)
            }
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionPhase::Finished(_))
    }
}

/// One recorded execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    id: ExecutionId,
    request: ExecutionRequest,
    result: ExecutionResult,
    recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(id: ExecutionId, request: ExecutionRequest, result: ExecutionResult) -> Self {
        Self {
            id,
            request,
            result,
            recorded_at: Utc::now(),
        }
    }

    pub fn id(&self) -> ExecutionId {
        self.id
    }

    pub fn request(&self) -> &ExecutionRequest {
        &self.request
    }

    pub fn result(&self) -> &ExecutionResult {
        &self.result
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// Append-only execution log.
///
/// Appends are serialized by the lock, so entries keep insertion order even
/// when the orchestrator is shared between tasks.
#[derive(Debug, Default)]
pub struct ExecutionHistory {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl ExecutionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, entry: HistoryEntry) {
        self.entries.write().await.push(entry);
    }

    /// Copy of every entry so far
    pub async fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Summarize what has been run so far
    pub async fn progress(&self) -> Progress {
        let entries = self.entries.read().await;
        let mut progress = Progress {
            total_runs: entries.len(),
            ..Progress::default()
        };
        for entry in entries.iter() {
            let status = entry.result.status();
            *progress.by_status.entry(status).or_default() += 1;
            if status == ExecutionStatus::Succeeded {
                progress.completed_lessons.insert(entry.request.lesson().clone());
            }
        }
        progress
    }
}

/// Learning progress derived from the history
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Progress {
    pub total_runs: usize,
    pub by_status: HashMap<ExecutionStatus, usize>,
    /// Lessons that succeeded at least once
    pub completed_lessons: BTreeSet<LessonId>,
}

impl Progress {
    pub fn count(&self, status: ExecutionStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
