//! # Task Registry
//!
//! Registro autoritativo dei job: chiave (path di input) -> stato del task.
//!
//! ## Macchina a stati:
//! ```text
//! pending -> compressing -> finishing -> completed
//!                 |              |
//!                 +--------------+----> failed
//! ```
//! - `finishing` compare solo quando il progresso arriva a 100 prima che il motore
//!   abbia risposto; il completamento vero arriva esclusivamente da `mark_completed`
//! - gli stati terminali (`completed`, `failed`) non accettano altre transizioni
//! - una nuova submission della stessa chiave dopo uno stato terminale sovrascrive
//!   il record (stessa identità, ciclo di vita nuovo)
//!
//! ## Concorrenza:
//! Tutte le mutazioni passano da un unico `Mutex`, condiviso tra dispatcher e
//! progress bridge tramite `Clone` del registry.

use crate::error::CompressError;
use crate::settings::MediaKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Mutex;
use tracing::debug;

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Compressing,
    Finishing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Compressing => "compressing",
            Self::Finishing => "finishing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One compression job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: String,
    pub input_path: String,
    pub output_path: String,
    pub kind: MediaKind,
    pub status: TaskStatus,
    /// Percentage 0-100
    pub progress: f64,
    /// Engine message, only set when `status` is `Failed`
    pub error: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(skip)]
    sequence: u64,
}

impl Task {
    fn new(key: String, kind: MediaKind, input_path: String, output_path: String, sequence: u64) -> Self {
        let now = unix_now();
        Self {
            id: key,
            input_path,
            output_path,
            kind,
            status: TaskStatus::Pending,
            progress: 0.0,
            error: None,
            created_at: now,
            updated_at: now,
            sequence,
        }
    }

    fn touch(&mut self) {
        self.updated_at = unix_now();
    }
}

/// Result of reconciling one progress event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressOutcome {
    /// Progress stored, task now in the given status
    Applied(TaskStatus),
    /// No live task for the key, event dropped
    Stale,
}

#[derive(Debug, Default)]
struct RegistryState {
    tasks: HashMap<String, Task>,
    next_sequence: u64,
}

/// Shared, mutex-guarded task registry
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new `pending` task.
    ///
    /// Fails with `DuplicateActiveTask` while a task for `key` is still live.
    /// A terminal record for the same key is replaced.
    pub async fn create(
        &self,
        key: &str,
        kind: MediaKind,
        input_path: &str,
        output_path: &str,
    ) -> Result<Task, CompressError> {
        let mut state = self.state.lock().await;

        if let Some(existing) = state.tasks.get(key) {
            if !existing.status.is_terminal() {
                debug!("Rejecting duplicate task {} (status: {})", key, existing.status);
                return Err(CompressError::DuplicateActiveTask { key: key.to_string() });
            }
            debug!("Resubmitting {} after {}", key, existing.status);
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;

        let task = Task::new(
            key.to_string(),
            kind,
            input_path.to_string(),
            output_path.to_string(),
            sequence,
        );
        state.tasks.insert(key.to_string(), task.clone());
        Ok(task)
    }

    /// pending -> compressing; anything else is left alone
    pub async fn mark_dispatched(&self, key: &str) -> bool {
        let mut state = self.state.lock().await;
        match state.tasks.get_mut(key) {
            Some(task) if task.status == TaskStatus::Pending => {
                task.status = TaskStatus::Compressing;
                task.touch();
                true
            }
            _ => {
                debug!("Ignoring dispatch for {}: no pending task", key);
                false
            }
        }
    }

    /// Store a progress value reported by the engine.
    ///
    /// Values are clamped to 0-100 and non-finite values are dropped. Monotonicity is
    /// not enforced: a lower value after a higher one is stored as received.
    pub async fn apply_progress(&self, key: &str, progress: f64) -> ProgressOutcome {
        if !progress.is_finite() {
            debug!("Dropping non-finite progress for {}", key);
            return ProgressOutcome::Stale;
        }

        let mut state = self.state.lock().await;
        match state.tasks.get_mut(key) {
            Some(task) if !task.status.is_terminal() => {
                let progress = progress.clamp(0.0, 100.0);
                task.progress = progress;
                task.status = if progress >= 100.0 {
                    TaskStatus::Finishing
                } else {
                    TaskStatus::Compressing
                };
                task.touch();
                ProgressOutcome::Applied(task.status)
            }
            Some(task) => {
                debug!("Dropping stale progress {:.1}% for {} ({})", progress, key, task.status);
                ProgressOutcome::Stale
            }
            None => {
                debug!("Dropping progress {:.1}% for unknown task {}", progress, key);
                ProgressOutcome::Stale
            }
        }
    }

    /// Any live status -> completed, with progress forced to 100
    pub async fn mark_completed(&self, key: &str) -> bool {
        let mut state = self.state.lock().await;
        match state.tasks.get_mut(key) {
            Some(task) if !task.status.is_terminal() => {
                task.status = TaskStatus::Completed;
                task.progress = 100.0;
                task.error = None;
                task.touch();
                true
            }
            _ => {
                debug!("Ignoring completion for {}: no live task", key);
                false
            }
        }
    }

    /// Any live status -> failed; progress keeps its last value
    pub async fn mark_failed(&self, key: &str, message: &str) -> bool {
        let mut state = self.state.lock().await;
        match state.tasks.get_mut(key) {
            Some(task) if !task.status.is_terminal() => {
                task.status = TaskStatus::Failed;
                task.error = Some(message.to_string());
                task.touch();
                true
            }
            _ => {
                debug!("Ignoring failure for {}: no live task", key);
                false
            }
        }
    }

    pub async fn get(&self, key: &str) -> Option<Task> {
        self.state.lock().await.tasks.get(key).cloned()
    }

    /// All tasks in submission order
    pub async fn snapshot(&self) -> Vec<Task> {
        let state = self.state.lock().await;
        let mut tasks: Vec<Task> = state.tasks.values().cloned().collect();
        tasks.sort_by_key(|task| task.sequence);
        tasks
    }

    /// Number of tasks not yet in a terminal state
    pub async fn active_count(&self) -> usize {
        self.state
            .lock()
            .await
            .tasks
            .values()
            .filter(|task| !task.status.is_terminal())
            .count()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    const KEY: &str = "/a/b.mp4";

    async fn registry_with_task() -> TaskRegistry {
        let registry = TaskRegistry::new();
        assert_ok!(registry.create(KEY, MediaKind::Video, KEY, "/a/b_compressed.mp4").await);
        registry
    }

    #[tokio::test]
    async fn test_create_starts_pending() {
        let registry = registry_with_task().await;
        let task = registry.get(KEY).await.unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0.0);
        assert_eq!(task.error, None);
        assert_eq!(task.kind, MediaKind::Video);
    }

    #[tokio::test]
    async fn test_duplicate_while_pending_or_compressing() {
        let registry = registry_with_task().await;

        let err = assert_err!(registry.create(KEY, MediaKind::Video, KEY, "/other.mp4").await);
        assert!(matches!(err, CompressError::DuplicateActiveTask { ref key } if key == KEY));

        registry.mark_dispatched(KEY).await;
        assert_err!(registry.create(KEY, MediaKind::Video, KEY, "/other.mp4").await);

        assert_eq!(registry.len().await, 1);
        let task = registry.get(KEY).await.unwrap();
        assert_eq!(task.output_path, "/a/b_compressed.mp4");
    }

    #[tokio::test]
    async fn test_duplicate_while_finishing() {
        let registry = registry_with_task().await;
        registry.mark_dispatched(KEY).await;
        registry.apply_progress(KEY, 100.0).await;
        assert_err!(registry.create(KEY, MediaKind::Video, KEY, "/other.mp4").await);
    }

    #[tokio::test]
    async fn test_progress_transitions() {
        let registry = registry_with_task().await;
        assert!(registry.mark_dispatched(KEY).await);

        assert_eq!(
            registry.apply_progress(KEY, 30.0).await,
            ProgressOutcome::Applied(TaskStatus::Compressing)
        );
        assert_eq!(
            registry.apply_progress(KEY, 100.0).await,
            ProgressOutcome::Applied(TaskStatus::Finishing)
        );

        let task = registry.get(KEY).await.unwrap();
        assert_eq!(task.status, TaskStatus::Finishing);
        assert_eq!(task.progress, 100.0);
    }

    #[tokio::test]
    async fn test_progress_is_not_forced_monotonic() {
        let registry = registry_with_task().await;
        registry.mark_dispatched(KEY).await;
        registry.apply_progress(KEY, 70.0).await;
        registry.apply_progress(KEY, 40.0).await;
        assert_eq!(registry.get(KEY).await.unwrap().progress, 40.0);
    }

    #[tokio::test]
    async fn test_progress_for_unknown_task_is_dropped() {
        let registry = TaskRegistry::new();
        assert_eq!(registry.apply_progress("/missing.mp4", 50.0).await, ProgressOutcome::Stale);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_progress_after_terminal_is_dropped() {
        let registry = registry_with_task().await;
        registry.mark_dispatched(KEY).await;
        registry.mark_completed(KEY).await;

        assert_eq!(registry.apply_progress(KEY, 10.0).await, ProgressOutcome::Stale);
        let task = registry.get(KEY).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100.0);
    }

    #[tokio::test]
    async fn test_non_finite_progress_is_dropped() {
        let registry = registry_with_task().await;
        registry.mark_dispatched(KEY).await;
        registry.apply_progress(KEY, 20.0).await;
        assert_eq!(registry.apply_progress(KEY, f64::NAN).await, ProgressOutcome::Stale);
        assert_eq!(registry.get(KEY).await.unwrap().progress, 20.0);
    }

    #[tokio::test]
    async fn test_completion_forces_full_progress() {
        let registry = registry_with_task().await;
        registry.mark_dispatched(KEY).await;
        registry.apply_progress(KEY, 35.0).await;

        assert!(registry.mark_completed(KEY).await);
        let task = registry.get(KEY).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100.0);
        assert_eq!(task.error, None);
    }

    #[tokio::test]
    async fn test_failure_keeps_progress_and_message() {
        let registry = registry_with_task().await;
        registry.mark_dispatched(KEY).await;
        registry.apply_progress(KEY, 42.0).await;

        let message = "x".repeat(10_000);
        assert!(registry.mark_failed(KEY, &message).await);
        let task = registry.get(KEY).await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some(message.as_str()));
        assert_eq!(task.progress, 42.0);
    }

    #[tokio::test]
    async fn test_terminal_states_accept_no_transitions() {
        let registry = registry_with_task().await;
        registry.mark_dispatched(KEY).await;
        registry.mark_failed(KEY, "boom").await;

        assert!(!registry.mark_completed(KEY).await);
        assert!(!registry.mark_dispatched(KEY).await);
        assert!(!registry.mark_failed(KEY, "again").await);

        let task = registry.get(KEY).await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_resubmission_after_terminal_overwrites() {
        let registry = registry_with_task().await;
        registry.mark_dispatched(KEY).await;
        registry.apply_progress(KEY, 60.0).await;
        registry.mark_failed(KEY, "ffmpeg error").await;

        let task = assert_ok!(registry.create(KEY, MediaKind::Video, KEY, "/a/retry.mp4").await);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0.0);
        assert_eq!(task.error, None);
        assert_eq!(task.output_path, "/a/retry.mp4");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_mark_dispatched_on_missing_task_is_noop() {
        let registry = TaskRegistry::new();
        assert!(!registry.mark_dispatched("/nowhere").await);
        assert!(!registry.mark_completed("/nowhere").await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_snapshot_keeps_submission_order() {
        let registry = TaskRegistry::new();
        for key in ["/c.mp4", "/a.mp3", "/b.png"] {
            registry.create(key, MediaKind::Video, key, "/out").await.unwrap();
        }
        let keys: Vec<String> = registry.snapshot().await.into_iter().map(|t| t.id).collect();
        assert_eq!(keys, vec!["/c.mp4", "/a.mp3", "/b.png"]);
        assert_eq!(registry.active_count().await, 3);
    }

    #[tokio::test]
    async fn test_concurrent_creates_admit_one() {
        let registry = TaskRegistry::new();
        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.create(KEY, MediaKind::Video, KEY, "/out").await.is_ok() })
            })
            .collect();

        let mut admitted = 0;
        for attempt in attempts {
            if attempt.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_progress_racing_completion_ends_completed() {
        for round in 0..64 {
            let registry = registry_with_task().await;
            registry.mark_dispatched(KEY).await;

            let progress = {
                let registry = registry.clone();
                tokio::spawn(async move {
                    for value in [10.0, 45.0, 80.0, 100.0, 60.0] {
                        registry.apply_progress(KEY, value).await;
                        tokio::task::yield_now().await;
                    }
                })
            };
            let completion = {
                let registry = registry.clone();
                tokio::spawn(async move {
                    if round % 2 == 0 {
                        tokio::task::yield_now().await;
                    }
                    registry.mark_completed(KEY).await
                })
            };

            progress.await.unwrap();
            assert!(completion.await.unwrap());

            let task = registry.get(KEY).await.unwrap();
            assert_eq!(task.status, TaskStatus::Completed, "round {}", round);
            assert_eq!(task.progress, 100.0, "round {}", round);
            assert_eq!(task.error, None);
        }
    }
}
