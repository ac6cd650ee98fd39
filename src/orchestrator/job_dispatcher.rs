//! # Job Dispatcher
//!
//! Punto d'ingresso per la submission dei job di compressione.
//!
//! ## Flusso di `submit`:
//! 1. Valida i settings (errore sincrono, registry intatto)
//! 2. Registra il task (`DuplicateActiveTask` se la chiave è ancora attiva)
//! 3. pending -> compressing
//! 4. Avvia la chiamata al motore in un task tokio separato
//! 5. Successo -> `mark_completed`; errore -> `mark_failed` con il messaggio del motore
//!
//! Una sola invocazione del motore per ogni submission, nessun retry, nessuna
//! cancellazione. Il progresso intermedio arriva indipendentemente dal bridge.

use crate::engine::{self, CompressionEngine, EngineFailure};
use crate::error::CompressError;
use crate::orchestrator::task_registry::{Task, TaskRegistry};
use crate::settings::{MediaKind, MediaSettings};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Terminal result of one job, mirrored into the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed(String),
    Failed(String),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Completed(message) | Self::Failed(message) => message,
        }
    }
}

/// Handle to an accepted job
#[derive(Debug)]
pub struct JobHandle {
    task: Task,
    handle: JoinHandle<JobOutcome>,
}

impl JobHandle {
    pub fn task_id(&self) -> &str {
        &self.task.id
    }

    /// Task record as registered at submission
    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the engine call to settle. The registry is already updated when this returns.
    pub async fn wait(self) -> JobOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => JobOutcome::Failed(format!("Job task failed: {}", e)),
        }
    }
}

/// Validates, registers and dispatches jobs to the engine
#[derive(Clone)]
pub struct JobDispatcher {
    registry: TaskRegistry,
    engine: Arc<dyn CompressionEngine>,
}

impl JobDispatcher {
    pub fn new(registry: TaskRegistry, engine: Arc<dyn CompressionEngine>) -> Self {
        Self { registry, engine }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Submit one job. Returns once the task is registered and the engine call started.
    pub async fn submit(
        &self,
        kind: MediaKind,
        input_path: &str,
        output_path: &str,
        settings: MediaSettings,
    ) -> Result<JobHandle, CompressError> {
        settings.validate_for(kind)?;

        let task = self.registry.create(input_path, kind, input_path, output_path).await?;
        self.registry.mark_dispatched(&task.id).await;
        info!("Queued {} job: {} -> {}", kind, input_path, output_path);

        let registry = self.registry.clone();
        let engine = Arc::clone(&self.engine);
        let key = task.id.clone();
        let input = task.input_path.clone();
        let output = task.output_path.clone();

        let handle = tokio::spawn(async move {
            let result = AssertUnwindSafe(engine::invoke(engine.as_ref(), &input, &output, &settings))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(EngineFailure::new("Compression engine panicked")));

            match result {
                Ok(message) => {
                    registry.mark_completed(&key).await;
                    debug!("Job {} completed: {}", key, message);
                    JobOutcome::Completed(message)
                }
                Err(failure) => {
                    warn!("Job {} failed: {}", key, failure);
                    registry.mark_failed(&key, failure.message()).await;
                    JobOutcome::Failed(failure.0)
                }
            }
        });

        Ok(JobHandle { task, handle })
    }
}
