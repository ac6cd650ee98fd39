//! # Progress Bridge
//!
//! Collega il canale asincrono degli eventi di progresso del motore al registry.
//!
//! ## Ciclo di vita:
//! - `start()`: apre il canale e avvia il task di riconciliazione (una sola volta
//!   per la vita del registry)
//! - `sender()`: handle clonabile passato al motore di compressione
//! - `shutdown()`: chiude il canale, applica gli eventi ancora in coda e termina
//!
//! Ogni evento è indipendente: eventi per task sconosciuti o già terminati vengono
//! scartati dal registry senza errori.

use crate::orchestrator::task_registry::{ProgressOutcome, TaskRegistry};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Event name used by the engine for progress notifications
pub const PROGRESS_EVENT: &str = "PROGRESS_EVENT";

/// Progress notification pushed by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub task_id: String,
    pub progress: f64,
}

impl ProgressEvent {
    pub fn new(task_id: impl Into<String>, progress: f64) -> Self {
        Self {
            task_id: task_id.into(),
            progress,
        }
    }
}

/// Cloneable handle engines use to publish progress
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ProgressSender {
    /// Publish an event, waiting for channel capacity.
    ///
    /// Returns `false` once the bridge has shut down.
    pub async fn emit(&self, task_id: &str, progress: f64) -> bool {
        self.tx.send(ProgressEvent::new(task_id, progress)).await.is_ok()
    }

    /// Publish without waiting; the event is lost if the channel is full
    pub fn try_emit(&self, task_id: &str, progress: f64) -> bool {
        match self.tx.try_send(ProgressEvent::new(task_id, progress)) {
            Ok(()) => true,
            Err(e) => {
                debug!("Progress event for {} not delivered: {}", task_id, e);
                false
            }
        }
    }
}

/// Counters reported when the bridge shuts down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub applied: usize,
    pub dropped: usize,
}

/// Scoped subscription to the progress channel
pub struct ProgressBridge {
    sender: ProgressSender,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<BridgeStats>>,
}

impl ProgressBridge {
    /// Subscribe to progress events and start reconciling them into `registry`
    pub fn start(registry: TaskRegistry, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(Self::run(registry, rx, shutdown_rx));
        debug!("Progress bridge listening for {} (capacity {})", PROGRESS_EVENT, capacity.max(1));

        Self {
            sender: ProgressSender { tx },
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn sender(&self) -> ProgressSender {
        self.sender.clone()
    }

    /// Stop listening. Events already queued are applied before returning.
    pub async fn shutdown(mut self) -> BridgeStats {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(stats) => {
                    debug!(
                        "Progress bridge stopped ({} applied, {} dropped)",
                        stats.applied, stats.dropped
                    );
                    stats
                }
                Err(e) => {
                    error!("Progress bridge task failed: {}", e);
                    BridgeStats::default()
                }
            },
            None => BridgeStats::default(),
        }
    }

    async fn run(
        registry: TaskRegistry,
        mut rx: mpsc::Receiver<ProgressEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> BridgeStats {
        let mut stats = BridgeStats::default();

        loop {
            tokio::select! {
                biased;
                event = rx.recv() => match event {
                    Some(event) => Self::reconcile(&registry, event, &mut stats).await,
                    None => break,
                },
                _ = &mut shutdown => {
                    rx.close();
                    while let Some(event) = rx.recv().await {
                        Self::reconcile(&registry, event, &mut stats).await;
                    }
                    break;
                }
            }
        }

        stats
    }

    async fn reconcile(registry: &TaskRegistry, event: ProgressEvent, stats: &mut BridgeStats) {
        match registry.apply_progress(&event.task_id, event.progress).await {
            ProgressOutcome::Applied(_) => stats.applied += 1,
            ProgressOutcome::Stale => stats.dropped += 1,
        }
    }
}

impl Drop for ProgressBridge {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
