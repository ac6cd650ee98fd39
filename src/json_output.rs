//! # JSON Output Module
//!
//! Output strutturato line-delimited per l'uso programmatico della CLI.
//!
//! ## Tipi di messaggi:
//! - `submitted`: job accettato e registrato
//! - `progress`: progresso corrente di un task
//! - `task_complete`: task arrivato in uno stato terminale
//! - `rejected`: submission rifiutata (validazione o duplicato)
//! - `summary`: statistiche finali del run

use crate::orchestrator::task_registry::{Task, TaskStatus};
use crate::progress::RunStats;
use crate::settings::MediaKind;
use serde::Serialize;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Submitted {
        task_id: String,
        kind: MediaKind,
        output_path: String,
    },

    Progress {
        task_id: String,
        status: TaskStatus,
        progress: f64,
    },

    TaskComplete {
        task_id: String,
        status: TaskStatus,
        message: Option<String>,
        error: Option<String>,
    },

    Rejected {
        task_id: String,
        reason: String,
    },

    Summary {
        #[serde(flatten)]
        stats: RunStats,
        duration_seconds: f64,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn submitted(task: &Task) -> Self {
        Self::Submitted {
            task_id: task.id.clone(),
            kind: task.kind,
            output_path: task.output_path.clone(),
        }
    }

    pub fn progress(task: &Task) -> Self {
        Self::Progress {
            task_id: task.id.clone(),
            status: task.status,
            progress: task.progress,
        }
    }

    /// `message` is the engine's success message, if any
    pub fn task_complete(task: &Task, message: Option<String>) -> Self {
        Self::TaskComplete {
            task_id: task.id.clone(),
            status: task.status,
            message,
            error: task.error.clone(),
        }
    }

    pub fn rejected(task_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            task_id: task_id.into(),
            reason: reason.into(),
        }
    }

    pub fn summary(stats: RunStats, duration_seconds: f64) -> Self {
        Self::Summary {
            stats,
            duration_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejected_shape() {
        let value = serde_json::to_value(JsonMessage::rejected("/a/b.mp4", "Already queued")).unwrap();
        assert_eq!(
            value,
            json!({"type": "rejected", "task_id": "/a/b.mp4", "reason": "Already queued"})
        );
    }

    #[test]
    fn test_summary_flattens_stats() {
        let stats = RunStats {
            submitted: 3,
            completed: 2,
            failed: 1,
            rejected: 0,
        };
        let value = serde_json::to_value(JsonMessage::summary(stats, 1.5)).unwrap();
        assert_eq!(value["type"], "summary");
        assert_eq!(value["completed"], 2);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["duration_seconds"], 1.5);
    }
}
