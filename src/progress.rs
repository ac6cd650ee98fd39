//! # Progress Reporting and Statistics Module
//!
//! Feedback visivo della CLI e statistiche di fine esecuzione.
//!
//! ## Componenti principali:
//! - `ProgressManager`: progress bar `indicatif` che aggrega il progresso di tutti
//!   i task del registry (ogni task vale 100 unità)
//! - `RunStats`: conteggio di job completati, falliti e rifiutati
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:42] [=========>------------------------------] 2/3 jobs (24%) clip.mp4 compressing
//! ```

use crate::orchestrator::task_registry::{Task, TaskStatus};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Manages the progress bar for a run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
    total_jobs: u64,
}

impl ProgressManager {
    pub fn new(total_jobs: u64) -> Self {
        let bar = ProgressBar::new(total_jobs.max(1) * 100);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {prefix} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar, total_jobs }
    }

    /// Redraw from a registry snapshot
    pub fn update(&self, tasks: &[Task]) {
        let position: f64 = tasks.iter().map(|t| t.progress).sum();
        let done = tasks.iter().filter(|t| t.status.is_terminal()).count();

        self.bar.set_position(position.round() as u64);
        self.bar.set_prefix(format!("{}/{} jobs", done, self.total_jobs));

        let current = tasks
            .iter()
            .filter(|t| !t.status.is_terminal())
            .max_by_key(|t| t.updated_at);
        if let Some(task) = current {
            self.bar.set_message(format!("{} {}", display_name(&task.input_path), task.status));
        }
    }

    /// Print a line above the bar
    pub fn println(&self, message: &str) {
        self.bar.println(message);
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Outcome counters for a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub submitted: usize,
    pub completed: usize,
    pub failed: usize,
    pub rejected: usize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_submitted(&mut self) {
        self.submitted += 1;
    }

    pub fn add_rejected(&mut self) {
        self.rejected += 1;
    }

    /// Count a finished task by its terminal status
    pub fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Failed => self.failed += 1,
            _ => {}
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.rejected > 0
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Submitted: {} | Completed: {} | Failed: {} | Rejected: {}",
            self.submitted, self.completed, self.failed, self.rejected
        )
    }
}
