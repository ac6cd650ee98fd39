//! # Orchestrator Module
//!
//! Coordinamento dei job di compressione:
//! - `task_registry`: registro autoritativo dei task e macchina a stati
//! - `progress_bridge`: riconciliazione degli eventi di progresso del motore
//! - `job_dispatcher`: validazione, deduplica e avvio dei job
//! - `path_resolver`: calcolo dei path di output derivati

pub mod job_dispatcher;
pub mod path_resolver;
pub mod progress_bridge;
pub mod task_registry;

pub use job_dispatcher::{JobDispatcher, JobHandle, JobOutcome};
pub use path_resolver::PathResolver;
pub use progress_bridge::{ProgressBridge, ProgressEvent, ProgressSender};
pub use task_registry::{Task, TaskRegistry, TaskStatus};
