//! # Media Compressor Library
//!
//! Orchestrazione dei job di compressione media (video, audio, immagini).
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi principali tramite re-exports per `main.rs` e altri consumatori
//!
//! ## Architettura dei moduli:
//! - `settings`: modello tipizzato dei parametri e risoluzione delle strategie
//! - `orchestrator`: registry dei task, progress bridge e dispatcher dei job
//! - `engine`: confine verso il motore di compressione e implementazione FFmpeg
//! - `config`: gestione configurazione e validazione parametri
//! - `error`: tipi di errore custom
//! - `file_manager` / `platform`: utilità su file e binari esterni
//! - `progress` / `json_output`: feedback della CLI
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use media_compressor::{Config, FfmpegEngine, JobDispatcher, ProgressBridge, TaskRegistry};
//! use media_compressor::settings::{MediaKind, VideoSettings};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), media_compressor::CompressError> {
//! let config = Config::default();
//! let registry = TaskRegistry::new();
//! let bridge = ProgressBridge::start(registry.clone(), config.progress_channel_capacity);
//! let engine = Arc::new(FfmpegEngine::new(&config, bridge.sender()));
//! let dispatcher = JobDispatcher::new(registry.clone(), engine);
//!
//! let job = dispatcher
//!     .submit(MediaKind::Video, "/media/clip.mp4", "/media/clip_compressed.mp4", VideoSettings::default().into())
//!     .await?;
//! println!("{}", job.wait().await.message());
//! bridge.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod utils;

pub mod config;
pub mod engine;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod orchestrator;
pub mod platform;
pub mod progress;
pub mod settings;

pub use config::Config;
pub use engine::{CompressionEngine, EngineFailure, FfmpegEngine};
pub use error::CompressError;
pub use orchestrator::{JobDispatcher, JobHandle, JobOutcome, ProgressBridge, Task, TaskRegistry, TaskStatus};
pub use settings::{MediaKind, MediaSettings, SettingsResolver};
