//! # Media Compressor - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Risoluzione dei settings (config + flag CLI) e submission dei job
//! - Feedback durante l'esecuzione (progress bar o JSON) e riepilogo finale
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI e carica la configurazione
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose, `RUST_LOG` vince)
//! 3. Applica strategia e override ai settings di default
//! 4. Verifica ffmpeg/ffprobe, avvia il progress bridge e sottomette un job per input
//! 5. Aggiorna il feedback finché tutti i job sono terminati
//! 6. Stampa le statistiche; exit code non zero se qualche job è fallito
//!
//! ## Esempio di utilizzo:
//! ```bash
//! media-compressor video clip.mp4 --strategy cbr --bitrate 2500 --verbose
//! media-compressor image a.jpg b.png --quality 60 --json
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use media_compressor::file_manager::FileManager;
use media_compressor::json_output::JsonMessage;
use media_compressor::orchestrator::PathResolver;
use media_compressor::progress::{ProgressManager, RunStats};
use media_compressor::settings::{MediaKind, SettingsResolver, StrategyTag};
use media_compressor::{
    Config, FfmpegEngine, JobDispatcher, JobOutcome, ProgressBridge, Task, TaskRegistry, TaskStatus,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "media-compressor")]
#[command(about = "Compress videos, audio and images with ffmpeg")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output progress and results as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compress one or more videos
    Video {
        #[command(flatten)]
        io: IoArgs,

        /// Strategy: small, balanced, high, vbr, cbr, scale, size
        #[arg(short, long)]
        strategy: Option<String>,

        /// Enable resolution / CRF / audio quality overrides
        #[arg(long)]
        custom: bool,

        /// Output resolution: original, 480p, 720p, 1080p
        #[arg(long)]
        resolution: Option<String>,

        /// CRF value (0-51, lower = better quality)
        #[arg(long)]
        crf: Option<String>,

        /// Target bitrate in kbps (cbr)
        #[arg(long)]
        bitrate: Option<String>,

        /// Scale percentage (scale)
        #[arg(long)]
        scale: Option<String>,

        /// Target file size in MB (size)
        #[arg(long)]
        target_size: Option<String>,

        /// Audio quality: low, medium, high
        #[arg(long)]
        audio_quality: Option<String>,
    },
    /// Compress one or more audio files
    Audio {
        #[command(flatten)]
        io: IoArgs,

        /// Audio quality: low, medium, high
        #[arg(short, long)]
        quality: Option<String>,
    },
    /// Compress one or more images
    Image {
        #[command(flatten)]
        io: IoArgs,

        /// Image quality (0-100)
        #[arg(short, long)]
        quality: Option<String>,
    },
    /// Write the effective configuration to a file
    InitConfig {
        /// Destination file
        path: PathBuf,
    },
}

#[derive(Args)]
struct IoArgs {
    /// Input files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (only with a single input)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match cli.config {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    if cli.json {
        config.json_output = true;
    }

    let mut resolver = SettingsResolver::new(config.video.clone(), config.audio, config.image);
    let (kind, io) = match cli.command {
        Command::InitConfig { path } => {
            config.save_to_file(&path).await?;
            info!("Configuration written to {}", path.display());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Video {
            io,
            strategy,
            custom,
            resolution,
            crf,
            bitrate,
            scale,
            target_size,
            audio_quality,
        } => {
            if let Some(strategy) = strategy {
                let tag: StrategyTag = strategy.parse().map_err(|e: String| anyhow::anyhow!(e))?;
                resolver.select_strategy(tag);
            }

            let overrides = [("resolution", resolution), ("crf", crf), ("audio_quality", audio_quality)];
            if custom || overrides.iter().any(|(_, value)| value.is_some()) {
                resolver.set_field(MediaKind::Video, "custom_overrides", "true")?;
            }

            let fields = overrides.into_iter().chain([
                ("target_bitrate_kbps", bitrate),
                ("scale_percent", scale),
                ("target_size_mb", target_size),
            ]);
            for (field, value) in fields {
                if let Some(value) = value {
                    resolver.set_field(MediaKind::Video, field, &value)?;
                }
            }
            (MediaKind::Video, io)
        }
        Command::Audio { io, quality } => {
            if let Some(quality) = quality {
                resolver.set_field(MediaKind::Audio, "quality", &quality)?;
            }
            (MediaKind::Audio, io)
        }
        Command::Image { io, quality } => {
            if let Some(quality) = quality {
                resolver.set_field(MediaKind::Image, "quality", &quality)?;
            }
            (MediaKind::Image, io)
        }
    };

    if io.output.is_some() && io.inputs.len() > 1 {
        return Err(anyhow::anyhow!("--output can only be used with a single input"));
    }

    let settings = resolver.resolve(kind)?;
    debug!("Resolved {} settings: {:?}", kind, settings);

    let registry = TaskRegistry::new();
    let bridge = ProgressBridge::start(registry.clone(), config.progress_channel_capacity);
    let engine = FfmpegEngine::new(&config, bridge.sender());
    if let Err(e) = engine.check_dependencies().await {
        bridge.shutdown().await;
        return Err(e.into());
    }
    let dispatcher = JobDispatcher::new(registry.clone(), Arc::new(engine));

    let start_time = Instant::now();
    let mut stats = RunStats::new();
    let mut reporter = Reporter::new(&config, io.inputs.len() as u64);
    let mut handles = Vec::new();

    for input in &io.inputs {
        let input_path = input.to_string_lossy().to_string();
        match FileManager::detect_kind(input) {
            Some(detected) if detected != kind => {
                warn!("{} looks like {} media, compressing as {}", input_path, detected, kind);
            }
            None => warn!("Unrecognized extension for {}", input_path),
            _ => {}
        }

        let output_path = io
            .output
            .clone()
            .unwrap_or_else(|| PathResolver::derive_output_path(input, &config.output_suffix))
            .to_string_lossy()
            .to_string();

        match dispatcher.submit(kind, &input_path, &output_path, settings.clone()).await {
            Ok(handle) => {
                stats.add_submitted();
                reporter.submitted(handle.task());
                handles.push(handle);
            }
            Err(e) => {
                stats.add_rejected();
                reporter.rejected(&input_path, &e.to_string(), e.is_user_notice());
            }
        }
    }

    let waits = futures::future::join_all(handles.into_iter().map(|handle| async move {
        let task_id = handle.task_id().to_string();
        (task_id, handle.wait().await)
    }));
    tokio::pin!(waits);

    let mut ticker = tokio::time::interval(Duration::from_millis(config.poll_interval_ms));
    let outcomes = loop {
        tokio::select! {
            outcomes = &mut waits => break outcomes,
            _ = ticker.tick() => reporter.refresh(&registry.snapshot().await),
        }
    };

    bridge.shutdown().await;

    for (task_id, outcome) in outcomes {
        if let Some(task) = registry.get(&task_id).await {
            stats.record(task.status);
            reporter.finished(&task, &outcome);
        }
    }

    reporter.summary(stats, start_time.elapsed());

    Ok(if stats.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Run feedback: a progress bar, or JSON lines when requested
struct Reporter {
    bar: Option<ProgressManager>,
    last_seen: HashMap<String, (TaskStatus, f64)>,
}

impl Reporter {
    fn new(config: &Config, total_jobs: u64) -> Self {
        Self {
            bar: (!config.json_output).then(|| ProgressManager::new(total_jobs)),
            last_seen: HashMap::new(),
        }
    }

    fn submitted(&mut self, task: &Task) {
        self.last_seen.insert(task.id.clone(), (task.status, task.progress));
        if self.bar.is_none() {
            JsonMessage::submitted(task).emit();
        }
    }

    fn rejected(&self, task_id: &str, reason: &str, notice: bool) {
        match self.bar {
            Some(ref bar) => bar.println(&format!("⚠️  {}: {}", task_id, reason)),
            None => JsonMessage::rejected(task_id, reason).emit(),
        }
        if notice {
            info!("{}", reason);
        } else {
            error!("Rejected {}: {}", task_id, reason);
        }
    }

    fn refresh(&mut self, tasks: &[Task]) {
        match self.bar {
            Some(ref bar) => bar.update(tasks),
            None => {
                for task in tasks.iter().filter(|t| !t.status.is_terminal()) {
                    let current = (task.status, task.progress);
                    if self.last_seen.get(&task.id) != Some(&current) {
                        self.last_seen.insert(task.id.clone(), current);
                        JsonMessage::progress(task).emit();
                    }
                }
            }
        }
    }

    fn finished(&self, task: &Task, outcome: &JobOutcome) {
        match self.bar {
            Some(ref bar) => match outcome {
                JobOutcome::Completed(message) => bar.println(&format!("✅ {}", message)),
                JobOutcome::Failed(message) => {
                    bar.println(&format!("❌ {}: {}", task.input_path, message))
                }
            },
            None => {
                let message = outcome.is_success().then(|| outcome.message().to_string());
                JsonMessage::task_complete(task, message).emit();
            }
        }
    }

    fn summary(&self, stats: RunStats, elapsed: Duration) {
        match self.bar {
            Some(ref bar) => {
                bar.finish(&stats.format_summary());
                info!("Done in {:.1}s", elapsed.as_secs_f64());
            }
            None => JsonMessage::summary(stats, elapsed.as_secs_f64()).emit(),
        }
    }
}
