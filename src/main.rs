use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::sync::broadcast::error::RecvError;

use crowdmeter::{
    Database, ReplayBackend, SessionController, SessionEvent, Settings, SettingsStore,
};

/// Live people analysis over a detector stream.
#[derive(Parser)]
#[command(name = "crowdmeter")]
struct Cli {
    /// Settings file (JSON). Missing files fall back to defaults.
    #[arg(long, default_value = "crowdmeter.json")]
    settings: PathBuf,

    /// SQLite database for session summaries.
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one session against recorded detector output.
    Run {
        /// JSON-lines replay script, one array of detections per frame.
        detections: PathBuf,

        /// Stop after this many seconds even if the replay has frames left.
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Synthetic frame width.
        #[arg(long, default_value = "640")]
        width: u32,

        /// Synthetic frame height.
        #[arg(long, default_value = "480")]
        height: u32,

        /// Simulated inference latency per frame.
        #[arg(long, default_value = "0")]
        latency_ms: u64,

        /// Write the session's observation log as JSON.
        #[arg(long)]
        export_observations: Option<PathBuf>,
    },
    /// List persisted session summaries, newest first.
    History {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = SettingsStore::new(cli.settings.clone())?;
    let settings = store.get();
    info!("Using settings from {}", store.path().display());
    let db_path = cli.db.clone().unwrap_or_else(|| settings.database_path());
    let database = Database::new(db_path)?;

    match cli.command {
        Command::Run {
            detections,
            duration_secs,
            width,
            height,
            latency_ms,
            export_observations,
        } => {
            let backend = ReplayBackend::from_path(&detections)?
                .with_frame_size(width, height)
                .with_latency(Duration::from_millis(latency_ms));
            run_session(
                backend,
                database,
                &settings,
                duration_secs.map(Duration::from_secs),
                export_observations,
            )
            .await
        }
        Command::History { limit } => print_history(&database, limit).await,
    }
}

async fn run_session(
    backend: ReplayBackend,
    database: Database,
    settings: &Settings,
    duration: Option<Duration>,
    export_observations: Option<PathBuf>,
) -> Result<()> {
    let frame_count = backend.frame_count();
    let controller = SessionController::new(Arc::new(backend), database, settings);
    let mut events = controller.subscribe();

    controller.start().await?;
    info!("People analysis started ({frame_count} scripted frames)");

    let deadline = async {
        match duration {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SessionEvent::FrameProcessed { frame_index, aggregate, .. }) => {
                    info!(
                        "frame {frame_index}: male {} female {} mood {}",
                        aggregate.male_count, aggregate.female_count, aggregate.mood
                    );
                }
                Ok(SessionEvent::PersonDetected { frame_index, .. }) => {
                    info!("person detected at frame {frame_index}");
                }
                Ok(SessionEvent::PersonsCleared { frame_index, .. }) => {
                    info!("nobody in view since frame {frame_index}");
                }
                Ok(SessionEvent::SourceExhausted { frames_processed, .. }) => {
                    info!("replay finished after {frames_processed} processed frames");
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("display lagged behind by {skipped} events");
                    if controller.snapshot().await.source_exhausted {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut deadline => {
                info!("duration limit reached");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    let summary = controller.stop().await?;

    if let Some(path) = export_observations {
        let observations = controller.observations().await;
        let json = serde_json::to_string_pretty(&observations)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write observations to {}", path.display()))?;
        info!("Wrote {} observations to {}", observations.len(), path.display());
    }

    if let Some(summary) = summary {
        println!("Summary");
        println!("  Date:         {}", summary.record.date_string());
        println!("  Time:         {}", summary.record.time_string());
        println!("  Total Male:   {}", summary.record.total_male);
        println!("  Total Female: {}", summary.record.total_female);
        println!("  Final mood:   {}", summary.final_mood);
        println!("  Observations: {}", summary.observation_count);
    }

    Ok(())
}

async fn print_history(database: &Database, limit: usize) -> Result<()> {
    let summaries = database.list_summaries(limit).await?;
    if summaries.is_empty() {
        println!("No sessions recorded in {}", database.path().display());
        return Ok(());
    }

    println!("{:<12} {:<10} {:>10} {:>12}", "Date", "Time", "Total male", "Total Female");
    for stored in summaries {
        let record = stored.record;
        println!(
            "{:<12} {:<10} {:>10} {:>12}",
            record.date_string(),
            record.time_string(),
            record.total_male,
            record.total_female
        );
    }
    Ok(())
}
