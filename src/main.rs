use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mindful_player::events::PlaybackEvent;
use mindful_player::player::{PlaybackController, create_backend};
use mindful_player::utils::progress_line;
use mindful_player::{Config, MeditationTrack};

/// Play a guided meditation session in the terminal
#[derive(Debug, Parser)]
#[command(name = "mindful-player", version)]
struct Args {
    /// Session title
    #[arg(long, default_value = "Mindful Breathing")]
    title: String,

    /// Guide leading the session
    #[arg(long)]
    instructor: Option<String>,

    /// Session length in minutes
    #[arg(long, default_value_t = 10)]
    minutes: u32,

    /// Audio to play; the configured ambient track is used when omitted
    #[arg(long)]
    source: Option<String>,

    /// Starting volume in percent (overrides the config)
    #[arg(long)]
    volume: Option<i32>,

    /// Print each position update to stdout as a JSON line
    #[arg(long)]
    json: bool,

    /// Config file to use instead of the per-user one
    #[arg(long, env = "MINDFUL_PLAYER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match args.config.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    info!("Starting mindful-player");

    let mut track = MeditationTrack::new(args.title, args.minutes);
    track.instructor = args.instructor;
    track.audio_url = args.source;

    let backend = create_backend(&config);
    let (handle, task) = PlaybackController::spawn(&track, backend, &config);

    let mut positions = handle.on_position_update();
    let mut completions = handle.on_complete();

    if let Some(volume) = args.volume {
        handle.set_volume(volume).await?;
    }
    let snapshot = handle.start().await?;
    if snapshot.is_visual_only() {
        warn!("Audio unavailable, running a visual-only session");
    }

    loop {
        // Positions first, so the final tick is logged before completion
        tokio::select! {
            biased;
            event = positions.recv() => {
                let event = event?;
                if let PlaybackEvent::PositionChanged { position_seconds, duration_seconds } = event {
                    if args.json {
                        println!("{}", serde_json::to_string(&event)?);
                        continue;
                    }
                    info!("{}", progress_line(position_seconds, duration_seconds));
                }
            }
            completed = completions.recv() => {
                completed?;
                info!("Session complete");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping session");
                break;
            }
        }
    }

    handle.close().await?;
    task.await.context("Playback controller task failed")?;
    Ok(())
}
