/// Nova Player - console harness for the playback controller
use clap::Parser;
use nova_core::TrackId;
use nova_player::{AppConfig, Outcome, Player, PlayerCommand, PlayerError};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nova-player")]
#[command(about = "Nova Player playback controller console", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "NOVA_CONFIG")]
    config: Option<PathBuf>,

    /// Track ids to queue, e.g. yt:dQw4w9WgXcQ
    tracks: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nova_player=info,nova_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;

    tracing::info!("Starting Nova Player");
    tracing::info!(
        "Simulated engine: {} ms prepare, {} s tracks",
        config.simulation.prepare_delay_ms,
        config.simulation.track_duration_secs
    );

    let player = Player::start(&config);
    spawn_event_log(&player);

    if !cli.tracks.is_empty() {
        let ids: Vec<TrackId> = cli.tracks.iter().map(TrackId::new).collect();
        player.load(&ids).await?;
    }

    run_console(&player).await?;

    player.shutdown();
    tracing::info!("Nova Player stopped");
    Ok(())
}

/// Read commands from stdin until `quit` or end of input
async fn run_console(player: &Player) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<PlayerCommand>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{} (type 'help')", e);
                continue;
            }
        };

        match player.execute(command).await {
            Ok(Outcome::Continue) => {}
            Ok(Outcome::Quit) => break,
            Err(PlayerError::Playback(e)) => return Err(e.into()),
            Err(e) => eprintln!("{}", e),
        }
    }

    Ok(())
}

/// Log controller events and progress as they happen
fn spawn_event_log(player: &Player) {
    let mut events = player.controller().events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(kind = event.kind(), "{:?}", event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!("Event log lagged, {} events dropped", missed);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut progress = player.progress().progress();
    tokio::spawn(async move {
        while let Some(latest) = progress.changed().await {
            if let Some(sample) = latest {
                tracing::debug!(
                    "{} {}/{} ms",
                    sample.track_id,
                    sample.position_ms,
                    sample.duration_ms
                );
            }
        }
    });
}
