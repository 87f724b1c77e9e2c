//! Actor - MCTS game runner for Zeroplay
//!
//! Plays tic-tac-toe games with PUCT search:
//! 1. Self-play, with the search picking moves for both sides
//! 2. Against a random opponent
//! 3. Against a human entering moves on stdin
//!
//! Ctrl+C abandons the game in progress, including a pending move prompt.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

mod actor;
mod config;
mod opponent;

use crate::actor::Actor;
use crate::config::Config;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Validate configuration
    config.validate()?;

    // Initialize tracing
    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    let games_description = if config.games == 0 {
        "until interrupted".to_string()
    } else {
        config.games.to_string()
    };
    info!(
        games = config.games,
        seed = config.seed,
        "Actor will play {} games", games_description
    );

    // Create actor instance
    let actor = Arc::new(Actor::new(config)?);

    // Setup graceful shutdown
    let shutdown_actor = Arc::clone(&actor);
    let shutdown_handle = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping actor...");
                shutdown_actor.shutdown();
            }
            Err(e) => error!("Failed to listen for ctrl+c: {}", e),
        }
    });

    // Search is CPU bound and the human opponent blocks on stdin
    let run_actor = Arc::clone(&actor);
    let result = tokio::task::spawn_blocking(move || run_actor.run()).await?;

    shutdown_handle.abort();

    match result {
        Ok(summary) => {
            info!(
                games = summary.games,
                games_started = actor.games_played(),
                "Actor completed successfully"
            );
            Ok(())
        }
        Err(e) => {
            error!("Actor failed: {}", e);
            Err(e)
        }
    }
}
