//! Episode server binary.
//!
//! Hosts duel episodes behind the polling HTTP surface.
//! Log level comes from `RUST_LOG` (default `info`).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use ccg_gym::channels::http::{serve, ServerState};
use ccg_gym::core::BridgeSettings;
use ccg_gym::episode::EpisodeRegistry;
use ccg_gym::games::DuelFactory;

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve card duel episodes over HTTP", long_about = None)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Apply the default decision to prompts left unanswered this long.
    #[arg(long)]
    decision_timeout_ms: Option<u64>,

    /// Longest a request waits for the engine to reach its next prompt.
    #[arg(long, default_value_t = 30_000)]
    settle_ms: u64,

    /// Abort an episode after this many consecutive decision faults (0 = never).
    #[arg(long, default_value_t = 0)]
    max_faults: u32,

    #[arg(long, default_value_t = 4)]
    workers: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = BridgeSettings::new().with_max_consecutive_faults(args.max_faults);
    if let Some(ms) = args.decision_timeout_ms {
        settings = settings.with_decision_timeout(Duration::from_millis(ms));
    }
    let registry = Arc::new(EpisodeRegistry::new(DuelFactory::new(), settings));
    let state = ServerState::new(Arc::clone(&registry), Duration::from_millis(args.settle_ms));

    serve(&args.bind, state, args.workers)
        .await
        .with_context(|| format!("serving on {}", args.bind))?;

    log::info!("shutting down {} episode(s)", registry.len());
    registry.close_all();
    Ok(())
}
