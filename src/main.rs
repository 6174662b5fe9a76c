//! Starling Sweep
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │ Platform │───▶│ Gateway  │───▶│ Pipeline │───▶│ Starling │
//! │ webhook  │    │ (axum)   │    │          │    │   API    │
//! └──────────┘    └──────────┘    └────┬─────┘    └──────────┘
//!                                      │
//!                                      ▼
//!                                 ┌──────────┐
//!                                 │  Redis   │
//!                                 └──────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use starling_sweep::bank::StarlingClient;
use starling_sweep::config::AppConfig;
use starling_sweep::gateway::{self, AppState};
use starling_sweep::logging::init_logging;
use starling_sweep::pipeline::WebhookProcessor;

fn get_arg(names: &[&str]) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if names.contains(&args[i].as_str()) && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

fn get_env() -> String {
    get_arg(&["--env", "-e"]).unwrap_or_else(|| "dev".to_string())
}

/// Get port override from command line (--port argument)
fn get_port_override() -> anyhow::Result<Option<u16>> {
    get_arg(&["--port"])
        .map(|p| p.parse().with_context(|| format!("Invalid --port {}", p)))
        .transpose()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env = get_env();
    let mut config = match get_arg(&["--config", "-c"]) {
        Some(path) => AppConfig::load_from(&path),
        None => AppConfig::load(&env),
    }
    .with_context(|| format!("Failed to load {} configuration", env))?;
    if let Some(port) = get_port_override()? {
        config.server.port = port;
    }

    let _log_guard = init_logging(&config.log);
    info!(
        env = %env,
        version = env!("SWEEPER_REVISION"),
        "Starting Starling Sweep"
    );
    info!(
        round_up_goal = ?config.policy.round_up_goal,
        sweep_goal = ?config.policy.sweep_goal,
        sweep_threshold = config.policy.sweep_threshold,
        cache_backend = ?config.cache.backend,
        dedup_mode = ?config.cache.mode,
        "Policy loaded"
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.bank.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;
    let bank = Arc::new(StarlingClient::from_config(http, &config.bank));

    let processor = WebhookProcessor::from_config(&config, bank)
        .context("Failed to initialise webhook pipeline")?;
    if processor.signature_bypassed() {
        warn!("Signature verification is DISABLED; never run this way in production");
    }
    let state = Arc::new(AppState::new(
        Arc::new(processor),
        config.signature.on_failure,
    ));

    gateway::run_server(&config.server, state)
        .await
        .context("Gateway server failed")?;

    info!("Starling Sweep stopped");
    Ok(())
}
