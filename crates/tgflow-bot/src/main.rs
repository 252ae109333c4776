use std::sync::Arc;

use clap::Parser;
use teloxide::Bot;
use tracing::{error, info, warn};

use tgflow_core::FlowConfig;
use tgflow_dispatch::Dispatcher;
use tgflow_sessions::SessionStore;
use tgflow_telegram::TelegramAdapter;

mod cli;
mod handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tgflow_bot=info,tgflow_dispatch=info,tgflow_telegram=info".into()
            }),
        )
        .init();

    let cli = cli::Cli::parse();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_sha = env!("TGFLOW_GIT_SHA"),
        "tgflow-bot starting"
    );

    // load config: --config > TGFLOW_CONFIG env > ~/.tgflow/tgflow.toml
    let config_path = cli.config_path();
    let config = load_config(config_path.as_deref())?;

    let sessions = Arc::new(SessionStore::new(config.sessions.idle_timeout()));
    info!(
        idle_timeout_secs = config.sessions.idle_timeout_secs,
        "session store ready"
    );

    if cli.print_commands {
        let dispatcher = build_dispatcher(&config, sessions, None);
        println!("{}", serde_json::to_string_pretty(&dispatcher.commands())?);
        return Ok(());
    }

    let adapter = TelegramAdapter::new(&config.telegram)?;
    let username = adapter.username().await.unwrap_or_else(|e| {
        warn!(error = %e, "could not resolve bot username, mentions will not be filtered");
        None
    });
    info!(username = ?username, "Telegram bot identity");

    let dispatcher = Arc::new(build_dispatcher(&config, sessions, username));
    adapter.run(dispatcher).await?;
    Ok(())
}

/// A config that fails to parse or validate stops startup. Without any
/// config file the defaults plus `TGFLOW_*` overrides apply.
fn load_config(path: Option<&str>) -> anyhow::Result<FlowConfig> {
    FlowConfig::load(path).map_err(|e| {
        error!(code = e.code(), error = %e, "config rejected");
        anyhow::Error::new(e).context("failed to load tgflow config")
    })
}

fn build_dispatcher(
    config: &FlowConfig,
    sessions: Arc<SessionStore>,
    bot_username: Option<String>,
) -> Dispatcher<Bot> {
    let mut builder = Dispatcher::builder(sessions);
    builder
        .config(&config.dispatch)
        .bot_username(bot_username)
        .module(&handlers::Onboarding);
    builder.build()
}
