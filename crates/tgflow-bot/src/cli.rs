use clap::Parser;

#[derive(Parser)]
#[command(name = "tgflow-bot")]
#[command(author, version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TGFLOW_GIT_SHA"), ")"), about = "Telegram bot with command, text and conversation-state routing", long_about = None)]
pub struct Cli {
    /// Path to tgflow.toml (falls back to TGFLOW_CONFIG, then ~/.tgflow/tgflow.toml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Print the registered command menu as JSON and exit
    #[arg(long)]
    pub print_commands: bool,
}

impl Cli {
    /// Explicit flag first, then the TGFLOW_CONFIG environment variable.
    pub fn config_path(&self) -> Option<String> {
        self.config
            .clone()
            .or_else(|| std::env::var("TGFLOW_CONFIG").ok())
    }
}
