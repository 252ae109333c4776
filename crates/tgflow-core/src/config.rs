use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};

/// Idle time after which a conversation session is evicted.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30 * 60;

/// Top-level config (tgflow.toml + TGFLOW_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Username of this bot without `@`. When set, `/cmd@other_bot` is ignored
    /// by the command strategy.
    pub bot_username: Option<String>,
    /// Replace the bot's command menu with the registered commands on startup.
    #[serde(default = "bool_true")]
    pub publish_commands: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            bot_username: None,
            publish_commands: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl SessionsConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Log handler failures at `warn` (true) or only at `debug` (false).
    #[serde(default = "bool_true")]
    pub log_handler_errors: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            log_handler_errors: true,
        }
    }
}

fn bool_true() -> bool {
    true
}

fn default_idle_timeout_secs() -> u64 {
    DEFAULT_IDLE_TIMEOUT_SECS
}

impl FlowConfig {
    /// Load config from a TOML file with TGFLOW_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.tgflow/tgflow.toml
    ///
    /// Nested keys use a double underscore: `TGFLOW_TELEGRAM__BOT_TOKEN`.
    ///
    /// An explicit path must exist; a missing default file just means
    /// defaults plus env overrides.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = match config_path {
            Some(path) => {
                std::fs::metadata(path)?;
                path.to_string()
            }
            None => default_config_path(),
        };

        Self::from_figment(
            Figment::new()
                .merge(Toml::file(&path))
                .merge(Env::prefixed("TGFLOW_").split("__")),
        )
    }

    /// Extract and validate a config from an already assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: FlowConfig = figment
            .extract()
            .map_err(|e| FlowError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the runtime cannot work with.
    ///
    /// The bot token is not checked here: the transport adapter reports a
    /// missing token itself, and the core can run without any transport.
    pub fn validate(&self) -> Result<()> {
        if self.sessions.idle_timeout_secs == 0 {
            return Err(FlowError::Config(
                "sessions.idle_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if let Some(name) = &self.telegram.bot_username {
            if name.starts_with('@') || name.trim().is_empty() {
                return Err(FlowError::Config(format!(
                    "telegram.bot_username must be a bare username, got {name:?}"
                )));
            }
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.tgflow/tgflow.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_figment_yields_defaults() {
        let config = FlowConfig::from_figment(Figment::new()).unwrap();
        assert_eq!(config.sessions.idle_timeout(), Duration::from_secs(1800));
        assert!(config.telegram.publish_commands);
        assert!(config.dispatch.log_handler_errors);
        assert!(config.telegram.bot_username.is_none());
    }

    #[test]
    fn toml_values_override_defaults() {
        let toml = r#"
            [telegram]
            bot_token = "123:abc"
            bot_username = "flow_bot"

            [sessions]
            idle_timeout_secs = 60

            [dispatch]
            log_handler_errors = false
        "#;
        let config = FlowConfig::from_figment(Figment::new().merge(Toml::string(toml))).unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.bot_username.as_deref(), Some("flow_bot"));
        assert_eq!(config.sessions.idle_timeout_secs, 60);
        assert!(!config.dispatch.log_handler_errors);
    }

    #[test]
    fn zero_idle_timeout_is_rejected() {
        let toml = "[sessions]\nidle_timeout_secs = 0\n";
        let err = FlowConfig::from_figment(Figment::new().merge(Toml::string(toml))).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn missing_explicit_file_is_an_io_error() {
        let err = FlowConfig::load(Some("/nonexistent/tgflow/tgflow.toml")).unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");
    }

    #[test]
    fn load_reports_validation_errors() {
        let path = std::env::temp_dir().join(format!("tgflow-invalid-{}.toml", std::process::id()));
        std::fs::write(&path, "[sessions]\nidle_timeout_secs = 0\n").unwrap();

        let result = FlowConfig::load(path.to_str());
        std::fs::remove_file(&path).ok();

        match result {
            Err(FlowError::Config(msg)) => assert!(msg.contains("idle_timeout_secs"), "got: {msg}"),
            other => panic!("expected a config error, got {other:?}"),
        }
    }

    #[test]
    fn username_with_at_is_rejected() {
        let toml = "[telegram]\nbot_username = \"@flow_bot\"\n";
        assert!(FlowConfig::from_figment(Figment::new().merge(Toml::string(toml))).is_err());
    }
}
