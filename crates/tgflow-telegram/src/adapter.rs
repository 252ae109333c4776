//! Telegram channel adapter.
//!
//! Wraps a teloxide `Bot` and its update dispatcher, feeding every message
//! into a tgflow [`Dispatcher`]. Long polling, no public URL required.

use std::sync::Arc;

use teloxide::dispatching::{Dispatcher as UpdateDispatcher, UpdateFilterExt};
use teloxide::dptree;
use teloxide::requests::Requester;
use teloxide::types::Update;
use teloxide::Bot;
use tracing::{info, warn};

use tgflow_core::config::TelegramConfig;
use tgflow_dispatch::Dispatcher;

use crate::commands::publish_commands;
use crate::error::{Result, TelegramError};
use crate::handler::handle_message;

pub struct TelegramAdapter {
    bot: Bot,
    config: TelegramConfig,
}

impl TelegramAdapter {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(TelegramError::NoToken);
        }
        Ok(Self {
            bot: Bot::new(&config.bot_token),
            config: config.clone(),
        })
    }

    /// Handle for handlers and for building the dispatcher.
    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    /// The bot's username: configured value, or asked from Telegram via `getMe`.
    pub async fn username(&self) -> Result<Option<String>> {
        if let Some(name) = &self.config.bot_username {
            return Ok(Some(name.clone()));
        }
        let me = self.bot.get_me().await?;
        Ok(me.user.username.clone())
    }

    /// Publish the command menu (if enabled) and drive the long-polling loop.
    ///
    /// Returns once teloxide shuts down, e.g. after Ctrl-C.
    pub async fn run(self, dispatcher: Arc<Dispatcher<Bot>>) -> Result<()> {
        if self.config.publish_commands {
            if let Err(e) = publish_commands(&self.bot, &dispatcher.commands()).await {
                warn!(error = %e, "Telegram: failed to publish command menu");
            }
        }

        info!("Telegram: starting long-polling dispatcher");

        let handler = Update::filter_message().endpoint(handle_message);

        UpdateDispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![dispatcher])
            .default_handler(|_upd| async {})
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram: dispatcher stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_rejected() {
        let config = TelegramConfig::default();
        assert!(matches!(
            TelegramAdapter::new(&config),
            Err(TelegramError::NoToken)
        ));

        let config = TelegramConfig {
            bot_token: "   ".to_string(),
            ..TelegramConfig::default()
        };
        assert!(TelegramAdapter::new(&config).is_err());
    }

    #[tokio::test]
    async fn configured_username_skips_get_me() {
        let config = TelegramConfig {
            bot_token: "123:abc".to_string(),
            bot_username: Some("flow_bot".to_string()),
            ..TelegramConfig::default()
        };
        let adapter = TelegramAdapter::new(&config).unwrap();
        assert_eq!(adapter.username().await.unwrap().as_deref(), Some("flow_bot"));
    }
}
