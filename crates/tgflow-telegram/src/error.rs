/// Errors produced by the Telegram adapter.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("teloxide error: {0}")]
    Teloxide(#[from] teloxide::RequestError),

    #[error("no bot token configured (set telegram.bot_token or TGFLOW_TELEGRAM__BOT_TOKEN)")]
    NoToken,
}

pub type Result<T> = std::result::Result<T, TelegramError>;
