//! Telegram transport for tgflow, built on teloxide.

pub mod adapter;
pub mod commands;
pub mod convert;
pub mod error;
pub mod handler;
pub mod send;

pub use adapter::TelegramAdapter;
pub use commands::publish_commands;
pub use error::TelegramError;
pub use send::ReplyExt;
