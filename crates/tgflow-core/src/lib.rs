pub mod config;
pub mod error;
pub mod types;

pub use config::FlowConfig;
pub use error::{FlowError, Result};
pub use types::{ChatId, InboundMessage, Sender, UserId};
