//! The teloxide endpoint that feeds messages into the dispatcher.

use std::sync::Arc;

use teloxide::prelude::ResponseResult;
use teloxide::types::Message;
use teloxide::Bot;
use tracing::debug;

use tgflow_core::InboundMessage;
use tgflow_dispatch::{DispatchOutcome, Dispatcher};

use crate::convert::inbound_from_message;

/// Runs for every incoming `Message`.
///
/// Messages from other bots are dropped; everything else goes through the
/// dispatcher. Handler failures are already logged by the dispatcher and are
/// not reported back to teloxide.
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    dispatcher: Arc<Dispatcher<Bot>>,
) -> ResponseResult<()> {
    let inbound = inbound_from_message(&msg);
    if !should_dispatch(&inbound) {
        return Ok(());
    }

    match dispatcher.dispatch(bot, inbound).await {
        DispatchOutcome::Unhandled => debug!(chat_id = msg.chat.id.0, "Telegram: no handler"),
        DispatchOutcome::Handled { strategy, key } => {
            debug!(%strategy, %key, "Telegram: message handled")
        }
        DispatchOutcome::Failed { .. } => {}
    }
    Ok(())
}

fn should_dispatch(message: &InboundMessage) -> bool {
    !message.sender.as_ref().is_some_and(|s| s.is_bot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tgflow_core::Sender;

    #[test]
    fn bot_senders_are_ignored() {
        let mut sender = Sender::new(1, "Relay");
        sender.is_bot = true;
        assert!(!should_dispatch(&InboundMessage::private_text(sender, "/start")));
    }

    #[test]
    fn people_and_channel_posts_pass() {
        let person = InboundMessage::private_text(Sender::new(2, "Ann"), "hi");
        assert!(should_dispatch(&person));

        let mut post = person.clone();
        post.sender = None;
        assert!(should_dispatch(&post));
    }
}
