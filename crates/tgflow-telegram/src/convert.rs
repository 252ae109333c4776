//! teloxide types to the transport-neutral shapes the dispatcher routes on.

use teloxide::types::{Message, User};

use tgflow_core::{ChatId, InboundMessage, Sender};

pub fn sender_from_user(user: &User) -> Sender {
    Sender {
        id: (user.id.0 as i64).into(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        is_bot: user.is_bot,
    }
}

/// A media caption lands in `caption`, not `text`, so a photo captioned
/// `/start` is not routed as a command.
pub fn inbound_from_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        message_id: msg.id.0,
        chat_id: ChatId(msg.chat.id.0),
        sender: msg.from.as_ref().map(sender_from_user),
        text: msg.text().map(str::to_string),
        caption: msg.caption().map(str::to_string),
        date: msg.date,
    }
}
