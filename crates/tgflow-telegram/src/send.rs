//! Reply helpers for handlers running on a teloxide `Bot`.
//!
//! Telegram rejects messages over 4096 characters, so long replies are split,
//! preferably at line breaks, and sent in order.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::requests::Requester;
use teloxide::types::ChatId;
use teloxide::Bot;

use tgflow_dispatch::InteractionContext;

use crate::error::Result;

/// Maximum characters per Telegram message.
pub const MESSAGE_MAX_CHARS: usize = 4096;

/// Split `text` into chunks of at most `max` characters.
///
/// A chunk ends at the last newline that fits, or at the hard limit when a
/// single line is longer than `max`. Empty input yields no chunks. A `max`
/// of zero is treated as one character per chunk.
pub fn split_chunks(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        // Byte offset just past the `max`-th character, or the end.
        let limit = rest
            .char_indices()
            .nth(max)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if limit == rest.len() {
            chunks.push(rest.to_string());
            break;
        }

        let (chunk, next) = match rest[..limit].rfind('\n') {
            Some(nl) if nl > 0 => (&rest[..nl], &rest[nl + 1..]),
            _ => (&rest[..limit], &rest[limit..]),
        };
        chunks.push(chunk.to_string());
        rest = next;
    }

    chunks
}

/// Send `text` to `chat_id`, split into as many messages as needed.
pub async fn send_text(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    let chunks = split_chunks(text, MESSAGE_MAX_CHARS);
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        bot.send_message(chat_id, chunk.as_str()).await?;
    }
    Ok(())
}

/// Replies into the chat the handled message came from.
#[async_trait]
pub trait ReplyExt {
    async fn reply(&self, text: &str) -> Result<()>;
}

#[async_trait]
impl ReplyExt for InteractionContext<Bot> {
    async fn reply(&self, text: &str) -> Result<()> {
        send_text(self.bot(), ChatId(self.chat_id().0), text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_chunks("hello", 10), vec!["hello"]);
        assert_eq!(split_chunks(&"a".repeat(10), 10).len(), 1);
    }

    #[test]
    fn empty_text_sends_nothing() {
        assert!(split_chunks("", MESSAGE_MAX_CHARS).is_empty());
    }

    #[test]
    fn prefers_line_breaks() {
        let chunks = split_chunks("aaaa\nbbbb\ncccc", 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn long_line_is_hard_split() {
        let chunks = split_chunks(&"x".repeat(25), 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat().len(), 25);
    }

    #[test]
    fn zero_limit_still_makes_progress() {
        assert_eq!(split_chunks("abc", 0), vec!["a", "b", "c"]);
        assert_eq!(split_chunks("a\nb", 0), vec!["a", "\n", "b"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "ж".repeat(MESSAGE_MAX_CHARS);
        let chunks = split_chunks(&text, MESSAGE_MAX_CHARS);
        assert_eq!(chunks.len(), 1);

        let chunks = split_chunks(&"ж".repeat(15), 10);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 10);
    }
}
