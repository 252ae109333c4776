//! The per-invocation bundle every handler receives.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tgflow_core::{ChatId, InboundMessage, Sender, UserId};
use tgflow_sessions::SessionStore;

use crate::command::ParsedCommand;

/// Read-only view of one inbound message plus the handles a handler needs.
///
/// Built by the dispatcher right before the handler runs and dropped when it
/// returns. `B` is the transport's bot handle (e.g. `teloxide::Bot`).
#[derive(Clone)]
pub struct InteractionContext<B> {
    bot: B,
    message: Arc<InboundMessage>,
    sessions: Arc<SessionStore>,
    command: Option<ParsedCommand>,
}

impl<B> InteractionContext<B> {
    pub fn new(
        bot: B,
        message: Arc<InboundMessage>,
        sessions: Arc<SessionStore>,
        command: Option<ParsedCommand>,
    ) -> Self {
        Self {
            bot,
            message,
            sessions,
            command,
        }
    }

    pub fn bot(&self) -> &B {
        &self.bot
    }

    pub fn message(&self) -> &InboundMessage {
        &self.message
    }

    pub fn chat_id(&self) -> ChatId {
        self.message.chat_id
    }

    pub fn sender(&self) -> Option<&Sender> {
        self.message.sender.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.message.sender_id()
    }

    pub fn text(&self) -> Option<&str> {
        self.message.text()
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// The parsed command, when the command strategy matched.
    pub fn command(&self) -> Option<&ParsedCommand> {
        self.command.as_ref()
    }

    /// Command arguments, e.g. `"deep_link"` for `/start deep_link`.
    pub fn args(&self) -> Option<&str> {
        self.command.as_ref().and_then(|c| c.args.as_deref())
    }

    // Sender-scoped shortcuts into the session store. Anonymous messages have
    // no sender, so these degrade to no-ops.

    /// The sender's current conversation state.
    pub fn state(&self) -> Option<String> {
        let user_id = self.user_id()?;
        self.sessions.get_state(user_id).map(|s| s.state)
    }

    /// Move the sender to `state`. Returns `false` for anonymous messages.
    pub fn set_state(&self, state: impl Into<String>) -> bool {
        match self.user_id() {
            Some(user_id) => {
                self.sessions.set_state(user_id, state);
                true
            }
            None => false,
        }
    }

    pub fn clear_state(&self) -> bool {
        self.user_id()
            .map(|user_id| self.sessions.clear_state(user_id))
            .unwrap_or(false)
    }

    pub fn set_data<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) -> bool {
        self.user_id()
            .map(|user_id| self.sessions.set_data(user_id, key, value))
            .unwrap_or(false)
    }

    pub fn get_data<T: Any + Clone>(&self, key: &str) -> Option<T> {
        let user_id = self.user_id()?;
        self.sessions.get_data(user_id, key)
    }
}

impl<B> fmt::Debug for InteractionContext<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionContext")
            .field("chat_id", &self.message.chat_id)
            .field("sender", &self.message.sender_id())
            .field("text", &self.message.text)
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}
