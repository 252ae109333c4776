use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use tgflow_core::config::DispatchConfig;
use tgflow_core::InboundMessage;
use tgflow_sessions::SessionStore;

use crate::command::{parse_command, ParsedCommand};
use crate::context::InteractionContext;
use crate::error::RegistrationError;
use crate::registry::HandlerRegistry;
use crate::types::{CommandInfo, DispatchOutcome, Handler, HandlerEntry, Strategy};

/// A group of handlers that registers itself.
///
/// Feature modules implement this and the application lists them at startup,
/// so the set of handlers is explicit and ordered.
pub trait HandlerModule<B> {
    fn register(&self, builder: &mut DispatcherBuilder<B>);
}

/// Collects handlers for all three strategies, then freezes them into a [`Dispatcher`].
///
/// Rejected registrations are logged and remembered; they never stop the
/// remaining registrations.
pub struct DispatcherBuilder<B> {
    commands: HandlerRegistry<B>,
    texts: HandlerRegistry<B>,
    states: HandlerRegistry<B>,
    sessions: Arc<SessionStore>,
    bot_username: Option<String>,
    log_handler_errors: bool,
    rejected: Vec<RegistrationError>,
}

impl<B: Send + Sync + 'static> DispatcherBuilder<B> {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self {
            commands: HandlerRegistry::new(Strategy::Command),
            texts: HandlerRegistry::new(Strategy::Text),
            states: HandlerRegistry::new(Strategy::State),
            sessions,
            bot_username: None,
            log_handler_errors: true,
            rejected: Vec::new(),
        }
    }

    /// This bot's username; `/cmd@someone_else` will then skip the command pass.
    pub fn bot_username(&mut self, username: Option<String>) -> &mut Self {
        self.bot_username = username;
        self
    }

    pub fn config(&mut self, config: &DispatchConfig) -> &mut Self {
        self.log_handler_errors = config.log_handler_errors;
        self
    }

    /// Register a `/command` with the description shown in the bot menu.
    pub fn command(
        &mut self,
        name: &str,
        description: &str,
        handler: impl Handler<B> + 'static,
    ) -> &mut Self {
        let result = self
            .commands
            .register(name, Some(description), Arc::new(handler));
        self.record(result)
    }

    /// Register a handler for messages whose text equals `text` exactly.
    pub fn text(&mut self, text: &str, handler: impl Handler<B> + 'static) -> &mut Self {
        let result = self.texts.register(text, None, Arc::new(handler));
        self.record(result)
    }

    /// Register a handler for senders currently in conversation state `state`.
    pub fn state(&mut self, state: &str, handler: impl Handler<B> + 'static) -> &mut Self {
        let result = self.states.register(state, None, Arc::new(handler));
        self.record(result)
    }

    pub fn module(&mut self, module: &dyn HandlerModule<B>) -> &mut Self {
        module.register(self);
        self
    }

    /// Registrations that were skipped so far.
    pub fn rejected(&self) -> &[RegistrationError] {
        &self.rejected
    }

    pub fn build(self) -> Dispatcher<B> {
        info!(
            commands = self.commands.len(),
            texts = self.texts.len(),
            states = self.states.len(),
            rejected = self.rejected.len(),
            "dispatcher built"
        );
        Dispatcher {
            commands: self.commands,
            texts: self.texts,
            states: self.states,
            sessions: self.sessions,
            bot_username: self.bot_username,
            log_handler_errors: self.log_handler_errors,
        }
    }

    fn record(&mut self, result: crate::error::Result<()>) -> &mut Self {
        if let Err(e) = result {
            warn!(error = %e, "handler registration skipped");
            self.rejected.push(e);
        }
        self
    }
}

/// Routes inbound messages to handlers: command, then literal text, then
/// the sender's conversation state.
///
/// Immutable once built; share it as `Arc<Dispatcher<B>>` across tasks.
pub struct Dispatcher<B> {
    commands: HandlerRegistry<B>,
    texts: HandlerRegistry<B>,
    states: HandlerRegistry<B>,
    sessions: Arc<SessionStore>,
    bot_username: Option<String>,
    log_handler_errors: bool,
}

impl<B: Send + Sync + 'static> Dispatcher<B> {
    pub fn builder(sessions: Arc<SessionStore>) -> DispatcherBuilder<B> {
        DispatcherBuilder::new(sessions)
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn registry(&self, strategy: Strategy) -> &HandlerRegistry<B> {
        match strategy {
            Strategy::Command => &self.commands,
            Strategy::Text => &self.texts,
            Strategy::State => &self.states,
        }
    }

    /// Registered commands for the host platform's command menu.
    pub fn commands(&self) -> Vec<CommandInfo> {
        self.commands.commands()
    }

    /// Route `message` and report whether any handler ran.
    pub async fn try_dispatch(&self, bot: B, message: InboundMessage) -> bool {
        self.dispatch(bot, message).await.is_handled()
    }

    /// Route `message` to at most one handler.
    ///
    /// Handler errors and panics are caught here and returned as
    /// [`DispatchOutcome::Failed`]; they never propagate to the caller.
    pub async fn dispatch(&self, bot: B, message: InboundMessage) -> DispatchOutcome {
        let span = info_span!(
            "dispatch",
            dispatch_id = %Uuid::now_v7(),
            chat_id = %message.chat_id,
            user_id = ?message.sender_id().map(|id| id.get()),
        );
        self.route(bot, Arc::new(message)).instrument(span).await
    }

    async fn route(&self, bot: B, message: Arc<InboundMessage>) -> DispatchOutcome {
        if let Some(command) = message.text().and_then(parse_command) {
            if self.is_for_us(&command) {
                if let Some(entry) = self.commands.lookup(&command.name) {
                    return self
                        .invoke(Strategy::Command, entry, bot, message, Some(command))
                        .await;
                }
            } else {
                debug!(mention = ?command.mention, "command addressed to another bot");
            }
        }

        if let Some(entry) = message.text().and_then(|t| self.texts.lookup(t)) {
            return self.invoke(Strategy::Text, entry, bot, message, None).await;
        }

        if let Some(user_id) = message.sender_id() {
            if let Some(session) = self.sessions.get_state(user_id) {
                if let Some(entry) = self.states.lookup(&session.state) {
                    return self.invoke(Strategy::State, entry, bot, message, None).await;
                }
                debug!(state = %session.state, "no handler for current state");
            }
        }

        debug!("message unhandled");
        DispatchOutcome::Unhandled
    }

    fn is_for_us(&self, command: &ParsedCommand) -> bool {
        match &self.bot_username {
            Some(username) => command.is_addressed_to(username),
            None => true,
        }
    }

    async fn invoke(
        &self,
        strategy: Strategy,
        entry: &HandlerEntry<B>,
        bot: B,
        message: Arc<InboundMessage>,
        command: Option<ParsedCommand>,
    ) -> DispatchOutcome {
        let ctx = InteractionContext::new(bot, message, Arc::clone(&self.sessions), command);
        let key = entry.key.clone();
        let started = Instant::now();

        let result = AssertUnwindSafe(entry.handler.handle(ctx))
            .catch_unwind()
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let error = match result {
            Ok(Ok(())) => {
                debug!(%strategy, key = %key, elapsed_ms, "handler completed");
                return DispatchOutcome::Handled { strategy, key };
            }
            Ok(Err(e)) => e,
            Err(payload) => anyhow::anyhow!("handler panicked: {}", panic_message(&*payload)),
        };

        if self.log_handler_errors {
            warn!(%strategy, key = %key, elapsed_ms, error = %format!("{error:#}"), "handler failed");
        } else {
            debug!(%strategy, key = %key, elapsed_ms, error = %format!("{error:#}"), "handler failed");
        }
        DispatchOutcome::Failed {
            strategy,
            key,
            error,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
