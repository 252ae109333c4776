use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::InteractionContext;

/// What every handler returns. Errors are caught at the dispatcher boundary.
pub type HandlerResult = anyhow::Result<()>;

/// The three matching passes, in the order the dispatcher tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `/name` commands, matched on the parsed command name.
    Command,
    /// Exact message text.
    Text,
    /// The sender's current conversation state.
    State,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Command => write!(f, "command"),
            Strategy::Text => write!(f, "text"),
            Strategy::State => write!(f, "state"),
        }
    }
}

/// Anything that can serve an interaction.
///
/// Implemented for every `Fn(InteractionContext<B>) -> impl Future<Output = HandlerResult>`,
/// so plain async closures register directly; stateful handlers implement it
/// on their own types.
#[async_trait]
pub trait Handler<B>: Send + Sync {
    async fn handle(&self, ctx: InteractionContext<B>) -> HandlerResult;
}

#[async_trait]
impl<B, F, Fut> Handler<B> for F
where
    B: Send + Sync + 'static,
    F: Fn(InteractionContext<B>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, ctx: InteractionContext<B>) -> HandlerResult {
        (self)(ctx).await
    }
}

/// A registered handler together with its trigger.
pub struct HandlerEntry<B> {
    pub key: String,
    /// Only commands carry one; it is what the host platform shows in its menu.
    pub description: Option<String>,
    pub handler: Arc<dyn Handler<B>>,
}

impl<B> fmt::Debug for HandlerEntry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("key", &self.key)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Command metadata for the host platform's "set commands" call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    /// Command name without the leading `/`.
    pub command: String,
    pub description: String,
}

/// How a single inbound message was routed.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// No strategy matched; nothing ran.
    Unhandled,
    /// A handler ran and returned `Ok`.
    Handled { strategy: Strategy, key: String },
    /// A handler ran and failed or panicked. The message still counts as routed.
    Failed {
        strategy: Strategy,
        key: String,
        error: anyhow::Error,
    },
}

impl DispatchOutcome {
    /// `true` when some handler was invoked, whatever its result.
    pub fn is_handled(&self) -> bool {
        !matches!(self, DispatchOutcome::Unhandled)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DispatchOutcome::Failed { .. })
    }

    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            DispatchOutcome::Unhandled => None,
            DispatchOutcome::Handled { strategy, .. } | DispatchOutcome::Failed { strategy, .. } => {
                Some(*strategy)
            }
        }
    }

    /// Trigger key of the handler that ran.
    pub fn key(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Unhandled => None,
            DispatchOutcome::Handled { key, .. } | DispatchOutcome::Failed { key, .. } => Some(key),
        }
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            DispatchOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_display_matches_serde() {
        for strategy in [Strategy::Command, Strategy::Text, Strategy::State] {
            let json = serde_json::to_string(&strategy).unwrap();
            assert_eq!(json, format!("\"{strategy}\""));
        }
    }

    #[test]
    fn failed_counts_as_handled() {
        let outcome = DispatchOutcome::Failed {
            strategy: Strategy::State,
            key: "wait_name".to_string(),
            error: anyhow::anyhow!("boom"),
        };
        assert!(outcome.is_handled());
        assert!(outcome.is_failed());
        assert_eq!(outcome.strategy(), Some(Strategy::State));
        assert_eq!(outcome.key(), Some("wait_name"));
        assert_eq!(outcome.error().map(|e| e.to_string()).as_deref(), Some("boom"));
    }

    #[test]
    fn unhandled_has_no_key() {
        let outcome = DispatchOutcome::Unhandled;
        assert!(!outcome.is_handled());
        assert_eq!(outcome.key(), None);
        assert_eq!(outcome.strategy(), None);
    }
}
