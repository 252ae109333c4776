use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::command::is_valid_command_name;
use crate::error::{RegistrationError, Result};
use crate::types::{CommandInfo, Handler, HandlerEntry, Strategy};

/// Longest command description the host platform accepts.
pub const MAX_DESCRIPTION_LEN: usize = 256;

/// Trigger key to handler mapping for one dispatch strategy.
///
/// Filled during startup, read-only afterwards. Entries keep registration
/// order so command metadata is published in the order it was declared.
pub struct HandlerRegistry<B> {
    strategy: Strategy,
    entries: Vec<HandlerEntry<B>>,
    index: HashMap<String, usize>,
}

impl<B> HandlerRegistry<B> {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Bind `handler` to `key`.
    ///
    /// Command keys may be written with or without the leading `/` and must
    /// carry a description. A key that is already bound keeps its first handler.
    pub fn register(
        &mut self,
        key: &str,
        description: Option<&str>,
        handler: Arc<dyn Handler<B>>,
    ) -> Result<()> {
        let (key, description) = match self.strategy {
            Strategy::Command => {
                let (command, description) = validate_command(key, description)?;
                (command, Some(description))
            }
            Strategy::Text | Strategy::State => {
                if key.is_empty() {
                    return Err(RegistrationError::EmptyKey {
                        strategy: self.strategy,
                    });
                }
                (key.to_string(), description.map(str::to_string))
            }
        };

        if self.index.contains_key(&key) {
            return Err(RegistrationError::Duplicate {
                strategy: self.strategy,
                key,
            });
        }

        debug!(strategy = %self.strategy, key = %key, "handler registered");
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(HandlerEntry {
            key,
            description,
            handler,
        });
        Ok(())
    }

    pub fn lookup(&self, key: &str) -> Option<&HandlerEntry<B>> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &HandlerEntry<B>> {
        self.entries.iter()
    }

    /// `(command, description)` pairs in registration order.
    ///
    /// Entries without a description are skipped; only the command registry
    /// has any.
    pub fn commands(&self) -> Vec<CommandInfo> {
        self.entries
            .iter()
            .filter_map(|e| {
                e.description.as_ref().map(|d| CommandInfo {
                    command: e.key.clone(),
                    description: d.clone(),
                })
            })
            .collect()
    }
}

fn validate_command(key: &str, description: Option<&str>) -> Result<(String, String)> {
    let command = key.strip_prefix('/').unwrap_or(key);
    if command.is_empty() {
        return Err(RegistrationError::EmptyKey {
            strategy: Strategy::Command,
        });
    }
    // Commands are matched lowercased, so an uppercase name could never fire.
    if !is_valid_command_name(command) || command.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(RegistrationError::InvalidCommand {
            command: command.to_string(),
        });
    }

    let description = description.map(str::trim).unwrap_or_default();
    if description.is_empty() {
        return Err(RegistrationError::MissingDescription {
            command: command.to_string(),
        });
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(RegistrationError::DescriptionTooLong {
            command: command.to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok((command.to_string(), description.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InteractionContext;

    fn noop() -> Arc<dyn Handler<()>> {
        Arc::new(|_ctx: InteractionContext<()>| async { anyhow::Ok(()) })
    }

    #[test]
    fn lookup_after_register() {
        let mut reg = HandlerRegistry::new(Strategy::State);
        reg.register("wait_mes1", None, noop()).unwrap();
        assert!(reg.lookup("wait_mes1").is_some());
        assert!(reg.lookup("wait_mes2").is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn first_registration_wins() {
        let mut reg = HandlerRegistry::new(Strategy::Command);
        reg.register("start", Some("first"), noop()).unwrap();
        let err = reg.register("/start", Some("second"), noop()).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::Duplicate {
                strategy: Strategy::Command,
                key: "start".to_string()
            }
        );
        assert_eq!(reg.lookup("start").unwrap().description.as_deref(), Some("first"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn command_rules() {
        let mut reg = HandlerRegistry::new(Strategy::Command);
        assert!(matches!(
            reg.register("start", None, noop()),
            Err(RegistrationError::MissingDescription { .. })
        ));
        assert!(matches!(
            reg.register("start", Some("   "), noop()),
            Err(RegistrationError::MissingDescription { .. })
        ));
        assert!(matches!(
            reg.register("Start", Some("x"), noop()),
            Err(RegistrationError::InvalidCommand { .. })
        ));
        assert!(matches!(
            reg.register("sta rt", Some("x"), noop()),
            Err(RegistrationError::InvalidCommand { .. })
        ));
        assert!(matches!(
            reg.register("/", Some("x"), noop()),
            Err(RegistrationError::EmptyKey { .. })
        ));
        let long = "d".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(matches!(
            reg.register("help", Some(&long), noop()),
            Err(RegistrationError::DescriptionTooLong { .. })
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn empty_text_key_rejected() {
        let mut reg = HandlerRegistry::new(Strategy::Text);
        assert_eq!(
            reg.register("", None, noop()).unwrap_err(),
            RegistrationError::EmptyKey {
                strategy: Strategy::Text
            }
        );
    }

    #[test]
    fn commands_keep_registration_order() {
        let mut reg = HandlerRegistry::new(Strategy::Command);
        reg.register("start", Some("Start over"), noop()).unwrap();
        reg.register("/help", Some("Show help"), noop()).unwrap();
        reg.register("cancel", Some("Cancel the current step"), noop())
            .unwrap();

        let names: Vec<_> = reg.commands().into_iter().map(|c| c.command).collect();
        assert_eq!(names, ["start", "help", "cancel"]);
    }

    #[test]
    fn text_keys_are_verbatim() {
        let mut reg = HandlerRegistry::new(Strategy::Text);
        reg.register("Hello", None, noop()).unwrap();
        assert!(reg.contains("Hello"));
        assert!(!reg.contains("hello"));
        assert!(reg.commands().is_empty());
    }
}
