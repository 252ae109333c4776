//! Command extraction from message text.
//!
//! Recognises `/name`, `/name@bot_username` and either form followed by
//! whitespace-separated arguments. Anything else is "not a command", which
//! the dispatcher treats as a miss rather than an error.

use serde::{Deserialize, Serialize};

/// Longest command name the host platform accepts.
pub const MAX_COMMAND_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommand {
    /// Lowercased command name without `/`.
    pub name: String,
    /// Bot username after `@`, as written by the user.
    pub mention: Option<String>,
    /// Everything after the first run of whitespace, trimmed.
    pub args: Option<String>,
}

impl ParsedCommand {
    /// Whether the command may be meant for the bot called `username`.
    ///
    /// Commands without a mention are addressed to every bot in the chat.
    pub fn is_addressed_to(&self, username: &str) -> bool {
        match &self.mention {
            Some(mention) => mention.eq_ignore_ascii_case(username),
            None => true,
        }
    }
}

/// Parse `text` as a bot command. Returns `None` if it is not one.
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    let rest = text.strip_prefix('/')?;

    let (head, args) = match rest.find(char::is_whitespace) {
        Some(pos) => {
            let args = rest[pos..].trim();
            (&rest[..pos], (!args.is_empty()).then(|| args.to_string()))
        }
        None => (rest, None),
    };

    let (name, mention) = match head.split_once('@') {
        Some((name, mention)) => (name, Some(mention)),
        None => (head, None),
    };

    if !is_valid_command_name(name) {
        return None;
    }
    if let Some(mention) = mention {
        if mention.is_empty() || !mention.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
    }

    Some(ParsedCommand {
        name: name.to_ascii_lowercase(),
        mention: mention.map(str::to_string),
        args,
    })
}

/// 1 to [`MAX_COMMAND_LEN`] ASCII letters, digits or underscores.
pub(crate) fn is_valid_command_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_COMMAND_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_command() {
        let cmd = parse_command("/start").unwrap();
        assert_eq!(cmd.name, "start");
        assert_eq!(cmd.mention, None);
        assert_eq!(cmd.args, None);
    }

    #[test]
    fn command_with_args() {
        let cmd = parse_command("/remind   10m  buy milk ").unwrap();
        assert_eq!(cmd.name, "remind");
        assert_eq!(cmd.args.as_deref(), Some("10m  buy milk"));
    }

    #[test]
    fn command_with_mention_and_args() {
        let cmd = parse_command("/start@flow_bot deep_link").unwrap();
        assert_eq!(cmd.name, "start");
        assert_eq!(cmd.mention.as_deref(), Some("flow_bot"));
        assert_eq!(cmd.args.as_deref(), Some("deep_link"));
    }

    #[test]
    fn args_on_next_line() {
        let cmd = parse_command("/note\nfirst line").unwrap();
        assert_eq!(cmd.name, "note");
        assert_eq!(cmd.args.as_deref(), Some("first line"));
    }

    #[test]
    fn name_is_lowercased() {
        assert_eq!(parse_command("/Start").unwrap().name, "start");
    }

    #[test]
    fn non_commands_are_rejected() {
        assert!(parse_command("hello").is_none());
        assert!(parse_command("").is_none());
        assert!(parse_command("/").is_none());
        assert!(parse_command(" /start").is_none());
        assert!(parse_command("/ start").is_none());
        assert!(parse_command("/start@").is_none());
        assert!(parse_command("/st-art").is_none());
        assert!(parse_command(&format!("/{}", "a".repeat(MAX_COMMAND_LEN + 1))).is_none());
    }

    #[test]
    fn addressed_to_matches_mention_case_insensitively() {
        let mentioned = parse_command("/start@Flow_Bot").unwrap();
        assert!(mentioned.is_addressed_to("flow_bot"));
        assert!(!mentioned.is_addressed_to("other_bot"));
        assert!(parse_command("/start").unwrap().is_addressed_to("anyone"));
    }
}
