//! Demo conversation: a short onboarding questionnaire.
//!
//! `/start` asks for a name, then an age, then prints a summary. `/cancel`
//! leaves the questionnaire at any point, `/status` shows where the user is.

use teloxide::Bot;

use tgflow_dispatch::{DispatcherBuilder, HandlerModule, HandlerResult, InteractionContext};
use tgflow_telegram::ReplyExt;

pub const WAIT_NAME: &str = "wait_name";
pub const WAIT_AGE: &str = "wait_age";

const NAME_KEY: &str = "name";

pub struct Onboarding;

impl HandlerModule<Bot> for Onboarding {
    fn register(&self, builder: &mut DispatcherBuilder<Bot>) {
        builder
            .command("start", "Start the questionnaire", start)
            .command("cancel", "Leave the questionnaire", cancel)
            .command("status", "Show your current step", status)
            .text("hello", hello)
            .state(WAIT_NAME, on_name)
            .state(WAIT_AGE, on_age);
    }
}

async fn start(ctx: InteractionContext<Bot>) -> HandlerResult {
    if let Some(payload) = ctx.args() {
        tracing::info!(payload, "start with deep-link payload");
    }
    ctx.set_state(WAIT_NAME);
    ctx.reply("Hi! What is your name?").await?;
    Ok(())
}

async fn cancel(ctx: InteractionContext<Bot>) -> HandlerResult {
    let reply = if ctx.clear_state() {
        "Cancelled. Send /start to begin again."
    } else {
        "Nothing to cancel."
    };
    ctx.reply(reply).await?;
    Ok(())
}

async fn status(ctx: InteractionContext<Bot>) -> HandlerResult {
    let reply = match ctx.state() {
        Some(state) => format!("Current step: {state}"),
        None => "No questionnaire in progress.".to_string(),
    };
    ctx.reply(&reply).await?;
    Ok(())
}

async fn hello(ctx: InteractionContext<Bot>) -> HandlerResult {
    let name = ctx
        .sender()
        .map(|s| s.first_name.clone())
        .unwrap_or_else(|| "there".to_string());
    ctx.reply(&format!("Hello, {name}!")).await?;
    Ok(())
}

async fn on_name(ctx: InteractionContext<Bot>) -> HandlerResult {
    let name = ctx.text().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        ctx.reply("Please send your name as text.").await?;
        return Ok(());
    }
    ctx.set_data(NAME_KEY, name.to_string());
    ctx.set_state(WAIT_AGE);
    ctx.reply(&format!("Nice to meet you, {name}. How old are you?"))
        .await?;
    Ok(())
}

async fn on_age(ctx: InteractionContext<Bot>) -> HandlerResult {
    let Some(age) = ctx.text().and_then(parse_age) else {
        ctx.reply("Please send your age as a number.").await?;
        return Ok(());
    };
    let name: String = ctx.get_data(NAME_KEY).unwrap_or_default();
    ctx.clear_state();
    ctx.reply(&summary(&name, age)).await?;
    Ok(())
}

pub fn parse_age(text: &str) -> Option<u8> {
    text.trim().parse::<u8>().ok().filter(|age| (1..=130).contains(age))
}

fn summary(name: &str, age: u8) -> String {
    format!("Thanks! Name: {name}, age: {age}.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tgflow_dispatch::{Dispatcher, Strategy};
    use tgflow_sessions::SessionStore;

    #[test]
    fn module_registers_without_rejections() {
        let mut builder = Dispatcher::<Bot>::builder(Arc::new(SessionStore::default()));
        builder.module(&Onboarding);
        assert!(builder.rejected().is_empty());

        let dispatcher = builder.build();
        let commands: Vec<_> = dispatcher.commands().into_iter().map(|c| c.command).collect();
        assert_eq!(commands, ["start", "cancel", "status"]);
        assert!(dispatcher.registry(Strategy::State).contains(WAIT_NAME));
        assert!(dispatcher.registry(Strategy::State).contains(WAIT_AGE));
        assert!(dispatcher.registry(Strategy::Text).contains("hello"));
    }

    #[test]
    fn age_parsing() {
        assert_eq!(parse_age(" 31 "), Some(31));
        assert_eq!(parse_age("0"), None);
        assert_eq!(parse_age("131"), None);
        assert_eq!(parse_age("old"), None);
    }

    #[test]
    fn summary_mentions_answers() {
        assert_eq!(summary("Ann", 30), "Thanks! Name: Ann, age: 30.");
    }
}
