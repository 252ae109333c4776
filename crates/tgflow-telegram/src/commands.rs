//! Publishing registered commands as the bot's command menu.

use teloxide::requests::Requester;
use teloxide::types::BotCommand;
use teloxide::Bot;
use tracing::info;

use tgflow_dispatch::CommandInfo;

use crate::error::Result;

pub fn to_bot_commands(commands: &[CommandInfo]) -> Vec<BotCommand> {
    commands
        .iter()
        .map(|c| BotCommand::new(c.command.as_str(), c.description.as_str()))
        .collect()
}

/// Replace the bot's command menu with `commands`.
///
/// The old menu is deleted first, so commands removed from the code also
/// disappear from clients.
pub async fn publish_commands(bot: &Bot, commands: &[CommandInfo]) -> Result<()> {
    bot.delete_my_commands().await?;
    if !commands.is_empty() {
        bot.set_my_commands(to_bot_commands(commands)).await?;
    }
    info!(count = commands.len(), "Telegram: command menu published");
    Ok(())
}
