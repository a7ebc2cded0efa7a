//! Command and message handlers for the Telegram bot.

use std::sync::Arc;

use relaybot_core::Relay;
use teloxide::prelude::*;
use teloxide::types::ChatAction;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "Forget the conversation so far")]
    Reset,
}

/// What an incoming text asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum TextKind<'a> {
    /// A known command.
    Command(Command),
    /// A `/word` that is not one of ours.
    UnknownCommand(&'a str),
    /// Anything else goes to the model.
    Chat(&'a str),
}

/// Classify message text without the bot framework.
///
/// Accepts the `/command@BotName` form Telegram uses in groups.
pub fn classify(text: &str) -> TextKind<'_> {
    let text = text.trim();
    let Some(rest) = text.strip_prefix('/') else {
        return TextKind::Chat(text);
    };

    let word = rest.split_whitespace().next().unwrap_or_default();
    let name = word.split('@').next().unwrap_or_default();
    match name.to_ascii_lowercase().as_str() {
        "start" => TextKind::Command(Command::Start),
        "help" => TextKind::Command(Command::Help),
        "reset" => TextKind::Command(Command::Reset),
        _ => TextKind::UnknownCommand(text.split_whitespace().next().unwrap_or(text)),
    }
}

/// Greeting sent for /start.
pub fn start_text(relay: &Relay) -> String {
    let memory = if relay.history().is_enabled() {
        format!(
            "I remember the last {} messages of our chat; /reset clears them.",
            relay.history().max_turns()
        )
    } else {
        "Every message is answered on its own.".to_string()
    };

    format!(
        "Hello! Bot is working.\n\n\
        Send me any message and I will pass it to the language model \
        and reply with its answer.\n\n{}",
        memory
    )
}

/// The text answering a command.
pub async fn command_reply(cmd: &Command, relay: &Relay, chat_id: i64) -> String {
    match cmd {
        Command::Start => start_text(relay),
        Command::Help => Command::descriptions().to_string(),
        Command::Reset => {
            if relay.reset(chat_id).await {
                info!(chat_id = %chat_id, "Conversation reset");
                "Conversation cleared.".to_string()
            } else {
                "Nothing to forget yet.".to_string()
            }
        }
    }
}

/// Handle a parsed command.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    relay: Arc<Relay>,
) -> ResponseResult<()> {
    let reply = command_reply(&cmd, &relay, msg.chat.id.0).await;
    bot.send_message(msg.chat.id, reply).await?;
    debug!(chat_id = %msg.chat.id, command = ?cmd, "Command handled");
    Ok(())
}

/// Handle a `/word` that did not parse as a command.
pub async fn handle_unknown_command(bot: Bot, msg: Message) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        info!(cmd = %text, "Unrecognized command - sending response");
        bot.send_message(
            msg.chat.id,
            format!(
                "Unknown command: {}\n\nUse /help to see available commands.",
                text.split_whitespace().next().unwrap_or(text)
            ),
        )
        .await?;
    }
    Ok(())
}

/// Handle a regular text message: relay it to the model and send the reply.
pub async fn handle_message(bot: Bot, msg: Message, relay: Arc<Relay>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if let Err(e) = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await {
        warn!(chat_id = %msg.chat.id, error = %e, "Failed to send typing indicator");
    }

    let reply = relay.respond(msg.chat.id.0, text).await;
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
