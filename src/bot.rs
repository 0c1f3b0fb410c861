use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use tracing::{debug, info, warn};

use crate::pipeline::Pipeline;

const HELP_TEXT: &str = "Commands:\n\
                         /post <codename> - Announce the latest build for a device\n\
                         /id - Show your Telegram user ID";

/// Commands the bot reacts to. Anything else is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Post(Vec<String>),
    Id,
    Help,
}

/// Parse `/command[@botname] args...`.
fn parse_command(text: &str) -> Option<Command> {
    let mut words = text.split_whitespace();
    let head = words.next()?.strip_prefix('/')?;
    let name = head.split('@').next().unwrap_or(head);

    match name.to_lowercase().as_str() {
        "post" => Some(Command::Post(words.map(str::to_string).collect())),
        "id" => Some(Command::Id),
        "start" | "help" => Some(Command::Help),
        _ => None,
    }
}

/// Start the Telegram bot
pub async fn run(bot: Bot, pipeline: Arc<Pipeline>) -> Result<()> {
    info!("Starting Telegram bot...");

    // Skip commands that piled up while the bot was offline
    if let Err(e) = bot.delete_webhook().drop_pending_updates(true).await {
        warn!("Failed to drop pending updates: {}", e);
    }

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![pipeline])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram bot stopped");
    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, pipeline: Arc<Pipeline>) -> ResponseResult<()> {
    let user_id = match msg.from.as_ref() {
        Some(user) => user.id.0,
        None => return Ok(()),
    };

    let command = match msg.text().and_then(parse_command) {
        Some(c) => c,
        None => return Ok(()),
    };

    info!("Command from user {}: {:?}", user_id, command);

    let reply = match command {
        Command::Post(args) => pipeline.handle_post(user_id, args.as_slice()).await,
        Command::Id => pipeline.handle_id(user_id),
        Command::Help => HELP_TEXT.to_string(),
    };

    bot.send_message(msg.chat.id, reply)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    Ok(())
}
