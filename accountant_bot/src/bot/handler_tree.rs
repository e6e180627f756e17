use anyhow::Result;
use teloxide::{
    Bot,
    dispatching::{DpHandlerDescription, HandlerExt, UpdateFilterExt},
    dptree::{self, Handler},
    prelude::Requester,
    types::{Message, Update},
};

use accountant_core::helpers::bot_commands::Command;

use super::answers::answers;

async fn handle_unknown(bot: Bot, msg: Message) -> Result<()> {
    if msg.text().is_some_and(|text| text.starts_with('/')) {
        bot.send_message(msg.chat.id, "Unknown command. Use /help to see what I can do.")
            .await?;
    }
    Ok(())
}

pub fn handler_tree() -> Handler<'static, Result<()>, DpHandlerDescription> {
    dptree::entry().branch(
        Update::filter_message()
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(answers),
            )
            .branch(dptree::entry().endpoint(handle_unknown)),
    )
}
