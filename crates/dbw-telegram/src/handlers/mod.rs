//! Telegram update handlers.
//!
//! Converts a teloxide `Message` into a transport-neutral `Command` and hands
//! it to the core dispatcher, which owns the operator check.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use dbw_core::{domain::ChatId, messaging::types::Command};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = ChatId(msg.chat.id.0);

    let Some(text) = msg.text() else {
        tracing::debug!(chat_id = chat_id.0, "ignoring non-text message");
        return Ok(());
    };

    let username = msg.from().and_then(|u| u.username.clone());
    let cmd = Command::parse(chat_id, username, text);

    state.dispatcher.handle(cmd).await;
    Ok(())
}
