//! Telegram update handlers.
//!
//! Only commands are served; they are gated to private chats with allow-listed
//! users before reaching the command handler.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::debug;

use tgf_core::{
    domain::UserId,
    security::{gate_trigger, GateDecision, TriggerOrigin},
};

use crate::router::AppState;

mod commands;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let origin = TriggerOrigin {
        user_id: msg.from().map(|u| UserId(u.id.0 as i64)),
        is_private_chat: msg.chat.is_private(),
    };

    match gate_trigger(origin, &state.cfg.telegram_allowed_users) {
        GateDecision::IgnoreNonPrivate => {
            debug!(chat_id = msg.chat.id.0, "ignoring message outside private chat");
            return Ok(());
        }
        GateDecision::Unauthorized => {
            let _ = bot
                .send_message(
                    msg.chat.id,
                    "Unauthorized. Contact the bot owner for access.",
                )
                .await;
            return Ok(());
        }
        GateDecision::Allow => {}
    }

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(bot, msg, state).await;
        }
    }

    let _ = bot
        .send_message(msg.chat.id, "Send /get to organize your chats into folders.")
        .await;

    Ok(())
}
