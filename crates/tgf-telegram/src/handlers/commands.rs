use std::sync::Arc;

use teloxide::{prelude::*, types::ChatAction};
use tracing::{info, warn};

use tgf_core::{artifacts::DirArtifactStore, planner::OrganizationPlanner};

use crate::router::AppState;

/// Telegram rejects messages above 4096 chars; leave room for the ellipsis.
const SAFE_MESSAGE_LEN: usize = 4000;

const HELP_TEXT: &str = "📁 Chat folder organizer\n\n\
Commands:\n\
/get - Classify your groups and channels and create folders\n\
/organize - Same as /get\n\
/help - Show this message\n\n\
Topic folders are created from an AI classification of your groups and channels, \
plus a Personal folder for private chats and a Bots folder for bots.";

const BUSY_TEXT: &str = "⏳ An organization run is already in progress.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Organize,
    Help,
    Unknown,
}

fn parse_command(text: &str) -> String {
    // Telegram may send `/cmd@botname arg1 ...`; arguments are ignored.
    text.split_whitespace()
        .next()
        .unwrap_or("")
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

fn classify_command(name: &str) -> Command {
    match name {
        "get" | "organize" => Command::Organize,
        "start" | "help" => Command::Help,
        _ => Command::Unknown,
    }
}

/// Cut `text` to at most `limit` bytes on a char boundary, marking the cut.
fn fit_message(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit.saturating_sub(3);
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

async fn reply(bot: &Bot, msg: &Message, text: &str) {
    if let Err(e) = bot
        .send_message(msg.chat.id, fit_message(text, SAFE_MESSAGE_LEN))
        .await
    {
        warn!(chat_id = msg.chat.id.0, error = %e, "failed to send reply");
    }
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let cmd = parse_command(text);

    match classify_command(&cmd) {
        Command::Help => {
            reply(&bot, &msg, HELP_TEXT).await;
            Ok(())
        }
        Command::Organize => {
            let text = run_organize(&bot, &msg, &state).await;
            reply(&bot, &msg, &text).await;
            Ok(())
        }
        Command::Unknown => {
            reply(&bot, &msg, &format!("Unknown command: /{cmd}\n\n{HELP_TEXT}")).await;
            Ok(())
        }
    }
}

/// Run one organization pass and return the single reply text.
async fn run_organize(bot: &Bot, msg: &Message, state: &AppState) -> String {
    // One run per account at a time.
    let Ok(_guard) = state.run_lock.try_lock() else {
        info!(chat_id = msg.chat.id.0, "organize requested while a run is active");
        return BUSY_TEXT.to_string();
    };

    let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;
    info!(chat_id = msg.chat.id.0, "organization run started");

    let artifacts = DirArtifactStore::for_run(&state.cfg.artifact_dir, state.cfg.keep_artifacts);
    let mut planner = OrganizationPlanner::new(
        state.platform.as_ref(),
        state.classifier.as_ref(),
        &artifacts,
        &state.settings,
    );

    match planner.run().await {
        Ok(report) => report.render(),
        Err(failure) => failure.render(),
    }
}
