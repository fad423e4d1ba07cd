use tracing::info;

use crate::{
    domain::{ChatId, ChatKind, ChatRecord, NOT_AVAILABLE},
    errors::Error,
    ports::{ChatPlatform, RawDialog, RawMessage},
    Result,
};

/// Pulls the dialog list and normalizes each entry into a [`ChatRecord`].
pub struct ChatInventory<'a> {
    platform: &'a dyn ChatPlatform,
}

impl<'a> ChatInventory<'a> {
    pub fn new(platform: &'a dyn ChatPlatform) -> Self {
        Self { platform }
    }

    /// Fetch and normalize every dialog. Any platform failure is a transport error.
    pub async fn fetch_all(&self) -> Result<Vec<ChatRecord>> {
        let dialogs = self.platform.fetch_dialogs().await.map_err(|e| match e {
            Error::Transport(_) => e,
            other => Error::Transport(other.to_string()),
        })?;
        info!(count = dialogs.len(), "dialogs fetched");
        Ok(dialogs.iter().map(normalize).collect())
    }
}

pub fn normalize(dialog: &RawDialog) -> ChatRecord {
    let chat = &dialog.chat;
    ChatRecord {
        id: ChatId(chat.id),
        title: or_na(chat.title.as_deref()),
        username: or_na(chat.username.as_deref()),
        last_message_snippet: snippet(dialog.top_message.as_ref()),
        description: or_na(chat.description.as_deref()),
        kind: ChatKind::from_tag(&chat.kind_tag),
    }
}

/// Text body, then caption, then "N/A". A broken message never fails the fetch.
fn snippet(msg: Option<&RawMessage>) -> String {
    let Some(msg) = msg else {
        return NOT_AVAILABLE.to_string();
    };
    if let Some(err) = &msg.extraction_error {
        return format!("Error: {err}");
    }
    msg.text
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| msg.caption.as_deref().filter(|s| !s.is_empty()))
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

fn or_na(v: Option<&str>) -> String {
    match v {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}
