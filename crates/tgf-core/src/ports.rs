use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChatRecord, FolderAllocation},
    Result,
};

/// Dialog as delivered by the platform, before normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDialog {
    pub chat: RawChat,
    #[serde(default)]
    pub top_message: Option<RawMessage>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChat {
    pub id: i64,
    /// Platform chat-type label, e.g. `CHANNEL` or `ChatType.PRIVATE`.
    #[serde(rename = "type")]
    pub kind_tag: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    /// Set by adapters that failed to decode the message body.
    #[serde(default)]
    pub extraction_error: Option<String>,
}

/// Hexagonal port for the messaging platform account.
///
/// `fetch_dialogs` failures are reported as `Error::Transport`, `update_folder`
/// failures as `Error::Platform`.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Pull the full dialog list. Adapters that page internally must drain
    /// every page before returning.
    async fn fetch_dialogs(&self) -> Result<Vec<RawDialog>>;

    /// Create or overwrite the folder with `folder.folder_id`.
    async fn update_folder(&self, folder: &FolderAllocation) -> Result<()>;

    /// Folders already present on the account.
    async fn existing_folders(&self) -> Result<Vec<FolderAllocation>> {
        Ok(Vec::new())
    }
}

/// Hexagonal port for the topic classifier.
///
/// Returns the raw response text; parsing and validation stay in the core.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, chats: &[ChatRecord]) -> Result<String>;
}
