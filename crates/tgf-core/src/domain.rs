use std::fmt;

use serde::{Deserialize, Serialize};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric, negative for groups and channels).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// Platform folder id. Telegram accepts a small positive range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(pub i32);

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Placeholder stored for absent optional chat fields.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatKind {
    Group,
    Supergroup,
    Channel,
    Private,
    Bot,
    Other,
}

impl ChatKind {
    /// Map a platform chat-type label (`CHANNEL`, `ChatType.BOT`, `supergroup`...).
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim();
        let tag = tag.rsplit('.').next().unwrap_or(tag);
        match tag.to_ascii_uppercase().as_str() {
            "GROUP" => ChatKind::Group,
            "SUPERGROUP" => ChatKind::Supergroup,
            "CHANNEL" => ChatKind::Channel,
            "PRIVATE" => ChatKind::Private,
            "BOT" => ChatKind::Bot,
            _ => ChatKind::Other,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            ChatKind::Group => "GROUP",
            ChatKind::Supergroup => "SUPERGROUP",
            ChatKind::Channel => "CHANNEL",
            ChatKind::Private => "PRIVATE",
            ChatKind::Bot => "BOT",
            ChatKind::Other => "OTHER",
        }
    }
}

/// One normalized dialog. Field names match what the classifier receives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    #[serde(rename = "chat_id")]
    pub id: ChatId,
    pub title: String,
    pub username: String,
    #[serde(rename = "last_message")]
    pub last_message_snippet: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ChatKind,
}

/// A validated classifier group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicGroup {
    #[serde(rename = "topic")]
    pub topic_label: String,
    #[serde(rename = "chats")]
    pub member_chat_ids: Vec<ChatId>,
}

/// Which chats a folder shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MembershipRule {
    /// An explicit list of included chats.
    Chats { chat_ids: Vec<ChatId> },
    /// Every private chat (contacts and non-contacts).
    AllPrivate,
    /// Every chat with a bot.
    AllBots,
}

/// A folder issued by the allocator during one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderAllocation {
    pub folder_id: FolderId,
    pub title: String,
    pub membership_rule: MembershipRule,
}

/// One folder the planner intends to create.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlannedFolder {
    pub title: String,
    pub rule: MembershipRule,
    /// Number of chats the folder is expected to show.
    pub chat_count: usize,
}

/// Topic folders followed by the two categorical folders.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OrganizationPlan {
    pub folders: Vec<PlannedFolder>,
}

impl OrganizationPlan {
    pub fn new(
        topics: Vec<TopicGroup>,
        personal_title: &str,
        private_count: usize,
        bots_title: &str,
        bot_count: usize,
    ) -> Self {
        let mut folders: Vec<PlannedFolder> = topics
            .into_iter()
            .map(|t| PlannedFolder {
                chat_count: t.member_chat_ids.len(),
                title: t.topic_label,
                rule: MembershipRule::Chats {
                    chat_ids: t.member_chat_ids,
                },
            })
            .collect();
        folders.push(PlannedFolder {
            title: personal_title.to_string(),
            rule: MembershipRule::AllPrivate,
            chat_count: private_count,
        });
        folders.push(PlannedFolder {
            title: bots_title.to_string(),
            rule: MembershipRule::AllBots,
            chat_count: bot_count,
        });
        Self { folders }
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}
