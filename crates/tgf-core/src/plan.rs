//! Classifier prompt + response validation.
//!
//! The classifier is untrusted: anything outside the contract fails the run
//! with `Error::Classification` before a single folder is touched.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::{
    domain::{ChatId, ChatRecord, TopicGroup},
    errors::Error,
    Result,
};

/// Bounds applied to classifier output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanLimits {
    /// Platform folder-title limit (chars). Longer labels are truncated on creation.
    pub folder_title_max_chars: usize,
    /// Labels longer than this are rejected outright.
    pub topic_label_max_chars: usize,
    /// Maximum number of topic groups per plan.
    pub max_topics: usize,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            folder_title_max_chars: 12,
            topic_label_max_chars: 64,
            max_topics: 7,
        }
    }
}

/// Build the classification prompt for the group/channel bucket.
pub fn build_prompt(chats: &[ChatRecord], limits: &PlanLimits) -> Result<String> {
    let payload = serde_json::to_string(chats)?;
    Ok(format!(
        "Based on this list of chats, return them organized parent/child, grouped by topic.\n\
Rules:\n\
- each topic name is at most {title} characters and includes an emoji\n\
- topic names may be Persian or English\n\
- at most {topics} topics\n\
- only use chat_id values from the list\n\
Respond with JSON only, in this format:\n\
[\n  {{\n    \"topic\": \"topicname\",\n    \"chats\": [\n      {{ \"chat_id\": -1002426650556, \"type\": \"CHANNEL\" }}\n    ]\n  }}\n]\n\n\
{payload}",
        title = limits.folder_title_max_chars,
        topics = limits.max_topics,
    ))
}

fn code_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n(.*?)\n?\s*```\s*$").expect("valid fence regex")
    })
}

/// Strip a surrounding Markdown code fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    match code_fence_re().captures(raw).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => raw.trim(),
    }
}

/// Parse and validate a raw classifier response against the group/channel bucket.
pub fn validate_response(
    raw: &str,
    bucket: &[ChatRecord],
    limits: &PlanLimits,
) -> Result<Vec<TopicGroup>> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::Classification(format!("response is not valid JSON: {e}")))?;

    let Value::Array(items) = value else {
        return Err(Error::Classification(
            "response is not a JSON array".to_string(),
        ));
    };

    if items.len() > limits.max_topics {
        return Err(Error::Classification(format!(
            "{} topics returned, at most {} allowed",
            items.len(),
            limits.max_topics
        )));
    }

    let known: HashSet<ChatId> = bucket.iter().map(|r| r.id).collect();
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| validate_group(idx, item, &known, limits))
        .collect()
}

fn validate_group(
    idx: usize,
    item: &Value,
    known: &HashSet<ChatId>,
    limits: &PlanLimits,
) -> Result<TopicGroup> {
    let invalid = |reason: String| Error::Classification(format!("topic #{}: {reason}", idx + 1));

    let obj = item
        .as_object()
        .ok_or_else(|| invalid("not an object".to_string()))?;

    let label = obj
        .get("topic")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("missing topic label".to_string()))?;

    let label_len = label.chars().count();
    if label_len > limits.topic_label_max_chars {
        return Err(invalid(format!(
            "label is {label_len} chars, limit is {}",
            limits.topic_label_max_chars
        )));
    }

    let chats = obj
        .get("chats")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(format!("'{label}' has no chats array")))?;

    let mut seen = HashSet::new();
    let mut members = Vec::with_capacity(chats.len());
    for chat in chats {
        let id = chat
            .get("chat_id")
            .and_then(Value::as_i64)
            .map(ChatId)
            .ok_or_else(|| invalid(format!("'{label}' has an entry without an integer chat_id")))?;
        if !known.contains(&id) {
            return Err(invalid(format!("'{label}' references unknown chat {}", id.0)));
        }
        if seen.insert(id) {
            members.push(id);
        }
    }

    if members.is_empty() {
        return Err(invalid(format!("'{label}' has no chats")));
    }

    Ok(TopicGroup {
        topic_label: label.to_string(),
        member_chat_ids: members,
    })
}

/// Truncate to at most `max` chars without splitting a code point.
pub fn truncate_title(title: &str, max: usize) -> String {
    title.chars().take(max).collect()
}
