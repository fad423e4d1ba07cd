use crate::domain::UserId;

// ============== Authorization ==============

pub fn is_authorized(user_id: Option<UserId>, allowed_users: &[i64]) -> bool {
    let Some(user_id) = user_id else {
        return false;
    };
    if allowed_users.is_empty() {
        return false;
    }
    allowed_users.contains(&user_id.0)
}

/// Where a trigger came from, as far as gating is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerOrigin {
    pub user_id: Option<UserId>,
    pub is_private_chat: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Not a private chat; stay silent so groups are not spammed.
    IgnoreNonPrivate,
    Unauthorized,
}

/// Organize runs are only accepted in private chats from allow-listed users.
pub fn gate_trigger(origin: TriggerOrigin, allowed_users: &[i64]) -> GateDecision {
    if !origin.is_private_chat {
        return GateDecision::IgnoreNonPrivate;
    }
    if !is_authorized(origin.user_id, allowed_users) {
        return GateDecision::Unauthorized;
    }
    GateDecision::Allow
}
