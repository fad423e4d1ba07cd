//! Telegram trigger surface (teloxide).
//!
//! Accepts the organize command from allow-listed users in private chats and
//! replies with the run summary.

pub mod handlers;
pub mod router;
