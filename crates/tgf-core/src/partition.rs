use crate::domain::{ChatKind, ChatRecord};

/// The inventory split by kind. Each record lands in at most one bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partition {
    pub group_channel: Vec<ChatRecord>,
    pub private: Vec<ChatRecord>,
    pub bots: Vec<ChatRecord>,
}

impl Partition {
    pub fn total(&self) -> usize {
        self.group_channel.len() + self.private.len() + self.bots.len()
    }
}

/// Split records into group/channel, private and bot buckets.
///
/// `ChatKind::Other` is dropped; there is no catch-all bucket.
pub fn partition(records: Vec<ChatRecord>) -> Partition {
    let mut out = Partition::default();
    for rec in records {
        match rec.kind {
            ChatKind::Group | ChatKind::Supergroup | ChatKind::Channel => {
                out.group_channel.push(rec)
            }
            ChatKind::Private => out.private.push(rec),
            ChatKind::Bot => out.bots.push(rec),
            ChatKind::Other => {}
        }
    }
    out
}
