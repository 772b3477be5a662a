use std::collections::VecDeque;

/// Notices retained at once; older ones are dropped first.
pub const MAX_NOTICES: usize = 5;

pub type NoticeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A dismissible banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub level: NoticeLevel,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Notices {
    last_id: NoticeId,
    items: VecDeque<Notice>,
}

impl Notices {
    pub(crate) fn push(&mut self, level: NoticeLevel, text: impl Into<String>) -> NoticeId {
        self.last_id += 1;
        self.items.push_back(Notice {
            id: self.last_id,
            level,
            text: text.into(),
        });
        while self.items.len() > MAX_NOTICES {
            self.items.pop_front();
        }
        self.last_id
    }

    pub(crate) fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.items.len();
        self.items.retain(|notice| notice.id != id);
        self.items.len() != before
    }

    pub(crate) fn to_vec(&self) -> Vec<Notice> {
        self.items.iter().cloned().collect()
    }
}
