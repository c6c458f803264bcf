use crate::models::{Notice, NoticeLevel};
use chrono::Local;
use std::{collections::VecDeque, sync::Arc};
use tokio::sync::Mutex;

const CAPACITY: usize = 32;

/// Bounded queue of user-facing notifications; the oldest entry is dropped when full.
#[derive(Clone, Default)]
pub struct NoticeBoard {
    queue: Arc<Mutex<VecDeque<Notice>>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn post(
        &self,
        level: NoticeLevel,
        practice_id: &str,
        unit: Option<u64>,
        message: impl Into<String>,
    ) {
        let notice = Notice {
            level,
            practice_id: practice_id.to_string(),
            unit,
            message: message.into(),
            at: Local::now().to_rfc3339(),
        };

        let mut queue = self.queue.lock().await;
        if queue.len() == CAPACITY {
            queue.pop_front();
        }
        queue.push_back(notice);
    }

    pub async fn drain(&self) -> Vec<Notice> {
        self.queue.lock().await.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_empties_the_queue_in_order() {
        let board = NoticeBoard::new();
        board.post(NoticeLevel::Success, "ram", Some(1), "first").await;
        board.post(NoticeLevel::Error, "ram", Some(2), "second").await;

        let notices = board.drain().await;
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].message, "first");
        assert_eq!(notices[1].level, NoticeLevel::Error);
        assert_eq!(notices[1].unit, Some(2));
        assert!(board.drain().await.is_empty());
    }

    #[tokio::test]
    async fn oldest_notice_is_dropped_when_full() {
        let board = NoticeBoard::new();
        for index in 0..CAPACITY + 3 {
            board.post(NoticeLevel::Success, "ram", None, index.to_string()).await;
        }

        let notices = board.drain().await;
        assert_eq!(notices.len(), CAPACITY);
        assert_eq!(notices[0].message, "3");
    }
}
