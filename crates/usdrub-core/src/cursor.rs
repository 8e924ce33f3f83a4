use std::{collections::HashMap, time::Duration};

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::{ChatId, Side};

/// Which page a requester asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageRequest {
    /// Reset the cursor and show page 0.
    First,
    /// Advance by one page, holding at the last page.
    Next,
}

/// One page of a ranked view as delivered to a requester.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub lines: Vec<String>,
    pub index: usize,
    pub page_count: usize,
    pub has_more: bool,
}

impl PageView {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
struct Cursor {
    index: usize,
    touched: Instant,
}

/// Per-requester positions within the buy and sell page sets.
///
/// The page count is passed on every call, so a cursor left pointing past the
/// end of a shrunken page set is pulled back to the last page.
#[derive(Debug, Default)]
pub struct CursorTracker {
    cursors: Mutex<HashMap<(ChatId, Side), Cursor>>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `request` to a page index, or `None` when there are no pages.
    pub async fn advance(
        &self,
        requester: ChatId,
        side: Side,
        request: PageRequest,
        page_count: usize,
    ) -> Option<usize> {
        let now = Instant::now();
        let mut cursors = self.cursors.lock().await;
        let cursor = cursors.entry((requester, side)).or_insert(Cursor {
            index: 0,
            touched: now,
        });

        cursor.touched = now;
        cursor.index = match request {
            PageRequest::First => 0,
            PageRequest::Next => cursor.index + 1,
        };

        if page_count == 0 {
            cursor.index = 0;
            return None;
        }
        cursor.index = cursor.index.min(page_count - 1);
        Some(cursor.index)
    }

    pub async fn first(&self, requester: ChatId, side: Side, page_count: usize) -> Option<usize> {
        self.advance(requester, side, PageRequest::First, page_count)
            .await
    }

    pub async fn next(&self, requester: ChatId, side: Side, page_count: usize) -> Option<usize> {
        self.advance(requester, side, PageRequest::Next, page_count)
            .await
    }

    /// Drop cursors untouched for longer than `max_idle`. Returns how many.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        self.evict_idle_at(Instant::now(), max_idle).await
    }

    pub async fn evict_idle_at(&self, now: Instant, max_idle: Duration) -> usize {
        let mut cursors = self.cursors.lock().await;
        let before = cursors.len();
        cursors.retain(|_, c| now.saturating_duration_since(c.touched) <= max_idle);
        before - cursors.len()
    }

    pub async fn len(&self) -> usize {
        self.cursors.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: ChatId = ChatId(42);

    #[tokio::test]
    async fn next_holds_at_last_page() {
        let tracker = CursorTracker::new();
        let mut seen = vec![tracker.first(CHAT, Side::Buy, 3).await];
        for _ in 0..3 {
            seen.push(tracker.next(CHAT, Side::Buy, 3).await);
        }
        assert_eq!(seen, vec![Some(0), Some(1), Some(2), Some(2)]);
    }

    #[tokio::test]
    async fn first_resets_cursor() {
        let tracker = CursorTracker::new();
        tracker.first(CHAT, Side::Sell, 5).await;
        tracker.next(CHAT, Side::Sell, 5).await;
        tracker.next(CHAT, Side::Sell, 5).await;
        assert_eq!(tracker.first(CHAT, Side::Sell, 5).await, Some(0));
    }

    #[tokio::test]
    async fn buy_and_sell_cursors_are_independent() {
        let tracker = CursorTracker::new();
        tracker.first(CHAT, Side::Buy, 4).await;
        tracker.next(CHAT, Side::Buy, 4).await;
        tracker.next(CHAT, Side::Buy, 4).await;

        assert_eq!(tracker.first(CHAT, Side::Sell, 4).await, Some(0));
        assert_eq!(tracker.next(CHAT, Side::Buy, 4).await, Some(3));
        assert_eq!(tracker.next(ChatId(7), Side::Buy, 4).await, Some(1));
        assert_eq!(tracker.len().await, 3);
    }

    #[tokio::test]
    async fn no_pages_yields_nothing() {
        let tracker = CursorTracker::new();
        assert_eq!(tracker.first(CHAT, Side::Buy, 0).await, None);
        assert_eq!(tracker.next(CHAT, Side::Buy, 0).await, None);
    }

    #[tokio::test]
    async fn cursor_is_clamped_when_pages_shrink() {
        let tracker = CursorTracker::new();
        tracker.first(CHAT, Side::Buy, 5).await;
        for _ in 0..4 {
            tracker.next(CHAT, Side::Buy, 5).await;
        }
        assert_eq!(tracker.next(CHAT, Side::Buy, 2).await, Some(1));
    }

    #[tokio::test]
    async fn idle_cursors_are_evicted() {
        let tracker = CursorTracker::new();
        tracker.first(CHAT, Side::Buy, 2).await;
        tracker.first(CHAT, Side::Sell, 2).await;

        let idle = Duration::from_secs(60);
        assert_eq!(tracker.evict_idle_at(Instant::now(), idle).await, 0);

        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(tracker.evict_idle_at(later, idle).await, 2);
        assert!(tracker.is_empty().await);
    }
}
