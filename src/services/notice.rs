//! Notice entity, ordered collection, and id generation.
//!
//! DESIGN
//! ======
//! A `Notice` is immutable after construction. The collection only appends
//! and removes; there is no update path. Ids are time-derived and strictly
//! increasing within one process, so a deleted id is never handed out again.

use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

use crate::frame::now_ms;

// =============================================================================
// NOTICE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Creation date, `YYYY-MM-DD` in UTC.
    pub timestamp: String,
}

/// Today's date in UTC, formatted as `YYYY-MM-DD`.
#[must_use]
pub fn today() -> String {
    time::OffsetDateTime::now_utc().date().to_string()
}

/// The two notices every fresh board starts with.
#[must_use]
pub fn seed_notices() -> Vec<Notice> {
    let timestamp = today();
    vec![
        Notice {
            id: "1".into(),
            title: "Welcome to Smart Notice Board".into(),
            description: "This is your AI-enabled notice board system. Administrators can manage notices and send \
                          emergency alerts, while editors can upload new content."
                .into(),
            image_url: None,
            timestamp: timestamp.clone(),
        },
        Notice {
            id: "2".into(),
            title: "System Features".into(),
            description: "Our notice board includes emergency alert capabilities, file upload support, and a modern \
                          responsive design. Navigate to the Admin Panel or Editor Space using the menu above."
                .into(),
            image_url: None,
            timestamp,
        },
    ]
}

// =============================================================================
// ID GENERATION
// =============================================================================

/// Monotonic, wall-clock-derived id source.
#[derive(Debug, Default)]
pub struct NoticeIdGenerator {
    last: AtomicI64,
}

impl NoticeIdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id: current epoch millis, bumped past the previous id on ties or
    /// clock regressions.
    pub fn next_id(&self) -> String {
        self.next_at(now_ms()).to_string()
    }

    fn next_at(&self, now: i64) -> i64 {
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self.last.compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

// =============================================================================
// COLLECTION
// =============================================================================

/// Ordered notice sequence; insertion order is preserved.
#[derive(Debug, Clone, Default)]
pub struct NoticeCollection {
    notices: Vec<Notice>,
}

impl NoticeCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_notices(notices: Vec<Notice>) -> Self {
        Self { notices }
    }

    #[must_use]
    pub fn list(&self) -> &[Notice] {
        &self.notices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Notice> {
        self.notices.iter().find(|n| n.id == id)
    }

    pub fn add(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Remove the first notice with a matching id. No match is a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Notice> {
        let index = self.notices.iter().position(|n| n.id == id)?;
        Some(self.notices.remove(index))
    }
}

#[cfg(test)]
#[path = "notice_test.rs"]
mod tests;
