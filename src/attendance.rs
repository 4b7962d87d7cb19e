//! Attendance counter display and the same-session notifier that keeps open
//! player views in step when a count changes.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::trace;

use crate::evaluation_view::ViewKey;
use crate::month::Month;

/// Training days a month is counted against.
pub const MONTHLY_SESSIONS: u8 = 8;

/// `5/8 (63%)`
pub fn format_attendance(days: Option<u8>) -> String {
    let days = days.unwrap_or(0);
    let percent = (f64::from(days) / f64::from(MONTHLY_SESSIONS) * 100.0).round();
    format!("{days}/{MONTHLY_SESSIONS} ({percent}%)")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceUpdate {
    pub player_id: u64,
    pub month: Month,
    pub days: u8,
}

impl AttendanceUpdate {
    pub fn key(&self) -> ViewKey {
        ViewKey::new(self.player_id, self.month)
    }

    pub fn matches(&self, key: &ViewKey) -> bool {
        self.key() == *key
    }
}

pub type AttendanceHandler = Arc<dyn Fn(&AttendanceUpdate) + Send + Sync>;

/// Single-topic publish/subscribe for attendance changes.
///
/// Every subscriber sees every update; filtering by player and month is the
/// subscriber's job.
pub trait AttendanceChannel {
    fn publish(&self, player_id: u64, month: Month, days: u8);
    fn subscribe(&self, handler: AttendanceHandler) -> Subscription;
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    handlers: Vec<(u64, AttendanceHandler)>,
}

/// In-memory channel shared by all views of one app instance. Clones share
/// the same subscriber list.
#[derive(Clone, Default)]
pub struct AttendanceBus {
    inner: Arc<Mutex<BusInner>>,
}

impl AttendanceBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .len()
    }
}

impl fmt::Debug for AttendanceBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttendanceBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl AttendanceChannel for AttendanceBus {
    fn publish(&self, player_id: u64, month: Month, days: u8) {
        let update = AttendanceUpdate {
            player_id,
            month,
            days,
        };
        // Handlers run unlocked so they may publish or (un)subscribe themselves.
        let handlers: Vec<AttendanceHandler> = {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.handlers.iter().map(|(_, h)| Arc::clone(h)).collect()
        };
        if handlers.is_empty() {
            trace!(player_id, %month, days, "attendance update dropped, no subscribers");
            return;
        }
        for handler in handlers {
            handler(&update);
        }
    }

    fn subscribe(&self, handler: AttendanceHandler) -> Subscription {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.handlers.push((id, handler));
        Subscription {
            bus: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }
}

/// Registration handle. Dropping it deregisters the handler.
pub struct Subscription {
    bus: Weak<Mutex<BusInner>>,
    id: Option<u64>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release();
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some() && self.bus.strong_count() > 0
    }

    fn release(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(bus) = self.bus.upgrade() {
            let mut inner = bus.lock().unwrap_or_else(PoisonError::into_inner);
            inner.handlers.retain(|(hid, _)| *hid != id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
