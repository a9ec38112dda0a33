use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
    time::{Duration, Instant},
};

use chrono::Utc;
use serde::Serialize;

/// Slot shared by every transaction, so a new pending transaction
/// replaces whatever the previous one ended with.
pub const TX_NOTIFICATION_ID: &str = "tx";

const SUCCESS_TTL: Duration = Duration::from_secs(2);
const ERROR_TTL: Duration = Duration::from_secs(4);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Loading,
    Success,
    Error,
}

#[derive(Clone, Debug, Serialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: i64,
}

struct Slot {
    notification: Notification,
    // None for loading notifications: they stay until replaced
    expires_at: Option<Instant>,
}

/// Transient user notifications, keyed by id.
pub struct Notifier {
    slots: Mutex<Vec<Slot>>,
    next_id: AtomicU64,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn loading(&self, id: Option<&str>, message: &str) -> Notification {
        self.notify(id, NotificationKind::Loading, message)
    }

    pub fn success(&self, id: Option<&str>, message: &str) -> Notification {
        self.notify(id, NotificationKind::Success, message)
    }

    pub fn error(&self, id: Option<&str>, message: &str) -> Notification {
        self.notify(id, NotificationKind::Error, message)
    }

    pub fn notify(&self, id: Option<&str>, kind: NotificationKind, message: &str) -> Notification {
        self.notify_at(id, kind, message, Instant::now())
    }

    fn notify_at(
        &self,
        id: Option<&str>,
        kind: NotificationKind,
        message: &str,
        now: Instant,
    ) -> Notification {
        let id = match id {
            Some(id) => id.to_string(),
            None => format!("n{}", self.next_id.fetch_add(1, Ordering::Relaxed)),
        };
        let notification = Notification {
            id,
            kind,
            message: message.to_string(),
            created_at: Utc::now().timestamp(),
        };
        let expires_at = match kind {
            NotificationKind::Loading => None,
            NotificationKind::Success => Some(now + SUCCESS_TTL),
            NotificationKind::Error => Some(now + ERROR_TTL),
        };

        if let Ok(mut slots) = self.slots.lock() {
            prune(&mut slots, now);
            let slot = Slot {
                notification: notification.clone(),
                expires_at,
            };
            match slots
                .iter_mut()
                .find(|s| s.notification.id == notification.id)
            {
                Some(existing) => *existing = slot,
                None => slots.push(slot),
            }
        }
        notification
    }

    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Instant::now())
    }

    fn active_at(&self, now: Instant) -> Vec<Notification> {
        let Ok(mut slots) = self.slots.lock() else {
            return Vec::new();
        };
        prune(&mut slots, now);
        slots.iter().map(|s| s.notification.clone()).collect()
    }
}

fn prune(slots: &mut Vec<Slot>, now: Instant) {
    slots.retain(|s| s.expires_at.map_or(true, |at| at > now));
}
