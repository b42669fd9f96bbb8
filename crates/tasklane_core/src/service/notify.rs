//! User-facing notification channel.
//!
//! # Invariants
//! - The task manager emits exactly one notification per mutating call.
//! - Notifiers must not fail; delivery problems are the sink's concern.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// One message addressed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == NotificationLevel::Success
    }
}

/// Delivery sink for notifications (toast, terminal, test recorder).
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}

/// Notifier that buffers notifications until drained.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    items: RefCell<Vec<Notification>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every buffered notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.items.borrow_mut().drain(..).collect()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        self.items.borrow_mut().push(notification);
    }
}
