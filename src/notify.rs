//! User notifications raised by the form
//!
//! The form reports outcomes (blocked, submitted, failed) through a
//! [`Notifier`] it is handed at construction. How a notification reaches the
//! user is up to the implementation: the terminal front end queues them for
//! its status bar and error dialog.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Presentation service the form reports to
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => tracing::error!("{}", notification.message),
            NotificationLevel::Warning => tracing::warn!("{}", notification.message),
            NotificationLevel::Info | NotificationLevel::Success => {
                tracing::info!("{}", notification.message)
            }
        }
    }
}

/// Notifications waiting to be shown, oldest first
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: Mutex<VecDeque<Notification>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending notification
    pub fn drain(&self) -> Vec<Notification> {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for NotificationQueue {
    fn notify(&self, notification: Notification) {
        tracing::debug!("Queued {:?} notification", notification.level);
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_drains_in_order() {
        let queue = NotificationQueue::new();
        queue.notify(Notification::warning("first"));
        queue.notify(Notification::error("second"));
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert_eq!(
            drained,
            vec![Notification::warning("first"), Notification::error("second")]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_poisoned_queue_keeps_counting() {
        let queue = std::sync::Arc::new(NotificationQueue::new());
        queue.notify(Notification::info("kept"));

        let holder = queue.clone();
        let panicked = std::thread::spawn(move || {
            let _guard = holder.pending.lock().unwrap();
            panic!("lock holder panicked");
        })
        .join();
        assert!(panicked.is_err());

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain(), vec![Notification::info("kept")]);
    }

    #[test]
    fn test_drain_on_empty_queue() {
        let queue = NotificationQueue::new();
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_tracing_notifier_does_not_panic() {
        TracingNotifier.notify(Notification::success("ok"));
        TracingNotifier.notify(Notification::error("bad"));
    }
}
