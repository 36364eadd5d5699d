//! Notification channel from the dialog to the host (toasts, analytics,
//! cache refreshes).

use crate::config::EventsConfig;
use crate::repository::Refresh;
use crate::view::ViewState;
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// User-facing message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DialogEvent {
    Notice(Notice),
    ViewChanged(ViewState),
    Refreshed(Vec<Refresh>),
}

/// Broadcast channel for dialog events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DialogEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(config.capacity)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DialogEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event. Having no subscribers is not an error.
    pub fn emit(&self, event: DialogEvent) {
        let _ = self.tx.send(event);
    }

    pub fn notify(&self, notice: Notice) {
        self.emit(DialogEvent::Notice(notice));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.notify(Notice::info("nobody listening"));
    }

    #[test]
    fn test_subscriber_receives_notice() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        bus.notify(Notice::error("Failed to save"));

        match rx.try_recv().unwrap() {
            DialogEvent::Notice(notice) => {
                assert_eq!(notice.level, NoticeLevel::Error);
                assert_eq!(notice.message, "Failed to save");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_notice_serialization() {
        let json = serde_json::to_string(&Notice::success("Connected")).unwrap();
        assert_eq!(json, r#"{"level":"success","message":"Connected"}"#);
    }
}
