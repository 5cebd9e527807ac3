//! Out-of-band notifications for surfaces other than the consumption view

use axum::response::sse::{Event, KeepAlive, Sse};
use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

/// Something the user can do straight from a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub label: String,
    /// Surface to navigate to
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub action: Option<NotificationAction>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(message: impl Into<String>, action: Option<NotificationAction>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            action,
            created_at: Utc::now(),
        }
    }

    /// The "new batch is ready" notice sent after a background job completes
    pub fn recommendations_ready() -> Self {
        Self::new(
            "New recommendations are ready",
            Some(NotificationAction {
                label: "Start swiping".to_string(),
                target: "discover".to_string(),
            }),
        )
    }
}

/// Informational sink; never mutates queue state
pub trait NotificationDispatcher: Send + Sync {
    /// Best-effort delivery; dropped when nobody is listening
    fn notify(&self, notification: Notification);
}

/// Fans notifications out to every mounted notification surface
#[derive(Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// SSE response for one notification surface
    pub fn sse(&self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        let stream = BroadcastStream::new(self.subscribe()).filter_map(|result| async move {
            match result {
                Ok(notification) => Event::default()
                    .event("notification")
                    .json_data(&notification)
                    .ok()
                    .map(Ok),
                Err(e) => {
                    tracing::warn!(error = ?e, "Notification subscriber lagged");
                    None
                }
            }
        });

        Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(30)))
    }
}

impl NotificationDispatcher for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        match self.tx.send(notification) {
            Ok(receivers) => tracing::info!(receivers, "Notification dispatched"),
            Err(_) => tracing::debug!("No notification surface mounted, notification dropped"),
        }
    }
}
