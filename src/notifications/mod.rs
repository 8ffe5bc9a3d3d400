use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::mpsc;

use crate::watcher::{ChangeEvent, ChangeWatcher, Subscription};

/// Wire message pushed to every connected subscriber
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileChangeMessage {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub path: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl FileChangeMessage {
    pub const TYPE: &'static str = "FILE_CHANGE";
}

impl From<&ChangeEvent> for FileChangeMessage {
    fn from(event: &ChangeEvent) -> Self {
        Self {
            message_type: Self::TYPE,
            path: event.path.display().to_string(),
            timestamp: event.timestamp,
        }
    }
}

/// One subscriber's registration with the watcher.
///
/// Every watcher event is serialized and handed to `send` synchronously.
/// A failed send is dropped, never retried. `close` (or drop) deregisters
/// exactly this connection's listeners.
pub struct SubscriberConnection {
    subscription: Subscription,
}

impl SubscriberConnection {
    /// `send` returns false when the message could not be delivered.
    pub fn open<F>(watcher: &ChangeWatcher, send: F) -> Self
    where
        F: Fn(String) -> bool + Send + Sync + 'static,
    {
        let subscription = watcher.subscribe(move |event| {
            let message = FileChangeMessage::from(event);
            match serde_json::to_string(&message) {
                Ok(text) => {
                    if !send(text) {
                        tracing::debug!(path = %message.path, "Dropped file change notification");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to serialize file change"),
            }
        });

        Self { subscription }
    }

    pub fn is_open(&self) -> bool {
        self.subscription.is_active()
    }

    pub fn close(mut self) {
        self.subscription.unsubscribe();
    }
}

/// Drive one websocket connection until either side closes it.
pub async fn serve_socket(socket: WebSocket, watcher: Arc<ChangeWatcher>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let connection = SubscriberConnection::open(&watcher, move |text| tx.send(text).is_ok());
    tracing::info!(
        root = %watcher.root().display(),
        listeners = watcher.listener_count(),
        "Notification subscriber connected"
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Incoming frames are ignored; reading them is how a close is noticed
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    connection.close();
    tracing::info!(listeners = watcher.listener_count(), "Notification subscriber disconnected");
}
