//! Fire-and-forget notification dispatch.
//!
//! Moderation handlers hand notifications to a [`NotificationSink`] after
//! their transaction has committed. The sink never reports failure back:
//! the queue worker persists what it can and logs the rest.

use super::notification::{NewNotification, NotificationService};
use sea_orm::DatabaseConnection;
use tokio::sync::mpsc;

pub trait NotificationSink: Send + Sync {
    fn enqueue(&self, notification: NewNotification);
}

#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<NewNotification>,
}

impl NotificationQueue {
    /// A queue plus the receiving end, without a worker attached.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NewNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Start the persistence worker on the current runtime.
    pub fn spawn(db: DatabaseConnection) -> Self {
        let (queue, mut rx) = Self::channel();
        let service = NotificationService::new(db);

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                let receiver_id = notification.receiver_id;
                let kind = notification.kind;
                if let Err(e) = service.create(notification).await {
                    tracing::warn!(
                        receiver_id,
                        kind,
                        "Failed to store notification: {}",
                        e
                    );
                }
            }
            tracing::info!("Notification worker stopped");
        });

        queue
    }
}

impl NotificationSink for NotificationQueue {
    fn enqueue(&self, notification: NewNotification) {
        let receiver_id = notification.receiver_id;
        if self.tx.send(notification).is_err() {
            tracing::warn!(
                receiver_id,
                "Notification worker unavailable, dropping notification"
            );
        }
    }
}
