use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use aquawatch_common::notification::AlertNotification;

use super::{NotificationPublisher, PublishError};

#[derive(Clone, Default)]
pub struct InMemoryPublisher {
    notifications: Arc<Mutex<Vec<AlertNotification>>>,
    count: Arc<AtomicUsize>,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published_count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub async fn published(&self) -> Vec<AlertNotification> {
        self.notifications.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl NotificationPublisher for InMemoryPublisher {
    async fn publish(&self, notification: &AlertNotification) -> Result<(), PublishError> {
        self.notifications.lock().await.push(notification.clone());
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
