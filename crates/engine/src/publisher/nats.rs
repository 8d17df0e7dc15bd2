use async_nats::jetstream;

use aquawatch_common::notification::AlertNotification;
use aquawatch_common::stream_config::NOTIFICATIONS_SUBJECT;

use super::{NotificationPublisher, PublishError};

pub struct NatsNotificationPublisher {
    js: jetstream::Context,
}

impl NatsNotificationPublisher {
    pub fn new(js: jetstream::Context) -> Self {
        Self { js }
    }
}

#[async_trait::async_trait]
impl NotificationPublisher for NatsNotificationPublisher {
    async fn publish(&self, notification: &AlertNotification) -> Result<(), PublishError> {
        let payload =
            serde_json::to_vec(notification).map_err(|e| PublishError(e.to_string()))?;

        let mut headers = async_nats::HeaderMap::new();
        headers.insert("X-Alert-Id", notification.alert_id.to_string().as_str());
        headers.insert("X-Transition", notification.transition.as_str());

        self.js
            .publish_with_headers(NOTIFICATIONS_SUBJECT, headers, payload.into())
            .await
            .map_err(|e| PublishError(e.to_string()))?
            .await
            .map_err(|e| PublishError(e.to_string()))?;

        Ok(())
    }
}
