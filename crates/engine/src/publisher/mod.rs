mod in_memory;
mod nats;

use aquawatch_common::notification::AlertNotification;

pub use self::in_memory::InMemoryPublisher;
pub use self::nats::NatsNotificationPublisher;

/// Outbound side of the engine. Delivery is best-effort: a failed publish
/// is logged and dropped, never unwinding the state transition that
/// produced it.
#[async_trait::async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, notification: &AlertNotification) -> Result<(), PublishError>;
}

#[derive(Debug)]
pub struct PublishError(pub String);

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "publish: {}", self.0)
    }
}

impl std::error::Error for PublishError {}
