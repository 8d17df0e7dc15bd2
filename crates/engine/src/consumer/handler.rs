use async_nats::jetstream::consumer::PullConsumer;
use async_nats::jetstream::Message;
use futures::StreamExt;

use aquawatch_common::reading::SensorReading;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug)]
pub struct DecodeError(pub String);

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "decode: {}", self.0)
    }
}

impl std::error::Error for DecodeError {}

pub fn decode_reading(msg: &Message) -> Result<SensorReading, DecodeError> {
    serde_json::from_slice(msg.payload.as_ref()).map_err(|e| DecodeError(e.to_string()))
}

pub async fn pull_batch(
    consumer: &PullConsumer,
    max_messages: usize,
) -> Result<Vec<Message>, BoxError> {
    let mut messages = consumer.fetch().max_messages(max_messages).messages().await?;
    let mut batch = Vec::with_capacity(max_messages);
    while let Some(Ok(msg)) = messages.next().await {
        batch.push(msg);
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use aquawatch_common::reading::SensorReading;

    #[test]
    fn decode_valid_reading() {
        let payload = br#"{"value":26.0,"sensor_id":3,"metric":"water_temp","station_id":7,"datetime":"2024-05-01 13:45:00","unit":"celsius"}"#;
        let reading: SensorReading = serde_json::from_slice(payload).unwrap();
        assert_eq!(reading.station_id, 7);
        assert_eq!(reading.value, 26.0);
    }

    #[test]
    fn decode_rejects_garbage() {
        let result = serde_json::from_slice::<SensorReading>(b"not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn decode_rejects_missing_fields() {
        let payload = br#"{"value":26.0,"station_id":7}"#;
        assert!(serde_json::from_slice::<SensorReading>(payload).is_err());
    }

    #[test]
    fn error_display() {
        let e = super::DecodeError("bad payload".into());
        assert!(e.to_string().contains("decode"));
    }
}
