use async_nats::jetstream;
use async_nats::jetstream::consumer::{DeliverPolicy, PullConsumer};
use async_nats::jetstream::stream::Stream;
use std::time::Duration;

use aquawatch_common::stream_config::{StreamConfig, CONSUMER_NAME, READINGS_STREAM};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub async fn connect_jetstream(url: &str) -> Result<jetstream::Context, BoxError> {
    let client = async_nats::connect(url).await?;
    Ok(jetstream::new(client))
}

pub async fn ensure_stream(
    js: &jetstream::Context,
    config: &StreamConfig,
) -> Result<Stream, BoxError> {
    let stream_config = jetstream::stream::Config {
        name: config.name.clone(),
        subjects: config.subjects.clone(),
        max_bytes: config.max_bytes,
        max_age: Duration::from_secs(config.max_age_secs),
        ..Default::default()
    };
    Ok(js.get_or_create_stream(stream_config).await?)
}

/// Durable pull consumer over the readings stream. With a lookback the
/// consumer starts from `now - lookback` instead of its committed
/// position, re-evaluating recent readings after extended downtime;
/// transitions stay correct because the tracking state debounces them.
pub async fn create_pull_consumer(
    js: &jetstream::Context,
    lookback: Option<Duration>,
) -> Result<PullConsumer, BoxError> {
    let stream = js.get_stream(READINGS_STREAM).await?;

    let deliver_policy = match lookback {
        Some(window) => DeliverPolicy::ByStartTime {
            start_time: time::OffsetDateTime::now_utc() - window,
        },
        None => DeliverPolicy::All,
    };

    let consumer_config = jetstream::consumer::pull::Config {
        durable_name: Some(CONSUMER_NAME.into()),
        ack_policy: jetstream::consumer::AckPolicy::Explicit,
        max_deliver: 5,
        deliver_policy,
        ..Default::default()
    };

    Ok(stream.get_or_create_consumer(CONSUMER_NAME, consumer_config).await?)
}
