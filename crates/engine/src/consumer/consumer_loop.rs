use async_nats::jetstream::consumer::PullConsumer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;

use aquawatch_common::trace_id::generate_trace_id;

use super::handler::{decode_reading, pull_batch};
use super::processor::ReadingProcessor;
use crate::metrics::EngineMetrics;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const IDLE_WAIT: Duration = Duration::from_millis(100);
const PULL_ERROR_WAIT: Duration = Duration::from_secs(1);

/// Pull-fetch loop over the readings stream. A message is acked only after
/// its evaluations have completed, so a crash before the ack means
/// redelivery, never a silently dropped transition. Malformed payloads are
/// acked to discard. The shutdown signal stops fetching; the batch in
/// flight drains before the loop returns.
pub struct ConsumerLoop {
    consumer: PullConsumer,
    batch_size: usize,
    metrics: Arc<EngineMetrics>,
}

impl ConsumerLoop {
    pub fn new(consumer: PullConsumer, batch_size: usize, metrics: Arc<EngineMetrics>) -> Self {
        Self { consumer, batch_size, metrics }
    }

    pub async fn run(
        &self,
        processor: &ReadingProcessor,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), BoxError> {
        loop {
            if *shutdown.borrow() {
                break;
            }

            let pulled = tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("shutdown signal received, draining");
                    break;
                }
                pulled = pull_batch(&self.consumer, self.batch_size) => pulled,
            };

            let messages = match pulled {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::error!(error = %e, "pull failed, backing off");
                    tokio::time::sleep(PULL_ERROR_WAIT).await;
                    continue;
                }
            };

            if messages.is_empty() {
                tokio::time::sleep(IDLE_WAIT).await;
                continue;
            }

            for msg in messages {
                match decode_reading(&msg) {
                    Ok(reading) => {
                        let trace_id = generate_trace_id();
                        let span = tracing::info_span!("process_reading", %trace_id,
                            station_id = reading.station_id, metric_id = reading.sensor_id);
                        processor.process(&reading).instrument(span).await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "malformed reading, acking to discard");
                        self.metrics.inc_readings_malformed();
                    }
                }
                if let Err(e) = msg.ack().await {
                    tracing::error!(error = %e, "ack failed");
                }
            }
        }

        tracing::info!("consumer loop stopped");
        Ok(())
    }
}
