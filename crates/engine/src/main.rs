use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use aquawatch_common::retry::{retry_async, RetryConfig};
use aquawatch_common::stream_config::StreamConfig;

use aquawatch_engine::api;
use aquawatch_engine::config::EngineConfig;
use aquawatch_engine::consumer::{
    connect_jetstream, create_pull_consumer, ensure_stream, ConsumerLoop, ReadingProcessor,
};
use aquawatch_engine::index::RuleIndex;
use aquawatch_engine::kv::{KvLock, KvStore, RedisKv};
use aquawatch_engine::metrics::EngineMetrics;
use aquawatch_engine::publisher::NatsNotificationPublisher;
use aquawatch_engine::reconciler::{PgRuleSource, Reconciler};
use aquawatch_engine::shutdown::wait_for_shutdown;
use aquawatch_engine::tracking::TrackingStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = EngineConfig::from_env();
    let metrics = EngineMetrics::new();

    // losing the shared store or the rule store at startup is fatal;
    // everything after this self-heals
    tracing::info!(url = %config.redis_url, "connecting to shared store");
    let kv: Arc<dyn KvStore> = Arc::new(RedisKv::connect(&config.redis_url).await?);

    tracing::info!("connecting to rule store");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    tracing::info!(url = %config.nats_url, "connecting to NATS JetStream");
    let js = retry_async(&RetryConfig::default(), "nats connect", || {
        connect_jetstream(&config.nats_url)
    })
    .await?;

    ensure_stream(&js, &StreamConfig::readings()).await?;
    ensure_stream(&js, &StreamConfig::notifications()).await?;
    tracing::info!("streams ready");

    let index = RuleIndex::new(Arc::clone(&kv));
    let reconciler = Arc::new(Reconciler::new(
        Arc::new(PgRuleSource::new(pool)),
        index.clone(),
        Arc::clone(&metrics),
    ));

    // blocking first pass; a failure leaves the previous index generation
    // serving until the interval pass heals it
    if let Err(e) = reconciler.sync_once().await {
        tracing::error!(error = %e, "initial reconciliation failed, continuing with existing index");
    }
    let reconcile_handle = Arc::clone(&reconciler)
        .spawn_interval(Duration::from_secs(config.reconcile_interval_secs));

    let api_metrics = Arc::clone(&metrics);
    let api_addr = config.api_addr.clone();
    let api_handle = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(&api_addr)
            .await
            .expect("bind API listener");
        tracing::info!(%api_addr, "engine API server starting");
        api::serve(listener, api_metrics).await.expect("API server");
    });

    let publisher = Arc::new(NatsNotificationPublisher::new(js.clone()));
    let processor = ReadingProcessor::new(
        index,
        TrackingStore::new(Arc::clone(&kv)),
        KvLock::new(Arc::clone(&kv)),
        publisher,
        config.eval_policy(),
        Arc::clone(&metrics),
        config.processor_options(),
    );

    let readings_consumer = create_pull_consumer(&js, config.lookback()).await?;
    let consumer_loop = ConsumerLoop::new(readings_consumer, config.batch_size, Arc::clone(&metrics));
    tracing::info!("pull consumer ready, entering loop");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer_handle = tokio::spawn(async move {
        consumer_loop.run(&processor, shutdown_rx).await
    });

    wait_for_shutdown().await;
    tracing::info!("shutdown requested, draining in-flight evaluations");
    let _ = shutdown_tx.send(true);

    match consumer_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("consumer: {e}"),
        Err(e) => tracing::error!("consumer join: {e}"),
    }
    reconcile_handle.abort();
    api_handle.abort();

    tracing::info!("engine stopped");
    Ok(())
}
