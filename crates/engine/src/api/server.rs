use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::{health, metrics};
use crate::metrics::EngineMetrics;

pub fn router(engine_metrics: Arc<EngineMetrics>) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/ready", get(health::ready))
        .route("/metrics", get(metrics::metrics).with_state(engine_metrics))
}

pub async fn serve(
    listener: TcpListener,
    engine_metrics: Arc<EngineMetrics>,
) -> std::io::Result<()> {
    let app = router(engine_metrics);
    axum::serve(listener, app).await
}
