use std::future::Future;
use std::time::Duration;

/// Bounded retry with exponential backoff, used for startup connects.
/// Steady-state paths never retry; the next reading or the next
/// reconciliation pass is the retry.
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(250),
            backoff_factor: 2.0,
        }
    }
}

pub async fn retry_async<F, Fut, T, E>(config: &RetryConfig, label: &str, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = config.initial_delay;
    let mut last_err = None;

    for attempt in 1..=config.max_attempts {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                tracing::warn!(
                    %label,
                    attempt,
                    max_attempts = config.max_attempts,
                    error = %e,
                    "attempt failed"
                );
                last_err = Some(e);
                if attempt < config.max_attempts {
                    tokio::time::sleep(delay).await;
                    delay = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_factor);
                }
            }
        }
    }

    Err(last_err.expect("at least one attempt"))
}
