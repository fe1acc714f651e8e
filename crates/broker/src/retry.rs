//! Bounded connection retry with fixed backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::BrokerError;

/// Run `op` up to `attempts` times with a fixed `delay` between attempts.
///
/// The closure receives the 1-based attempt number for logging. Exhausting
/// every attempt yields [`BrokerError::ConnectExhausted`] carrying the last
/// failure, which callers treat as process-fatal.
pub async fn connect_with_retry<T, F, Fut>(
    attempts: u32,
    delay: Duration,
    mut op: F,
) -> Result<T, BrokerError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, BrokerError>>,
{
    let mut last = String::new();
    for attempt in 1..=attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt, attempts, error = %e, "broker connection attempt failed");
                last = e.to_string();
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(BrokerError::ConnectExhausted { attempts, last })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_final_attempt_with_fixed_delay() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_op = calls.clone();
        let started = tokio::time::Instant::now();

        let result = connect_with_retry(5, Duration::from_secs(5), move |_attempt| {
            let calls = calls_in_op.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 4 {
                    Err(BrokerError::Connect("broker unreachable".to_string()))
                } else {
                    Ok("connection")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "connection");
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // Four inter-attempt delays of 5s each, nothing more.
        assert_eq!(started.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_attempt_count_and_last_error() {
        let result: Result<(), _> =
            connect_with_retry(5, Duration::from_secs(5), |attempt| async move {
                Err(BrokerError::Connect(format!("refused ({attempt})")))
            })
            .await;

        match result {
            Err(BrokerError::ConnectExhausted { attempts, last }) => {
                assert_eq!(attempts, 5);
                assert!(last.contains("refused (5)"));
            }
            other => panic!("expected ConnectExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_sleeps_nothing() {
        let started = tokio::time::Instant::now();
        let result =
            connect_with_retry(5, Duration::from_secs(5), |_| async { Ok(42u32) }).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
