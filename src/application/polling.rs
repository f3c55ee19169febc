//! Bounded polling for conditions that become true asynchronously

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// The probe never produced a value before the deadline
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("condition not met after {attempts} attempts over {waited:?}")]
pub struct TimeoutError {
    pub waited: Duration,
    pub attempts: u32,
}

/// Call `probe` every `interval` until it yields `Some`, or fail once
/// `timeout` has elapsed.
///
/// The probe always runs at least once, and runs one last time at the deadline
/// so a value that arrives during the final sleep is not missed.
pub async fn await_condition<T, F, Fut>(
    mut probe: F,
    interval: Duration,
    timeout: Duration,
) -> Result<T, TimeoutError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let started = Instant::now();
    let deadline = started + timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        if let Some(value) = probe().await {
            return Ok(value);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(TimeoutError {
                waited: now - started,
                attempts,
            });
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_returns_once_probe_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let value = await_condition(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move { (n == 3).then_some(n) }
            },
            Duration::from_millis(500),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_with_attempt_count() {
        let error = await_condition(
            || async { None::<()> },
            Duration::from_millis(500),
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();

        // t = 0, 0.5, 1.0, 1.5, 2.0
        assert_eq!(error.attempts, 5);
        assert_eq!(error.waited, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_probes_once() {
        let error = await_condition(|| async { None::<()> }, Duration::from_millis(500), Duration::ZERO)
            .await
            .unwrap_err();
        assert_eq!(error.attempts, 1);
    }
}
