use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Re-run `probe` every `interval` until it yields `Some` or `timeout`
/// elapses. The probe always runs at least once. Errors from the probe are
/// returned immediately.
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(found) = probe().await? {
            return Ok(Some(found));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_found_after_retries() {
        let calls = Cell::new(0);
        let found = poll_until(Duration::from_secs(1), Duration::from_millis(100), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { Ok((n == 3).then_some(n)) }
        })
        .await
        .unwrap();
        assert_eq!(found, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_times_out() {
        let start = Instant::now();
        let found: Option<()> =
            poll_until(Duration::from_secs(2), Duration::from_millis(250), || async {
                Ok(None)
            })
            .await
            .unwrap();
        assert!(found.is_none());
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_propagates_errors() {
        let result: Result<Option<()>> =
            poll_until(Duration::from_secs(1), Duration::from_millis(100), || async {
                Err(crate::error::HarvestError::Other("boom".into()))
            })
            .await;
        assert!(result.is_err());
    }
}
