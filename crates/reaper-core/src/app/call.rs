//! Time-bounded port calls.

use std::future::Future;
use std::time::Duration;

use crate::domain::ReaperError;

/// Await `call` for at most `limit`. Expiry becomes `ReaperError::Transport`.
pub(crate) async fn bounded<T>(
    op: &'static str,
    limit: Duration,
    call: impl Future<Output = Result<T, ReaperError>>,
) -> Result<T, ReaperError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ReaperError::Transport(format!(
            "{op} timed out after {limit:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expiry_is_a_transport_error() {
        let result: Result<(), _> = bounded(
            "hang",
            Duration::from_millis(10),
            std::future::pending(),
        )
        .await;
        assert!(matches!(result, Err(ReaperError::Transport(msg)) if msg.contains("hang")));
    }

    #[tokio::test]
    async fn inner_result_passes_through() {
        let ok = bounded("ok", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<(), _> = bounded("err", Duration::from_secs(1), async {
            Err(ReaperError::WatchClosed)
        })
        .await;
        assert!(matches!(err, Err(ReaperError::WatchClosed)));
    }
}
