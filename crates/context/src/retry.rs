//! Bounded retry for remote collaborator calls

use backoff::future::retry;
use backoff::ExponentialBackoffBuilder;
use researchforge_common::errors::{AppError, Result};
use std::future::Future;
use std::time::Duration;

/// Outcome of a single attempt: transient errors may be retried
pub(crate) type Attempt<T> = std::result::Result<T, backoff::Error<AppError>>;

/// Run `op` until it succeeds, fails permanently, or `budget_ms` elapses.
///
/// A zero budget makes exactly one attempt.
pub(crate) async fn with_retry<T, F, Fut>(budget_ms: u64, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    if budget_ms == 0 {
        return op().await.map_err(into_inner);
    }

    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(200))
        .with_max_elapsed_time(Some(Duration::from_millis(budget_ms)))
        .build();

    retry(policy, op).await
}

/// Rate limiting and server-side failures are worth another attempt
pub(crate) fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn into_inner(err: backoff::Error<AppError>) -> AppError {
    match err {
        backoff::Error::Permanent(e) => e,
        backoff::Error::Transient { err, .. } => err,
    }
}
