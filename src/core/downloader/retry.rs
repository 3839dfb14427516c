use std::fmt::Display;
use std::future::Future;

use tracing::warn;

/// Attempts granted to a single artifact fetch before its error surfaces.
pub const FETCH_ATTEMPTS: u32 = 3;

/// Run `op` up to `attempts` times.
///
/// A failed attempt is retried only while attempts remain and
/// `should_retry` accepts the error; otherwise that error is returned as-is.
/// `op` receives the 1-based attempt number.
pub async fn retry_with<T, E, F, Fut, P>(attempts: u32, should_retry: P, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts && should_retry(&err) => {
                warn!("Attempt {}/{} failed, retrying: {}", attempt, attempts, err);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
