//! Request-scoped query execution.
//!
//! Every backend call made on behalf of a request goes through a
//! [`QueryContext`], which carries the caller's cancellation token and
//! optional deadline. Independent calls are issued together with
//! [`fan_out`], which keeps results in input order.

mod equality;
mod known;
mod neighbors;
mod path;

pub use equality::{direct_equivalents, equivalence_class, EqualityKind};
pub use known::{KnownQuery, KnownReport, KnownSection, SectionKind, VulnerabilitySummary};
pub use neighbors::{NeighborResolver, Neighbors};
pub use path::{build_path, find_route};

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{QueryConfig, DEFAULT_MAX_CONCURRENCY};
use crate::error::{GraphError, Result};

/// Cancellation, deadline and parallelism bound for one request.
#[derive(Debug, Clone)]
pub struct QueryContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    max_concurrency: usize,
}

impl Default for QueryContext {
    fn default() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context using the `[query]` config section's limits.
    pub fn from_config(config: &QueryConfig) -> Self {
        let ctx = Self::new().with_max_concurrency(config.max_concurrency);
        match config.timeout() {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Tie this request to an externally owned token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fail fast when the request was cancelled or its deadline passed.
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(GraphError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(GraphError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Run one backend call under this context.
    ///
    /// The call is not started when the request is already over, and is
    /// dropped as soon as the token fires or the deadline passes.
    pub async fn call<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(GraphError::Cancelled),
            _ = sleep_until(self.deadline) => Err(GraphError::DeadlineExceeded),
            result = fut => result,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// Run independent futures with at most `ctx.max_concurrency()` in flight.
///
/// Results come back in input order. The first error is returned as soon as
/// it arrives and the remaining futures are dropped. A single future is
/// awaited directly.
pub async fn fan_out<T, Fut, I>(ctx: &QueryContext, futures: I) -> Result<Vec<T>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T>>,
{
    let mut futures: Vec<Fut> = futures.into_iter().collect();
    match futures.len() {
        0 => return Ok(Vec::new()),
        1 => {
            if let Some(fut) = futures.pop() {
                return Ok(vec![fut.await?]);
            }
        }
        _ => {}
    }

    ctx.check()?;
    let mut slots: Vec<Option<T>> = futures.iter().map(|_| None).collect();
    let mut results = stream::iter(
        futures
            .into_iter()
            .enumerate()
            .map(|(i, fut)| async move { (i, fut.await) }),
    )
    .buffer_unordered(ctx.max_concurrency());

    while let Some((i, result)) = results.next().await {
        slots[i] = Some(result?);
    }
    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fan_out_preserves_input_order() {
        let ctx = QueryContext::new().with_max_concurrency(4);
        let delays = [30u64, 5, 20, 1];
        let results = fan_out(
            &ctx,
            delays.iter().enumerate().map(|(i, ms)| async move {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                Ok::<_, GraphError>(i)
            }),
        )
        .await
        .unwrap();
        assert_eq!(results, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_fan_out_returns_first_error() {
        let ctx = QueryContext::new();
        let result = fan_out(
            &ctx,
            (0..3).map(|i| async move {
                if i == 1 {
                    Err(GraphError::NotFound("one".to_string()))
                } else {
                    Ok(i)
                }
            }),
        )
        .await;
        assert!(matches!(result, Err(GraphError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_call_refuses_after_cancel() {
        let ctx = QueryContext::new();
        ctx.cancel();
        let result = ctx.call(async { Ok::<_, GraphError>(1) }).await;
        assert!(matches!(result, Err(GraphError::Cancelled)));
    }

    #[tokio::test]
    async fn test_call_honors_deadline() {
        let ctx = QueryContext::new().with_timeout(Duration::from_millis(10));
        let result = ctx
            .call(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, GraphError>(())
            })
            .await;
        assert!(matches!(result, Err(GraphError::DeadlineExceeded)));
    }
}
