//! Execution context: cooperative cancellation plus an optional deadline.
//!
//! A [`Context`] is passed to every [`GraphQLClient::execute`](crate::GraphQLClient::execute)
//! call. The client checks it once on entry; after that, transports bind the
//! in-flight exchange to it with [`Context::run`].
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use lattice_graphql::Context;
//!
//! let ctx = Context::background().with_timeout(Duration::from_secs(5));
//! let (ctx, cancel) = ctx.with_cancel();
//!
//! // Elsewhere:
//! cancel.cancel();
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// A cancellable execution context with an optional deadline.
///
/// Cheap to clone; clones share the same cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Wrap an existing cancellation token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a context that also expires after `timeout`.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.with_deadline(deadline)
    }

    /// Derive a context that also expires at `deadline`.
    ///
    /// An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Derive a context with its own cancellation handle.
    ///
    /// Cancelling the returned token cancels the new context only; cancelling
    /// this context's token still cancels both.
    pub fn with_cancel(self) -> (Self, CancellationToken) {
        let token = self.token.child_token();
        let ctx = Self {
            token: token.clone(),
            deadline: self.deadline,
        };
        (ctx, token)
    }

    /// Get the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Get the cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Check whether the context is cancelled or expired.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// The reason the context is done, or `None` if it is still live.
    ///
    /// Cancellation wins over an expired deadline.
    pub fn err(&self) -> Option<Error> {
        if self.token.is_cancelled() {
            return Some(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }

    /// Drive `fut` to completion unless the context finishes first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::Cancelled),
            _ = expired => Err(Error::DeadlineExceeded),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_live() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancelled_token() {
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();
        assert!(matches!(ctx.err(), Some(Error::Cancelled)));
    }

    #[test]
    fn test_parent_cancels_child() {
        let parent = CancellationToken::new();
        let (child, _) = Context::from_token(parent.clone()).with_cancel();
        parent.cancel();
        assert!(child.is_done());
    }

    #[test]
    fn test_child_does_not_cancel_parent() {
        let parent = Context::background();
        let (_child, cancel) = parent.clone().with_cancel();
        cancel.cancel();
        assert!(!parent.is_done());
    }

    #[tokio::test]
    async fn test_expired_deadline() {
        let ctx = Context::background().with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(matches!(ctx.err(), Some(Error::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_earlier_deadline_kept() {
        let soon = Instant::now() + Duration::from_secs(1);
        let ctx = Context::background()
            .with_deadline(soon)
            .with_timeout(Duration::from_secs(60));
        assert_eq!(ctx.deadline(), Some(soon));
    }

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        let value = ctx.run(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let ctx = Context::background().with_timeout(Duration::from_millis(20));
        let result: Result<()> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(Error::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_run_cancelled_mid_flight() {
        let (ctx, cancel) = Context::background().with_cancel();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });
        let result: Result<()> = ctx
            .run(std::future::pending::<Result<()>>())
            .await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
