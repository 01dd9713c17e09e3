//! Cancellation and deadlines for statement execution.
//!
//! Every terminal operation has a `*_ctx` variant taking a [`Context`]. The statement future
//! is raced against the context's deadline and cancellation signal; whichever fires first
//! wins, and the loser is dropped.
//!
//! ```ignore
//! let ctx = Context::with_timeout(Duration::from_secs(2));
//! let users: Vec<User> = db.table("users").get_ctx(&ctx).await?;
//!
//! let (ctx, canceller) = Context::with_cancel();
//! tokio::spawn(async move { shutdown.await; canceller.cancel(); });
//! db.table("jobs").where_("state = ?", args!["queued"]).get_ctx::<Job>(&ctx).await?;
//! ```

use crate::error::{OrmError, OrmResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Deadline and cancellation carried into a call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<(Instant, Duration)>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Handle that cancels every [`Context`] derived from [`Context::with_cancel`].
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: Arc<watch::Sender<bool>>,
}

impl Canceller {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Context {
    /// No deadline, never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self::background().deadline_at(deadline)
    }

    /// A cancellable context and the handle that cancels it.
    pub fn with_cancel() -> (Self, Canceller) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            deadline: None,
            cancel: Some(rx),
        };
        (ctx, Canceller { tx: Arc::new(tx) })
    }

    /// Derive a context that also expires after `timeout`. The earlier deadline wins.
    pub fn timeout(self, timeout: Duration) -> Self {
        let at = Instant::now() + timeout;
        self.tighten(at, timeout)
    }

    /// Derive a context that also expires at `deadline`. The earlier deadline wins.
    pub fn deadline_at(self, deadline: Instant) -> Self {
        let budget = deadline.saturating_duration_since(Instant::now());
        self.tighten(deadline, budget)
    }

    fn tighten(mut self, at: Instant, budget: Duration) -> Self {
        match self.deadline {
            Some((current, _)) if current <= at => {}
            _ => self.deadline = Some((at, budget)),
        }
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.map(|(at, _)| at)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// The error this context already carries, if it is cancelled or past its deadline.
    pub fn err(&self) -> Option<OrmError> {
        if self.is_cancelled() {
            return Some(OrmError::Cancelled);
        }
        match self.deadline {
            Some((at, budget)) if Instant::now() >= at => Some(OrmError::Timeout(budget)),
            _ => None,
        }
    }

    /// Drive `fut` to completion unless the context fires first.
    pub async fn run<T, F>(&self, fut: F) -> OrmResult<T>
    where
        F: Future<Output = OrmResult<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }
        if self.deadline.is_none() && self.cancel.is_none() {
            return fut.await;
        }

        let cancelled = async {
            match self.cancel.clone() {
                Some(mut rx) => {
                    let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
                    // a dropped Canceller can no longer fire
                    if closed {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some((at, _)) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        let budget = self.deadline.map(|(_, b)| b).unwrap_or_default();

        tokio::select! {
            result = fut => result,
            _ = cancelled => Err(OrmError::Cancelled),
            _ = expired => Err(OrmError::Timeout(budget)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_runs_to_completion() {
        let ctx = Context::background();
        assert_eq!(ctx.run(async { Ok(5) }).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn deadline_interrupts_slow_future() {
        let ctx = Context::with_timeout(Duration::from_millis(10));
        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn cancellation_is_reported_distinctly() {
        let (ctx, canceller) = Context::with_cancel();
        let handle = tokio::spawn(async move {
            ctx.run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(5)).await;
        canceller.cancel();
        let err = handle.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn already_cancelled_context_fails_before_polling() {
        let (ctx, canceller) = Context::with_cancel();
        canceller.cancel();
        let mut polled = false;
        let err = ctx
            .run(async {
                polled = true;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(!polled);
    }

    #[test]
    fn earlier_deadline_wins() {
        let ctx = Context::with_timeout(Duration::from_secs(1)).timeout(Duration::from_secs(60));
        let remaining = ctx.deadline().unwrap() - Instant::now();
        assert!(remaining <= Duration::from_secs(1));
    }
}
