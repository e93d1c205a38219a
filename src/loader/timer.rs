//! Timer abstraction for backoff sleeps and the mount watchdog.
//!
//! Native hosts sleep on tokio (which also gives tests paused virtual time);
//! browser hosts sleep on `gloo_timers`, the same way the client's reconnect
//! loop does.

use std::future::Future;
use std::time::Duration;

use futures::future::{Either, LocalBoxFuture, select};

pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

#[cfg(feature = "native")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTimer;

#[cfg(feature = "native")]
impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[cfg(feature = "hydrate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct GlooTimer;

#[cfg(feature = "hydrate")]
impl Timer for GlooTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(gloo_timers::future::sleep(duration))
    }
}

/// Drive `work` until it finishes or `deadline` fires. Dropping the losing
/// future cancels it.
pub(crate) async fn with_deadline<F>(deadline: LocalBoxFuture<'static, ()>, work: F) -> Option<F::Output>
where
    F: Future,
{
    let work = std::pin::pin!(work);
    match select(work, deadline).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(((), _)) => None,
    }
}
