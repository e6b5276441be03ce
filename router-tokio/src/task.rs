use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::{JoinError, JoinHandle};

/// A thin wrapper around [`tokio::task::JoinHandle`] that adds the
/// `#[must_use]` lint, so the event loop never forgets to join or explicitly
/// detach a spawned task (e.g. the `LiftChannelExclusion` timers in §4.3).
#[must_use]
pub struct Task<T>(JoinHandle<T>);

impl<T> Task<T> {
    #[allow(clippy::disallowed_methods)]
    pub fn spawn<F>(future: F) -> Task<F::Output>
    where
        F: Future<Output = T> + Send + 'static,
        F::Output: Send + 'static,
    {
        Task(tokio::spawn(future))
    }
}

impl<T> Future for Task<T> {
    type Output = Result<T, JoinError>;
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}
