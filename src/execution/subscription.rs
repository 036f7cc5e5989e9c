//! Cancellable subscription result streams

use super::response::ExecutionResult;
use super::ResponseStream;
use crate::error::{JitError, Result};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

/// Results of a live subscription.
///
/// The stream ends when the event source completes or when the
/// subscription is cancelled. Dropping it releases the event source.
pub struct Subscription {
    inner: BoxStream<'static, Result<ExecutionResult>>,
    token: CancellationToken,
}

impl Subscription {
    pub(crate) fn new(events: ResponseStream) -> Self {
        Self::from_results(events.map(Ok).boxed())
    }

    /// A subscription that could not be established
    pub(crate) fn failed(error: JitError) -> Self {
        Self::from_results(stream::once(async move { Err(error) }).boxed())
    }

    fn from_results(results: BoxStream<'static, Result<ExecutionResult>>) -> Self {
        let token = CancellationToken::new();
        let inner = results
            .take_until(token.clone().cancelled_owned())
            .boxed();
        Self { inner, token }
    }

    /// Token that cancels this subscription from another task
    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop delivering results
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Stream for Subscription {
    type Item = Result<ExecutionResult>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.token.is_cancelled() {
            return Poll::Ready(None);
        }
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}
