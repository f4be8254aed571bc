use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::{Error, Result};

type BoxedStream<E> = Pin<Box<dyn Stream<Item = Result<E>> + Send>>;

pub(super) struct Cancellable<E> {
    inner: BoxedStream<E>,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    done: bool,
}

impl<E> Cancellable<E> {
    pub(super) fn new(inner: BoxedStream<E>, token: CancellationToken) -> Self {
        Self {
            inner,
            cancelled: Box::pin(token.cancelled_owned()),
            done: false,
        }
    }
}

impl<E> Stream for Cancellable<E> {
    type Item = Result<E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        if this.cancelled.as_mut().poll(cx).is_ready() {
            this.done = true;
            #[cfg(feature = "tracing")]
            tracing::debug!("response stream cancelled");
            return Poll::Ready(Some(Err(Error::Cancelled)));
        }

        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}
