//! Cancellable live subscriptions
//!
//! A [`Subscription`] yields the current state first and then one item per
//! change of its source. Closing or dropping it ends the underlying listener.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use futures::stream::{BoxStream, Stream, StreamExt};
use crate::utils::errors::Result;
use crate::utils::logging::log_subscription_event;

pub struct Subscription<T> {
    label: String,
    stream: Option<BoxStream<'static, Result<T>>>,
}

impl<T: Send + 'static> Subscription<T> {
    pub fn new<S>(label: impl Into<String>, stream: S) -> Self
    where
        S: Stream<Item = Result<T>> + Send + 'static,
    {
        let label = label.into();
        log_subscription_event(&label, "-", "opened");
        Self {
            label,
            stream: Some(stream.boxed()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Wait for the next snapshot; `None` once closed or exhausted
    pub async fn next(&mut self) -> Option<Result<T>> {
        match self.stream.as_mut() {
            Some(stream) => stream.next().await,
            None => None,
        }
    }

    /// Stop receiving updates. Idempotent.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            log_subscription_event(&self.label, "-", "closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Derive a subscription whose items are computed from each snapshot
    pub fn map_snapshots<U, F, Fut>(mut self, label: impl Into<String>, f: F) -> Subscription<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U>> + Send + 'static,
    {
        let mut f = f;
        let inner = self.stream.take();
        let stream = async_stream::stream! {
            if let Some(mut inner) = inner {
                while let Some(item) = inner.next().await {
                    match item {
                        Ok(snapshot) => yield f(snapshot).await,
                        Err(e) => yield Err(e),
                    }
                }
            }
        };
        Subscription::new(label, stream)
    }

    /// Hand over the raw stream, e.g. for `select`-style merging
    pub fn into_stream(mut self) -> BoxStream<'static, Result<T>> {
        match self.stream.take() {
            Some(stream) => stream,
            None => futures::stream::empty().boxed(),
        }
    }
}

impl<T> Stream for Subscription<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.stream.as_mut() {
            Some(stream) => stream.as_mut().poll_next(cx),
            None => Poll::Ready(None),
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("closed", &self.stream.is_none())
            .finish()
    }
}
