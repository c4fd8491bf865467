//! Tower integration.
//!
//! [`PublisherService`] exposes any [`Publisher`] as a
//! `Service<Message>`, so the usual tower middleware (timeouts, retries,
//! concurrency limits) can be stacked in front of a producer.

use crate::error::PublishError;
use crate::message::Message;
use crate::publisher::Publisher;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

/// A `tower::Service` that publishes each request message.
///
/// The service is always ready; a producer that is still connecting
/// rejects the call itself with [`PublishError::NotConnected`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tenacious_producer::{connector_fn, ConnectTarget, Message, PublishError, PublisherConfig};
/// use tenacious_producer::{Publisher, SelfHealingProducer};
/// use tower::{Service, ServiceExt};
/// # use futures::future::BoxFuture;
/// # struct Noop;
/// # impl Publisher for Noop {
/// #     fn send_message(&self, _: Message) -> BoxFuture<'_, Result<(), PublishError>> { Box::pin(async { Ok(()) }) }
/// #     fn connectivity_check(&self) -> BoxFuture<'_, Result<(), PublishError>> { Box::pin(async { Ok(()) }) }
/// #     fn shutdown(&self) -> BoxFuture<'_, ()> { Box::pin(async {}) }
/// # }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let connector = connector_fn(|_: &ConnectTarget| async {
///     Err::<Noop, _>(PublishError::NotConnected)
/// });
/// let producer = SelfHealingProducer::new(
///     "127.0.0.1:9092",
///     "content",
///     PublisherConfig::default(),
///     Duration::from_secs(60),
///     Duration::from_secs(1),
///     connector,
/// )?;
///
/// let mut service = producer.into_service();
/// let result = service.ready().await?.call(Message::with_body("hello")).await;
/// assert!(result.unwrap_err().is_not_connected());
/// # Ok(())
/// # }
/// ```
pub struct PublisherService<P> {
    inner: Arc<P>,
}

impl<P> PublisherService<P> {
    /// Wraps a publisher.
    pub fn new(publisher: P) -> Self {
        Self {
            inner: Arc::new(publisher),
        }
    }

    /// Wraps a publisher that is already shared.
    pub fn from_arc(publisher: Arc<P>) -> Self {
        Self { inner: publisher }
    }

    /// Returns the wrapped publisher.
    pub fn get_ref(&self) -> &P {
        &self.inner
    }

    /// Returns a shared handle to the wrapped publisher, e.g. to shut it
    /// down while the service is owned by a middleware stack.
    pub fn publisher(&self) -> Arc<P> {
        Arc::clone(&self.inner)
    }
}

impl<P> Clone for PublisherService<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for PublisherService<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublisherService")
            .field("inner", &self.inner)
            .finish()
    }
}

impl<P: Publisher> Service<Message> for PublisherService<P> {
    type Response = ();
    type Error = PublishError;
    type Future = BoxFuture<'static, Result<(), PublishError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, message: Message) -> Self::Future {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { inner.send_message(message).await })
    }
}
