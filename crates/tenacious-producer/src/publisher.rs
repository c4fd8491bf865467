//! The publisher capability shared by every producer variant.

use crate::error::PublishError;
use crate::message::Message;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Something that can publish messages to a broker topic.
///
/// Implemented by [`DirectPublisher`](crate::DirectPublisher), a thin wrapper
/// over a broker client, and by
/// [`SelfHealingProducer`](crate::SelfHealingProducer), which decorates a
/// publisher it builds in the background.
///
/// Returned futures are cancelled by dropping them, which is how a caller
/// abandons a send. Wrap calls in `tokio::time::timeout` for a deadline.
pub trait Publisher: Send + Sync + 'static {
    /// Publishes one message.
    ///
    /// May wait for the transport to finish. Broker rejections and
    /// unreachable brokers surface as [`PublishError::Transport`].
    fn send_message(&self, message: Message) -> BoxFuture<'_, Result<(), PublishError>>;

    /// Runs a lightweight liveness check against the broker.
    fn connectivity_check(&self) -> BoxFuture<'_, Result<(), PublishError>>;

    /// Releases transport resources.
    ///
    /// Implementations need not be idempotent; owners call this at most once.
    fn shutdown(&self) -> BoxFuture<'_, ()>;
}

impl<P> Publisher for Arc<P>
where
    P: Publisher + ?Sized,
{
    fn send_message(&self, message: Message) -> BoxFuture<'_, Result<(), PublishError>> {
        (**self).send_message(message)
    }

    fn connectivity_check(&self) -> BoxFuture<'_, Result<(), PublishError>> {
        (**self).connectivity_check()
    }

    fn shutdown(&self) -> BoxFuture<'_, ()> {
        (**self).shutdown()
    }
}

impl<P> Publisher for Box<P>
where
    P: Publisher + ?Sized,
{
    fn send_message(&self, message: Message) -> BoxFuture<'_, Result<(), PublishError>> {
        (**self).send_message(message)
    }

    fn connectivity_check(&self) -> BoxFuture<'_, Result<(), PublishError>> {
        (**self).connectivity_check()
    }

    fn shutdown(&self) -> BoxFuture<'_, ()> {
        (**self).shutdown()
    }
}

/// A type-erased publisher.
pub type BoxPublisher = Box<dyn Publisher>;
