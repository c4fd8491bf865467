//! Building publishers.
//!
//! A [`Connector`] is what the self-healing producer calls from its
//! background task: each call is one connection attempt against the
//! configured brokers.

use crate::brokers::Brokers;
use crate::config::PublisherConfig;
use crate::error::PublishError;
use crate::publisher::Publisher;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;

/// Everything a connector needs to build a publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    brokers: Brokers,
    topic: String,
    config: PublisherConfig,
}

impl ConnectTarget {
    /// Creates a target.
    pub fn new(brokers: Brokers, topic: impl Into<String>, config: PublisherConfig) -> Self {
        Self {
            brokers,
            topic: topic.into(),
            config,
        }
    }

    /// Returns the broker addresses.
    pub fn brokers(&self) -> &Brokers {
        &self.brokers
    }

    /// Returns the destination topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the publisher options.
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }
}

/// Makes one attempt at building a connected publisher.
pub trait Connector: Send + Sync + 'static {
    /// The publisher produced on success.
    type Publisher: Publisher;

    /// Attempts to connect. Failures are retried by the caller.
    fn connect<'a>(
        &'a self,
        target: &'a ConnectTarget,
    ) -> BoxFuture<'a, Result<Self::Publisher, PublishError>>;
}

/// Creates a [`Connector`] from an async closure.
///
/// # Examples
///
/// ```
/// use tenacious_producer::{connector_fn, ConnectTarget, PublishError};
/// # use tenacious_producer::{Message, Publisher};
/// # use futures::future::BoxFuture;
/// # struct Noop;
/// # impl Publisher for Noop {
/// #     fn send_message(&self, _: Message) -> BoxFuture<'_, Result<(), PublishError>> { Box::pin(async { Ok(()) }) }
/// #     fn connectivity_check(&self) -> BoxFuture<'_, Result<(), PublishError>> { Box::pin(async { Ok(()) }) }
/// #     fn shutdown(&self) -> BoxFuture<'_, ()> { Box::pin(async {}) }
/// # }
///
/// let connector = connector_fn(|target: &ConnectTarget| {
///     let topic = target.topic().to_string();
///     async move {
///         if topic.is_empty() {
///             Err(PublishError::NotConnected)
///         } else {
///             Ok(Noop)
///         }
///     }
/// });
/// ```
pub fn connector_fn<F>(f: F) -> ConnectorFn<F> {
    ConnectorFn { f }
}

/// Connector returned by [`connector_fn`].
#[derive(Clone)]
pub struct ConnectorFn<F> {
    f: F,
}

impl<F, Fut, P> Connector for ConnectorFn<F>
where
    F: Fn(&ConnectTarget) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<P, PublishError>> + Send + 'static,
    P: Publisher,
{
    type Publisher = P;

    fn connect<'a>(
        &'a self,
        target: &'a ConnectTarget,
    ) -> BoxFuture<'a, Result<Self::Publisher, PublishError>> {
        Box::pin((self.f)(target))
    }
}

impl<F> fmt::Debug for ConnectorFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorFn")
            .field("f", &std::any::type_name::<F>())
            .finish()
    }
}
