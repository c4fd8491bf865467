//! The thin publisher variant: a direct pass-through to a broker client.
//!
//! Broker client libraries are typically synchronous (each send blocks until
//! the broker acknowledges). [`DirectPublisher`] adapts such a client to the
//! async [`Publisher`] capability by running every client call on Tokio's
//! blocking pool, and renders messages with [`Message::to_envelope`].

use crate::config::PublisherConfig;
use crate::connector::{ConnectTarget, Connector};
use crate::error::{PublishError, TransportError};
use crate::message::Message;
use crate::publisher::Publisher;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// A single record handed to the broker client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Destination topic.
    pub topic: String,
    /// Envelope-encoded message.
    pub value: String,
}

/// A synchronous broker client.
///
/// This is the seam where a real client library plugs in. Every method may
/// block on network I/O.
pub trait BrokerClient: Send + Sync + 'static {
    /// Sends one record and waits for the configured acknowledgement.
    fn send(&self, record: Record) -> Result<(), TransportError>;

    /// Fetches topic metadata; used as the liveness check.
    fn fetch_metadata(&self, topic: &str) -> Result<(), TransportError>;

    /// Closes connections and flushes buffers.
    fn close(&self) -> Result<(), TransportError>;
}

/// Publisher that forwards straight to a [`BrokerClient`].
pub struct DirectPublisher<B> {
    client: Arc<B>,
    topic: String,
    config: PublisherConfig,
}

impl<B: BrokerClient> DirectPublisher<B> {
    /// Wraps a connected client.
    pub fn new(client: B, topic: impl Into<String>, config: PublisherConfig) -> Self {
        Self {
            client: Arc::new(client),
            topic: topic.into(),
            config,
        }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &B {
        &self.client
    }

    /// Returns the destination topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the publisher options.
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    fn encode(&self, message: &Message) -> Result<Record, PublishError> {
        let value = message.to_envelope();
        if value.len() > self.config.max_message_bytes {
            return Err(PublishError::MessageTooLarge {
                size: value.len(),
                limit: self.config.max_message_bytes,
            });
        }
        Ok(Record {
            topic: self.topic.clone(),
            value,
        })
    }
}

impl<B: BrokerClient> Publisher for DirectPublisher<B> {
    fn send_message(&self, message: Message) -> BoxFuture<'_, Result<(), PublishError>> {
        Box::pin(async move {
            let record = self.encode(&message)?;
            let client = Arc::clone(&self.client);
            run_blocking(move || client.send(record)).await
        })
    }

    fn connectivity_check(&self) -> BoxFuture<'_, Result<(), PublishError>> {
        Box::pin(async move {
            let client = Arc::clone(&self.client);
            let topic = self.topic.clone();
            run_blocking(move || client.fetch_metadata(&topic)).await
        })
    }

    fn shutdown(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let client = Arc::clone(&self.client);
            if let Err(_err) = run_blocking(move || client.close()).await {
                #[cfg(feature = "tracing")]
                tracing::warn!(topic = %self.topic, error = %_err, "error closing broker client");
            }
        })
    }
}

impl<B> fmt::Debug for DirectPublisher<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectPublisher")
            .field("topic", &self.topic)
            .field("config", &self.config)
            .finish()
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, PublishError>
where
    F: FnOnce() -> Result<T, TransportError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(PublishError::from),
        Err(join_err) => Err(TransportError::new(join_err).into()),
    }
}

/// Connector that builds [`DirectPublisher`]s from a blocking client
/// factory.
///
/// The factory receives the brokers, topic and options of the producer and
/// either returns a connected client or the error that made the attempt
/// fail. It runs on the blocking pool, so it may dial the brokers directly.
///
/// # Examples
///
/// ```
/// use tenacious_producer::{BrokerClient, ConnectTarget, DirectConnector, Record, TransportError};
///
/// struct Client;
///
/// impl BrokerClient for Client {
///     fn send(&self, _: Record) -> Result<(), TransportError> { Ok(()) }
///     fn fetch_metadata(&self, _: &str) -> Result<(), TransportError> { Ok(()) }
///     fn close(&self) -> Result<(), TransportError> { Ok(()) }
/// }
///
/// let connector = DirectConnector::new(|target: &ConnectTarget| {
///     if target.brokers().len() > 1 {
///         Ok(Client)
///     } else {
///         Err(TransportError::msg("single-broker clusters are not supported"))
///     }
/// });
/// # let _ = connector;
/// ```
pub struct DirectConnector<F> {
    factory: Arc<F>,
}

impl<F> DirectConnector<F> {
    /// Creates a connector from a blocking client factory.
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }
}

impl<F> Clone for DirectConnector<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<F> fmt::Debug for DirectConnector<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectConnector").finish_non_exhaustive()
    }
}

impl<F, B> Connector for DirectConnector<F>
where
    F: Fn(&ConnectTarget) -> Result<B, TransportError> + Send + Sync + 'static,
    B: BrokerClient,
{
    type Publisher = DirectPublisher<B>;

    fn connect<'a>(
        &'a self,
        target: &'a ConnectTarget,
    ) -> BoxFuture<'a, Result<Self::Publisher, PublishError>> {
        let factory = Arc::clone(&self.factory);
        let owned = target.clone();
        Box::pin(async move {
            let topic = owned.topic().to_string();
            let config = owned.config().clone();
            let client = run_blocking(move || factory(&owned)).await?;
            Ok(DirectPublisher::new(client, topic, config))
        })
    }
}
