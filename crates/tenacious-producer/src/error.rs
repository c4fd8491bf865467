//! Error types for producers and publishers.

use std::error::Error as StdError;
use std::fmt;

/// Errors returned by [`Publisher`](crate::Publisher) operations.
///
/// Only [`PublishError::NotConnected`] originates in the self-healing
/// producer itself. Everything else comes from the publisher it forwards to
/// and is passed through untouched.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// No publisher is installed: the background connect task has not
    /// succeeded yet, or the producer has been shut down.
    #[error("producer is not connected to the broker")]
    NotConnected,

    /// The encoded message exceeds the configured size limit.
    #[error("message of {size} bytes exceeds the {limit} byte limit")]
    MessageTooLarge {
        /// Encoded size in bytes.
        size: usize,
        /// Configured `max_message_bytes`.
        limit: usize,
    },

    /// The broker client failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl PublishError {
    /// Returns `true` for the not-connected error, which callers usually
    /// treat as "still warming up" rather than as a failure.
    pub fn is_not_connected(&self) -> bool {
        matches!(self, PublishError::NotConnected)
    }

    /// Returns `true` if the error came from the broker client.
    pub fn is_transport(&self) -> bool {
        matches!(self, PublishError::Transport(_))
    }

    /// Returns the transport error, if any.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            PublishError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// An opaque error raised by a broker client.
///
/// Wraps whatever error type the underlying client library uses so that
/// publishers share a single error surface.
pub struct TransportError {
    inner: Box<dyn StdError + Send + Sync + 'static>,
}

impl TransportError {
    /// Wraps a client error.
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self { inner: err.into() }
    }

    /// Creates a transport error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            inner: message.into().into(),
        }
    }

    /// Returns the wrapped error.
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    /// Attempts to downcast the wrapped error to a concrete type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Consumes the error, returning the wrapped one.
    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.inner
    }
}

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err)
    }
}

impl From<std::io::Error> for PublishError {
    fn from(err: std::io::Error) -> Self {
        PublishError::Transport(err.into())
    }
}

/// Structural problems with a broker address list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokersError {
    /// The list holds no addresses.
    #[error("broker list is empty")]
    Empty,

    /// An entry is not a valid `host:port` address.
    #[error("invalid broker address {address:?}: {reason}")]
    InvalidAddress {
        /// The offending entry.
        address: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Errors raised synchronously when constructing a producer.
///
/// These only cover invalid static configuration. An unreachable broker is
/// never a construction error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The broker list could not be parsed.
    #[error(transparent)]
    Brokers(#[from] BrokersError),

    /// The topic name is empty.
    #[error("topic name must not be empty")]
    EmptyTopic,

    /// The producer was built outside a Tokio runtime, so its background
    /// connect task has nowhere to run.
    #[error("a Tokio runtime is required to spawn the background connect task")]
    NoRuntime,
}

impl From<std::convert::Infallible> for BuildError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}
