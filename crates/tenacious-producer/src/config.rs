//! Configuration for self-healing producers and the publishers they build.

use crate::events::{EventListeners, FnListener, ProducerEvent};
use crate::policy::RetryPolicy;
use std::time::Duration;

/// Default `max_message_bytes`: 16 MiB.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Compression codec requested from the broker client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Snappy,
    Lz4,
    Zstd,
}

/// Acknowledgement level the broker client waits for on each send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RequiredAcks {
    /// Fire and forget.
    None,
    /// Wait for the partition leader.
    #[default]
    Leader,
    /// Wait for all in-sync replicas.
    All,
}

/// Options handed through to the broker client when a publisher is built.
///
/// The self-healing producer never interprets these; only
/// `max_message_bytes` is enforced, by [`DirectPublisher`](crate::DirectPublisher).
///
/// # Examples
///
/// ```
/// use tenacious_producer::{Compression, PublisherConfig, RequiredAcks};
///
/// let config = PublisherConfig::builder()
///     .max_message_bytes(1024 * 1024)
///     .compression(Compression::Snappy)
///     .required_acks(RequiredAcks::All)
///     .client_id("content-publisher")
///     .build();
///
/// assert_eq!(config.max_message_bytes, 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PublisherConfig {
    /// Largest encoded message the publisher accepts.
    pub max_message_bytes: usize,
    /// Compression codec.
    pub compression: Compression,
    /// Acknowledgement level.
    pub required_acks: RequiredAcks,
    /// Whether sends wait for the broker's success report.
    pub return_successes: bool,
    /// Client identifier reported to the broker.
    pub client_id: Option<String>,
}

impl PublisherConfig {
    /// Creates a builder seeded with the defaults.
    pub fn builder() -> PublisherConfigBuilder {
        PublisherConfigBuilder::default()
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            compression: Compression::None,
            required_acks: RequiredAcks::Leader,
            return_successes: true,
            client_id: None,
        }
    }
}

/// Builder for [`PublisherConfig`].
#[derive(Debug, Clone, Default)]
pub struct PublisherConfigBuilder {
    config: PublisherConfig,
}

impl PublisherConfigBuilder {
    /// Sets the largest accepted encoded message.
    ///
    /// Default: 16 MiB
    pub fn max_message_bytes(mut self, bytes: usize) -> Self {
        self.config.max_message_bytes = bytes;
        self
    }

    /// Sets the compression codec.
    ///
    /// Default: none
    pub fn compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }

    /// Sets the acknowledgement level.
    ///
    /// Default: leader
    pub fn required_acks(mut self, acks: RequiredAcks) -> Self {
        self.config.required_acks = acks;
        self
    }

    /// Sets whether sends wait for the broker's success report.
    ///
    /// Default: true
    pub fn return_successes(mut self, enabled: bool) -> Self {
        self.config.return_successes = enabled;
        self
    }

    /// Sets the client identifier.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.config.client_id = Some(id.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> PublisherConfig {
        self.config
    }
}

/// Bootstrap behaviour of a self-healing producer.
#[derive(Clone, Debug)]
pub struct SelfHealingConfig {
    /// Name used in events, logs and metric labels.
    pub(crate) name: String,
    /// Wait before the first connect attempt.
    pub(crate) initial_delay: Duration,
    /// Wait between failed attempts.
    pub(crate) retry_policy: RetryPolicy,
    pub(crate) event_listeners: EventListeners,
}

impl SelfHealingConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> SelfHealingConfigBuilder {
        SelfHealingConfigBuilder::new()
    }

    /// Returns the producer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the initial delay.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Returns the retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

impl Default for SelfHealingConfig {
    fn default() -> Self {
        SelfHealingConfigBuilder::new().build()
    }
}

/// Builder for [`SelfHealingConfig`].
pub struct SelfHealingConfigBuilder {
    name: String,
    initial_delay: Duration,
    retry_policy: RetryPolicy,
    event_listeners: EventListeners,
}

impl SelfHealingConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            name: "producer".to_string(),
            initial_delay: Duration::ZERO,
            retry_policy: RetryPolicy::default(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name of this producer instance.
    ///
    /// Default: "producer"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the wait before the first connect attempt. Zero attempts
    /// immediately.
    ///
    /// Default: zero
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets a fixed wait between failed attempts.
    ///
    /// Default: 1 second
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_policy = RetryPolicy::fixed(interval);
        self
    }

    /// Sets the retry policy, replacing any `retry_interval`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use tenacious_producer::{RetryPolicy, SelfHealingConfig};
    ///
    /// let config = SelfHealingConfig::builder()
    ///     .retry_policy(RetryPolicy::exponential(
    ///         Duration::from_millis(100),
    ///         Duration::from_secs(30),
    ///     ))
    ///     .build();
    /// ```
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Registers a callback for failed connect attempts.
    ///
    /// # Callback Signature
    /// `Fn(u32, &str)` - the number of failed attempts so far and the
    /// rendered connect error.
    ///
    /// # Example
    /// ```rust,no_run
    /// use tenacious_producer::SelfHealingConfig;
    ///
    /// let config = SelfHealingConfig::builder()
    ///     .on_connect_failed(|attempt, error| {
    ///         eprintln!("broker unreachable (attempt {}): {}", attempt, error);
    ///     })
    ///     .build();
    /// ```
    pub fn on_connect_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, &str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ProducerEvent::ConnectFailed { attempt, error, .. } = event {
                f(*attempt, error);
            }
        }));
        self
    }

    /// Registers a callback for the moment a publisher is installed.
    ///
    /// # Callback Signature
    /// `Fn(u32)` - the number of failed attempts before the successful one.
    pub fn on_connected<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ProducerEvent::Connected {
                failed_attempts, ..
            } = event
            {
                f(*failed_attempts);
            }
        }));
        self
    }

    /// Registers a callback for shutdown.
    ///
    /// # Callback Signature
    /// `Fn(bool)` - whether a publisher was installed when shutdown ran.
    pub fn on_shutdown<F>(mut self, f: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ProducerEvent::ShutDown { was_connected, .. } = event {
                f(*was_connected);
            }
        }));
        self
    }

    /// Registers a listener that receives every event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&ProducerEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> SelfHealingConfig {
        SelfHealingConfig {
            name: self.name,
            initial_delay: self.initial_delay,
            retry_policy: self.retry_policy,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for SelfHealingConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
