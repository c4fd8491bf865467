//! The self-healing producer.
//!
//! Construction never waits on the network. A background task keeps trying
//! to build a publisher (after an initial delay, then on the retry policy)
//! and installs the first one that connects. Until then every call fails
//! fast with [`PublishError::NotConnected`].
//!
//! Reconnection is a bootstrap concern only: once a publisher is installed
//! the task exits, and later transport failures are reported by the
//! publisher itself on each call.

use crate::brokers::Brokers;
use crate::config::{PublisherConfig, SelfHealingConfig};
use crate::connector::{ConnectTarget, Connector};
use crate::error::{BuildError, PublishError};
use crate::events::ProducerEvent;
use crate::message::Message;
use crate::publisher::Publisher;
use crate::service::PublisherService;
use crate::state::ConnectionState;
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, gauge};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// A producer that connects in the background and forwards to the
/// publisher once it exists.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tenacious_producer::{
///     BrokerClient, ConnectTarget, DirectConnector, Message, Publisher, PublisherConfig,
///     Record, SelfHealingProducer, TransportError,
/// };
///
/// struct Unreachable;
///
/// impl BrokerClient for Unreachable {
///     fn send(&self, _: Record) -> Result<(), TransportError> { Ok(()) }
///     fn fetch_metadata(&self, _: &str) -> Result<(), TransportError> { Ok(()) }
///     fn close(&self) -> Result<(), TransportError> { Ok(()) }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let connector = DirectConnector::new(|_: &ConnectTarget| {
///     Err::<Unreachable, _>(TransportError::msg("connection refused"))
/// });
///
/// let producer = SelfHealingProducer::new(
///     "127.0.0.1:9092",
///     "content",
///     PublisherConfig::default(),
///     Duration::ZERO,
///     Duration::from_secs(1),
///     connector,
/// )?;
///
/// // The broker is down, so the producer is still warming up.
/// let err = producer.send_message(Message::with_body("hello")).await.unwrap_err();
/// assert!(err.is_not_connected());
///
/// producer.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct SelfHealingProducer<P> {
    shared: Arc<Shared<P>>,
    target: Arc<ConnectTarget>,
    stop: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
    runtime: tokio::runtime::Handle,
    release: Mutex<Option<future::Shared<BoxFuture<'static, ()>>>>,
}

struct Shared<P> {
    slot: Mutex<Slot<P>>,
    failed_attempts: AtomicU32,
    config: SelfHealingConfig,
}

enum Slot<P> {
    Disconnected,
    Connected(Arc<P>),
    Stopped,
}

impl<P> Slot<P> {
    fn state(&self) -> ConnectionState {
        match self {
            Slot::Disconnected => ConnectionState::Disconnected,
            Slot::Connected(_) => ConnectionState::Connected,
            Slot::Stopped => ConnectionState::Stopped,
        }
    }
}

impl<P: Publisher> SelfHealingProducer<P> {
    /// Creates a producer and starts connecting in the background.
    ///
    /// `brokers` is a comma-separated string or a list of addresses. The
    /// first attempt runs after `initial_delay`; failed attempts are retried
    /// every `retry_interval` until one succeeds or the producer is shut
    /// down.
    ///
    /// Fails only on invalid static input or when called outside a Tokio
    /// runtime. An unreachable broker is never an error here.
    pub fn new<B, C>(
        brokers: B,
        topic: impl Into<String>,
        publisher_config: PublisherConfig,
        initial_delay: Duration,
        retry_interval: Duration,
        connector: C,
    ) -> Result<Self, BuildError>
    where
        B: TryInto<Brokers>,
        B::Error: Into<BuildError>,
        C: Connector<Publisher = P>,
    {
        let brokers: Brokers = brokers.try_into().map_err(Into::<BuildError>::into)?;
        let target = ConnectTarget::new(brokers, topic, publisher_config);
        let config = SelfHealingConfig::builder()
            .initial_delay(initial_delay)
            .retry_interval(retry_interval)
            .build();
        Self::with_config(target, config, connector)
    }

    /// Creates a producer from a prepared target and full configuration.
    pub fn with_config<C>(
        target: ConnectTarget,
        config: SelfHealingConfig,
        connector: C,
    ) -> Result<Self, BuildError>
    where
        C: Connector<Publisher = P>,
    {
        if target.topic().trim().is_empty() {
            return Err(BuildError::EmptyTopic);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!(
                    "producer_connect_attempts_total",
                    "Total number of bootstrap connection attempts"
                );
                describe_gauge!(
                    "producer_connected",
                    "Whether the producer has an installed publisher (0 or 1)"
                );
                describe_counter!(
                    "producer_messages_total",
                    "Total number of messages handed to the producer"
                );
            });
            gauge!("producer_connected", "producer" => config.name.clone()).set(0.0);
        }

        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot::Disconnected),
            failed_attempts: AtomicU32::new(0),
            config,
        });
        let target = Arc::new(target);
        let (stop, stop_rx) = watch::channel(false);

        let task = runtime.spawn(connect_loop(
            connector,
            Arc::clone(&target),
            Arc::clone(&shared),
            stop_rx,
        ));

        Ok(Self {
            shared,
            target,
            stop,
            task: Mutex::new(Some(task)),
            runtime,
            release: Mutex::new(None),
        })
    }

    /// Returns the current connectivity state.
    pub fn state(&self) -> ConnectionState {
        self.shared.slot.lock().state()
    }

    /// Returns `true` once a publisher is installed, until shutdown.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Returns the number of failed connect attempts so far.
    pub fn failed_attempts(&self) -> u32 {
        self.shared.failed_attempts.load(Ordering::Acquire)
    }

    /// Returns the producer name from its configuration.
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// Returns the destination topic.
    pub fn topic(&self) -> &str {
        self.target.topic()
    }

    /// Returns the configured brokers.
    pub fn brokers(&self) -> &Brokers {
        self.target.brokers()
    }

    /// Wraps the producer in a `tower::Service<Message>`.
    pub fn into_service(self) -> PublisherService<Self> {
        PublisherService::new(self)
    }

    fn installed(&self) -> Result<Arc<P>, PublishError> {
        match &*self.shared.slot.lock() {
            Slot::Connected(publisher) => Ok(Arc::clone(publisher)),
            Slot::Disconnected | Slot::Stopped => Err(PublishError::NotConnected),
        }
    }

    #[cfg(feature = "metrics")]
    fn record_send(&self, result: &Result<(), PublishError>) {
        let outcome = match result {
            Ok(()) => "sent",
            Err(PublishError::NotConnected) => "not_connected",
            Err(_) => "failed",
        };
        counter!(
            "producer_messages_total",
            "producer" => self.shared.config.name.clone(),
            "outcome" => outcome
        )
        .increment(1);
    }
}

impl<P: Publisher> Publisher for SelfHealingProducer<P> {
    fn send_message(&self, message: Message) -> BoxFuture<'_, Result<(), PublishError>> {
        let publisher = match self.installed() {
            Ok(publisher) => publisher,
            Err(err) => {
                #[cfg(feature = "metrics")]
                self.record_send(&Err(PublishError::NotConnected));
                return Box::pin(future::ready(Err(err)));
            }
        };

        Box::pin(async move {
            let result = publisher.send_message(message).await;
            #[cfg(feature = "metrics")]
            self.record_send(&result);
            result
        })
    }

    fn connectivity_check(&self) -> BoxFuture<'_, Result<(), PublishError>> {
        match self.installed() {
            Ok(publisher) => Box::pin(async move { publisher.connectivity_check().await }),
            Err(err) => Box::pin(future::ready(Err(err))),
        }
    }

    fn shutdown(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let release = self
                .release
                .lock()
                .get_or_insert_with(|| self.begin_release())
                .clone();
            release.await;
        })
    }
}

impl<P: Publisher> SelfHealingProducer<P> {
    /// Stops the connect task and releases the publisher on a spawned task.
    /// Every `shutdown` call awaits this same release.
    fn begin_release(&self) -> future::Shared<BoxFuture<'static, ()>> {
        self.stop.send_replace(true);
        let previous = std::mem::replace(&mut *self.shared.slot.lock(), Slot::Stopped);
        let connect_task = self.task.lock().take();
        let shared = Arc::clone(&self.shared);
        #[cfg(feature = "tracing")]
        let topic = self.target.topic().to_string();

        let release = self.runtime.spawn(async move {
            if let Some(task) = connect_task {
                let _ = task.await;
            }

            let was_connected = match previous {
                Slot::Disconnected | Slot::Stopped => false,
                Slot::Connected(publisher) => {
                    publisher.shutdown().await;
                    true
                }
            };

            #[cfg(feature = "tracing")]
            tracing::info!(
                producer = %shared.config.name,
                topic = %topic,
                was_connected,
                "producer shut down"
            );

            #[cfg(feature = "metrics")]
            gauge!("producer_connected", "producer" => shared.config.name.clone()).set(0.0);

            shared.config.event_listeners.emit(&ProducerEvent::ShutDown {
                producer_name: shared.config.name.clone(),
                timestamp: Instant::now(),
                was_connected,
            });
        });

        release.map(|_| ()).boxed().shared()
    }
}

impl<P> Drop for SelfHealingProducer<P> {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

impl<P> fmt::Debug for SelfHealingProducer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelfHealingProducer")
            .field("name", &self.shared.config.name)
            .field("topic", &self.target.topic())
            .field("brokers", &self.target.brokers().to_string())
            .field("state", &self.shared.slot.lock().state())
            .field(
                "failed_attempts",
                &self.shared.failed_attempts.load(Ordering::Relaxed),
            )
            .finish()
    }
}

/// Resolves once shutdown is signalled or the producer is gone.
async fn stopped(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

/// Sleeps for `delay`. Returns `true` if shutdown interrupted the wait.
async fn sleep_or_stop(stop: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    tokio::select! {
        biased;
        _ = stopped(stop) => true,
        _ = tokio::time::sleep(delay) => false,
    }
}

async fn connect_loop<C: Connector>(
    connector: C,
    target: Arc<ConnectTarget>,
    shared: Arc<Shared<C::Publisher>>,
    mut stop: watch::Receiver<bool>,
) {
    let config = &shared.config;

    if !config.initial_delay.is_zero() && sleep_or_stop(&mut stop, config.initial_delay).await {
        return;
    }

    loop {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            producer = %config.name,
            brokers = %target.brokers(),
            topic = %target.topic(),
            "connecting to broker"
        );

        let attempt = tokio::select! {
            biased;
            _ = stopped(&mut stop) => return,
            result = connector.connect(&target) => result,
        };

        match attempt {
            Ok(publisher) => {
                let rejected = {
                    let mut slot = shared.slot.lock();
                    if matches!(*slot, Slot::Disconnected) {
                        *slot = Slot::Connected(Arc::new(publisher));
                        None
                    } else {
                        Some(publisher)
                    }
                };

                // Shutdown won the race: release what was just built.
                if let Some(publisher) = rejected {
                    publisher.shutdown().await;
                    return;
                }

                let failed_attempts = shared.failed_attempts.load(Ordering::Acquire);

                #[cfg(feature = "tracing")]
                tracing::info!(
                    producer = %config.name,
                    topic = %target.topic(),
                    failed_attempts,
                    "producer connected"
                );

                #[cfg(feature = "metrics")]
                {
                    counter!(
                        "producer_connect_attempts_total",
                        "producer" => config.name.clone(),
                        "outcome" => "success"
                    )
                    .increment(1);
                    gauge!("producer_connected", "producer" => config.name.clone()).set(1.0);
                }

                config.event_listeners.emit(&ProducerEvent::Connected {
                    producer_name: config.name.clone(),
                    timestamp: Instant::now(),
                    failed_attempts,
                });
                return;
            }
            Err(err) => {
                let attempt = shared.failed_attempts.fetch_add(1, Ordering::AcqRel) + 1;
                let delay = config.retry_policy.delay_for_attempt(attempt);

                #[cfg(feature = "tracing")]
                tracing::warn!(
                    producer = %config.name,
                    topic = %target.topic(),
                    attempt,
                    error = %err,
                    retry_in = ?delay,
                    "error creating producer, retrying"
                );

                #[cfg(feature = "metrics")]
                counter!(
                    "producer_connect_attempts_total",
                    "producer" => config.name.clone(),
                    "outcome" => "failure"
                )
                .increment(1);

                config.event_listeners.emit(&ProducerEvent::ConnectFailed {
                    producer_name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempt,
                    error: err.to_string(),
                    next_delay: delay,
                });

                if sleep_or_stop(&mut stop, delay).await {
                    return;
                }
            }
        }
    }
}
