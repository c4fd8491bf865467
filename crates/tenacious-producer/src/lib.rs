//! A message producer that keeps connecting to its broker in the background.
//!
//! Services that publish to an append-only broker usually start before the
//! broker is reachable. A [`SelfHealingProducer`] can be built immediately:
//! it returns right away and keeps trying to create the underlying publisher
//! on a background task. Until a publisher exists every call fails fast with
//! [`PublishError::NotConnected`]; afterwards calls are forwarded to it.
//!
//! # Features
//!
//! - **Non-blocking construction**: only invalid static input is an error
//! - **Configurable retries**: initial delay, fixed or exponential
//!   [`RetryPolicy`]
//! - **Pluggable transport**: any [`Connector`] / [`Publisher`] pair, with
//!   [`DirectConnector`] adapting a synchronous [`BrokerClient`]
//! - **Message envelope**: headers and body rendered as `FTMSG/1.0` text
//! - **Event system**: connect failures, connection and shutdown as
//!   [`ProducerEvent`]s
//! - **Tower integration**: [`PublisherService`] exposes a producer as a
//!   `Service<Message>`
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//! use tenacious_producer::{
//!     connector_fn, ConnectTarget, Message, PublishError, Publisher, PublisherConfig,
//!     SelfHealingConfig, SelfHealingProducer,
//! };
//! # use futures::future::BoxFuture;
//! # struct Noop;
//! # impl Publisher for Noop {
//! #     fn send_message(&self, _: Message) -> BoxFuture<'_, Result<(), PublishError>> { Box::pin(async { Ok(()) }) }
//! #     fn connectivity_check(&self) -> BoxFuture<'_, Result<(), PublishError>> { Box::pin(async { Ok(()) }) }
//! #     fn shutdown(&self) -> BoxFuture<'_, ()> { Box::pin(async {}) }
//! # }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SelfHealingConfig::builder()
//!     .name("content-producer")
//!     .initial_delay(Duration::from_millis(100))
//!     .retry_interval(Duration::from_secs(1))
//!     .on_connect_failed(|attempt, error| {
//!         println!("attempt {} failed: {}", attempt, error);
//!     })
//!     .build();
//!
//! let target = ConnectTarget::new(
//!     "kafka-1:9092,kafka-2:9092".parse()?,
//!     "content",
//!     PublisherConfig::default(),
//! );
//!
//! let producer = SelfHealingProducer::with_config(
//!     target,
//!     config,
//!     connector_fn(|_: &ConnectTarget| async { Ok(Noop) }),
//! )?;
//!
//! if producer.is_connected() {
//!     producer
//!         .send_message(Message::new([("X-Request-Id", "tid_1")], "payload"))
//!         .await?;
//! }
//!
//! producer.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod brokers;
mod config;
mod connector;
mod direct;
mod error;
mod events;
mod message;
mod policy;
mod producer;
mod publisher;
mod service;
mod state;

pub use brokers::{BrokerAddress, Brokers};
pub use config::{
    Compression, PublisherConfig, PublisherConfigBuilder, RequiredAcks, SelfHealingConfig,
    SelfHealingConfigBuilder, DEFAULT_MAX_MESSAGE_BYTES,
};
pub use connector::{connector_fn, ConnectTarget, Connector, ConnectorFn};
pub use direct::{BrokerClient, DirectConnector, DirectPublisher, Record};
pub use error::{BrokersError, BuildError, PublishError, TransportError};
pub use events::{EventListener, EventListeners, FnListener, ProducerEvent};
pub use message::{Message, MessageBuilder, ENVELOPE_PREAMBLE};
pub use policy::RetryPolicy;
pub use producer::SelfHealingProducer;
pub use publisher::{BoxPublisher, Publisher};
pub use service::PublisherService;
pub use state::ConnectionState;
