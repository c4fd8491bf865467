//! Lifecycle events emitted by a self-healing producer.
//!
//! Listeners are registered through the callback methods on
//! [`SelfHealingConfigBuilder`](crate::SelfHealingConfigBuilder) and invoked
//! from the background connect task or from `shutdown`.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Events in the life of a self-healing producer.
#[derive(Debug, Clone)]
pub enum ProducerEvent {
    /// A bootstrap connect attempt failed and another one is scheduled.
    ConnectFailed {
        producer_name: String,
        timestamp: Instant,
        /// Failed attempts so far, including this one.
        attempt: u32,
        /// Rendered connect error.
        error: String,
        /// Wait before the next attempt.
        next_delay: Duration,
    },
    /// A publisher was installed; no further attempts will be made.
    Connected {
        producer_name: String,
        timestamp: Instant,
        /// Failed attempts that preceded the successful one.
        failed_attempts: u32,
    },
    /// The producer was shut down.
    ShutDown {
        producer_name: String,
        timestamp: Instant,
        /// Whether a publisher was installed and released.
        was_connected: bool,
    },
}

impl ProducerEvent {
    /// Returns a stable name for the event kind.
    pub fn event_type(&self) -> &'static str {
        match self {
            ProducerEvent::ConnectFailed { .. } => "connect_failed",
            ProducerEvent::Connected { .. } => "connected",
            ProducerEvent::ShutDown { .. } => "shut_down",
        }
    }

    /// Returns when the event occurred.
    pub fn timestamp(&self) -> Instant {
        match self {
            ProducerEvent::ConnectFailed { timestamp, .. }
            | ProducerEvent::Connected { timestamp, .. }
            | ProducerEvent::ShutDown { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the name of the producer that emitted the event.
    pub fn producer_name(&self) -> &str {
        match self {
            ProducerEvent::ConnectFailed { producer_name, .. }
            | ProducerEvent::Connected { producer_name, .. }
            | ProducerEvent::ShutDown { producer_name, .. } => producer_name,
        }
    }
}

/// Receives producer events.
pub trait EventListener: Send + Sync {
    /// Called for every emitted event.
    fn on_event(&self, event: &ProducerEvent);
}

/// Listener backed by a closure.
pub struct FnListener<F>(F);

impl<F> FnListener<F>
where
    F: Fn(&ProducerEvent) + Send + Sync,
{
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventListener for FnListener<F>
where
    F: Fn(&ProducerEvent) + Send + Sync,
{
    fn on_event(&self, event: &ProducerEvent) {
        (self.0)(event)
    }
}

/// The listeners registered on one producer.
#[derive(Clone, Default)]
pub struct EventListeners {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventListeners {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Delivers an event to every listener.
    ///
    /// A panicking listener is isolated so the others still run and the
    /// connect task survives.
    pub fn emit(&self, event: &ProducerEvent) {
        for listener in &self.listeners {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
        }
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Returns the number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}
