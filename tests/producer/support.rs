use futures::future::{self, BoxFuture};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tenacious_producer::{
    ConnectTarget, Connector, Message, PublishError, Publisher, SelfHealingProducer,
    TransportError, connector_fn,
};

/// Publisher double that records every call
#[derive(Default)]
pub(crate) struct RecordingPublisher {
    sent: Mutex<Vec<Message>>,
    checks: AtomicUsize,
    shutdowns: AtomicUsize,
    failure: Option<String>,
}

impl RecordingPublisher {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A publisher whose sends and connectivity checks fail with the given transport error
    pub(crate) fn failing(error: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(error.to_string()),
            ..Default::default()
        })
    }

    pub(crate) fn sent(&self) -> Vec<Message> {
        self.sent.lock().clone()
    }

    pub(crate) fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub(crate) fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    fn outcome(&self) -> Result<(), PublishError> {
        match &self.failure {
            Some(error) => Err(TransportError::msg(error.clone()).into()),
            None => Ok(()),
        }
    }
}

impl Publisher for RecordingPublisher {
    fn send_message(&self, message: Message) -> BoxFuture<'_, Result<(), PublishError>> {
        self.sent.lock().push(message);
        Box::pin(future::ready(self.outcome()))
    }

    fn connectivity_check(&self) -> BoxFuture<'_, Result<(), PublishError>> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Box::pin(future::ready(self.outcome()))
    }

    fn shutdown(&self) -> BoxFuture<'_, ()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Box::pin(future::ready(()))
    }
}

/// Connector that fails `failures` times, then hands out `publisher`.
///
/// Returns the connector and a counter of attempts made.
pub(crate) fn scripted_connector(
    failures: usize,
    publisher: Arc<RecordingPublisher>,
) -> (
    impl Connector<Publisher = Arc<RecordingPublisher>>,
    Arc<AtomicUsize>,
) {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);

    let connector = connector_fn(move |_: &ConnectTarget| {
        let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
        let publisher = Arc::clone(&publisher);
        async move {
            if attempt <= failures {
                Err(PublishError::from(TransportError::msg(
                    "kafka: client has run out of available brokers to talk to",
                )))
            } else {
                Ok(publisher)
            }
        }
    });

    (connector, attempts)
}

/// Connector that never succeeds.
pub(crate) fn unreachable_connector() -> (
    impl Connector<Publisher = Arc<RecordingPublisher>>,
    Arc<AtomicUsize>,
) {
    scripted_connector(usize::MAX, RecordingPublisher::new())
}

/// Connector whose attempts never complete.
pub(crate) fn hanging_connector() -> (
    impl Connector<Publisher = Arc<RecordingPublisher>>,
    Arc<AtomicUsize>,
) {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);

    let connector = connector_fn(move |_: &ConnectTarget| {
        counter.fetch_add(1, Ordering::SeqCst);
        future::pending::<Result<Arc<RecordingPublisher>, PublishError>>()
    });

    (connector, attempts)
}

/// Waits until the background task has installed a publisher
pub(crate) async fn wait_until_connected<P: Publisher>(producer: &SelfHealingProducer<P>) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !producer.is_connected() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("producer never connected");
}

/// Waits until `counter` reaches `expected`
pub(crate) async fn wait_for_count(counter: &AtomicUsize, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while counter.load(Ordering::SeqCst) < expected {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("counter never reached the expected value");
}
