//! Broker-client publisher behind the self-healing producer.

use super::support::wait_until_connected;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tenacious_producer::{
    BrokerClient, ConnectTarget, DirectConnector, Message, Publisher, PublisherConfig, Record,
    SelfHealingConfig, SelfHealingProducer, TransportError,
};
use tower::{Service, ServiceExt};

/// In-memory broker shared by every client it hands out
#[derive(Default)]
struct Broker {
    log: Mutex<Vec<Record>>,
    dials: AtomicUsize,
    closes: AtomicUsize,
}

struct Client {
    broker: Arc<Broker>,
}

impl BrokerClient for Client {
    fn send(&self, record: Record) -> Result<(), TransportError> {
        self.broker.log.lock().push(record);
        Ok(())
    }

    fn fetch_metadata(&self, topic: &str) -> Result<(), TransportError> {
        if topic.is_empty() {
            return Err(TransportError::msg("kafka server: Unknown topic"));
        }
        Ok(())
    }

    fn close(&self) -> Result<(), TransportError> {
        self.broker.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Producer whose broker accepts the dial after `down_for` refusals
fn producer_for(
    broker: &Arc<Broker>,
    down_for: usize,
    config: PublisherConfig,
) -> SelfHealingProducer<tenacious_producer::DirectPublisher<Client>> {
    let broker = Arc::clone(broker);
    let connector = DirectConnector::new(move |target: &ConnectTarget| {
        let dial = broker.dials.fetch_add(1, Ordering::SeqCst) + 1;
        if dial <= down_for {
            return Err(TransportError::msg(format!(
                "dial tcp {}: connect: connection refused",
                target.brokers()
            )));
        }
        Ok(Client {
            broker: Arc::clone(&broker),
        })
    });

    SelfHealingProducer::with_config(
        ConnectTarget::new("localhost:9092".parse().unwrap(), "content", config),
        SelfHealingConfig::builder()
            .retry_interval(Duration::from_millis(10))
            .build(),
        connector,
    )
    .unwrap()
}

#[tokio::test]
async fn messages_reach_the_broker_as_envelopes() {
    let broker = Arc::new(Broker::default());
    let producer = producer_for(&broker, 2, PublisherConfig::default());

    wait_until_connected(&producer).await;
    assert_eq!(broker.dials.load(Ordering::SeqCst), 3);

    let message = Message::builder()
        .header("X-Request-Id", "tid_direct")
        .header("Message-Timestamp", "2024-01-01T00:00:00.000Z")
        .body(r#"{"uuid":"c2c6d8f4-3a47-4dbb-8d3d-6cd5ac1e8d6c"}"#)
        .build();
    producer.send_message(message.clone()).await.unwrap();
    producer.connectivity_check().await.unwrap();

    let log = broker.log.lock().clone();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].topic, "content");
    assert!(log[0].value.starts_with("FTMSG/1.0\r\n"));
    assert_eq!(Message::from_envelope(&log[0].value), message);
}

#[tokio::test]
async fn oversized_messages_are_rejected_before_the_broker() {
    let broker = Arc::new(Broker::default());
    let config = PublisherConfig::builder().max_message_bytes(64).build();
    let producer = producer_for(&broker, 0, config);

    wait_until_connected(&producer).await;

    let err = producer
        .send_message(Message::with_body("x".repeat(128)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        tenacious_producer::PublishError::MessageTooLarge { limit: 64, .. }
    ));
    assert!(broker.log.lock().is_empty());
}

#[tokio::test]
async fn shutdown_closes_the_client_once() {
    let broker = Arc::new(Broker::default());
    let producer = producer_for(&broker, 0, PublisherConfig::default());

    wait_until_connected(&producer).await;
    producer.shutdown().await;
    producer.shutdown().await;

    assert_eq!(broker.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn producer_works_as_a_tower_service() {
    let broker = Arc::new(Broker::default());
    let producer = producer_for(&broker, 0, PublisherConfig::default());
    wait_until_connected(&producer).await;

    let mut service = producer.into_service();
    service
        .ready()
        .await
        .unwrap()
        .call(Message::with_body("first"))
        .await
        .unwrap();
    service
        .clone()
        .oneshot(Message::with_body("second"))
        .await
        .unwrap();

    let bodies: Vec<String> = broker
        .log
        .lock()
        .iter()
        .map(|record| Message::from_envelope(&record.value).body().to_string())
        .collect();
    assert_eq!(bodies, ["first", "second"]);

    service.publisher().shutdown().await;
    assert_eq!(broker.closes.load(Ordering::SeqCst), 1);
}
