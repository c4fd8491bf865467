//! Calls before and after a publisher is installed.

use super::support::*;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tenacious_producer::{
    ConnectionState, Message, PublishError, Publisher, PublisherConfig, SelfHealingProducer,
};

fn producer_with<C>(connector: C, initial_delay: Duration) -> SelfHealingProducer<C::Publisher>
where
    C: tenacious_producer::Connector,
{
    SelfHealingProducer::new(
        "localhost:9092",
        "testTopic",
        PublisherConfig::default(),
        initial_delay,
        Duration::from_millis(10),
        connector,
    )
    .unwrap()
}

#[tokio::test]
async fn forwards_message_unchanged() {
    let publisher = RecordingPublisher::new();
    let (connector, _attempts) = scripted_connector(0, Arc::clone(&publisher));
    let producer = producer_with(connector, Duration::ZERO);

    wait_until_connected(&producer).await;

    let message = Message::new([("X-Request-Id", "test")], r#"{"foo":"bar"}"#);
    producer.send_message(message.clone()).await.unwrap();

    assert_eq!(publisher.sent(), [message]);
}

#[tokio::test]
async fn send_while_disconnected_never_reaches_transport() {
    let publisher = RecordingPublisher::new();
    let (connector, attempts) = scripted_connector(0, Arc::clone(&publisher));
    let producer = producer_with(connector, Duration::from_secs(3600));

    for i in 0..5 {
        let err = producer
            .send_message(Message::with_body(format!("message {}", i)))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::NotConnected));
    }
    assert!(producer.connectivity_check().await.unwrap_err().is_not_connected());

    assert!(publisher.sent().is_empty());
    assert_eq!(publisher.checks(), 0);
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
    assert_eq!(producer.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn transport_errors_pass_through() {
    let publisher = RecordingPublisher::failing("kafka server: Message was too large");
    let (connector, _attempts) = scripted_connector(0, Arc::clone(&publisher));
    let producer = producer_with(connector, Duration::ZERO);

    wait_until_connected(&producer).await;

    let err = producer
        .send_message(Message::with_body("payload"))
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.to_string(), "kafka server: Message was too large");

    let err = producer.connectivity_check().await.unwrap_err();
    assert!(err.is_transport());

    // A failing publisher stays installed
    assert!(producer.is_connected());
    assert_eq!(publisher.sent().len(), 1);
}

#[tokio::test]
async fn connectivity_check_reaches_publisher_once_connected() {
    let publisher = RecordingPublisher::new();
    let (connector, attempts) = scripted_connector(1, Arc::clone(&publisher));
    let producer = producer_with(connector, Duration::ZERO);

    wait_until_connected(&producer).await;
    producer.connectivity_check().await.unwrap();
    producer.connectivity_check().await.unwrap();

    assert_eq!(publisher.checks(), 2);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sends_are_all_forwarded() {
    let publisher = RecordingPublisher::new();
    let (connector, _attempts) = scripted_connector(0, Arc::clone(&publisher));
    let producer = Arc::new(producer_with(connector, Duration::ZERO));

    wait_until_connected(&*producer).await;

    let mut handles = Vec::new();
    for i in 0..20 {
        let producer = Arc::clone(&producer);
        handles.push(tokio::spawn(async move {
            let message = Message::new([("X-Request-Id", format!("tid_{}", i))], "body");
            producer.send_message(message).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut ids: Vec<String> = publisher
        .sent()
        .iter()
        .filter_map(|m| m.header("X-Request-Id").map(str::to_string))
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

#[tokio::test]
async fn boxed_producer_is_a_publisher() {
    let publisher = RecordingPublisher::new();
    let (connector, _attempts) = scripted_connector(0, Arc::clone(&publisher));
    let producer = producer_with(connector, Duration::ZERO);
    wait_until_connected(&producer).await;

    let boxed: tenacious_producer::BoxPublisher = Box::new(producer);
    boxed.send_message(Message::with_body("via box")).await.unwrap();
    boxed.shutdown().await;

    assert_eq!(publisher.sent()[0].body(), "via box");
    assert_eq!(publisher.shutdowns(), 1);
}
