use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tenacious_producer::{
    BrokerClient, ConnectTarget, DirectConnector, Message, Publisher, PublisherConfig, Record,
    SelfHealingConfig, SelfHealingProducer, TransportError,
};

/// Example: a producer that starts while its broker is still down.
///
/// The in-memory broker refuses the first three dials. The producer keeps
/// retrying in the background while the application fails fast, and starts
/// forwarding as soon as the broker comes up.
struct InMemoryBroker;

impl BrokerClient for InMemoryBroker {
    fn send(&self, record: Record) -> Result<(), TransportError> {
        println!("  broker <- [{}]\n{}", record.topic, record.value);
        Ok(())
    }

    fn fetch_metadata(&self, _topic: &str) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&self) -> Result<(), TransportError> {
        println!("  broker connection closed");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .init();

    println!("Self-Healing Producer Example\n");

    let dials = Arc::new(AtomicUsize::new(0));
    let dials_for_factory = Arc::clone(&dials);
    let connector = DirectConnector::new(move |target: &ConnectTarget| {
        let dial = dials_for_factory.fetch_add(1, Ordering::SeqCst) + 1;
        if dial <= 3 {
            Err(TransportError::msg(format!(
                "dial {}: connection refused",
                target.brokers()
            )))
        } else {
            Ok(InMemoryBroker)
        }
    });

    let config = SelfHealingConfig::builder()
        .name("content-producer")
        .initial_delay(Duration::from_millis(50))
        .retry_interval(Duration::from_millis(200))
        .on_connected(|failed_attempts| {
            println!("  connected after {} failed attempts", failed_attempts);
        })
        .build();

    let target = ConnectTarget::new(
        "localhost:9092".parse()?,
        "content",
        PublisherConfig::default(),
    );
    let producer = SelfHealingProducer::with_config(target, config, connector)?;

    println!("1. Sending while the broker is down");
    match producer.send_message(Message::with_body("too early")).await {
        Err(e) if e.is_not_connected() => println!("  rejected: {}\n", e),
        other => println!("  unexpected: {:?}\n", other),
    }

    println!("2. Waiting for the background task to connect");
    while !producer.is_connected() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    println!("  state: {}\n", producer.state());

    println!("3. Sending once connected");
    let message = Message::builder()
        .header("X-Request-Id", "tid_example")
        .header("Message-Type", "cms-content-published")
        .body(r#"{"uuid":"2d3e16e0-61cb-4322-8aff-3b01c59f4daa"}"#)
        .build();
    producer.send_message(message).await?;
    producer.connectivity_check().await?;

    println!("\n4. Shutting down");
    producer.shutdown().await;
    println!("  state: {}", producer.state());

    Ok(())
}
