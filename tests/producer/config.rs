//! Configuration loading and validation.

use super::support::unreachable_connector;
use std::time::Duration;
use tenacious_producer::{
    BrokersError, BuildError, Brokers, Compression, PublisherConfig, RequiredAcks,
    SelfHealingProducer, DEFAULT_MAX_MESSAGE_BYTES,
};

#[test]
fn publisher_config_loads_from_json_with_defaults() {
    let config: PublisherConfig =
        serde_json::from_str(r#"{"compression":"snappy","client_id":"content-writer"}"#).unwrap();

    assert_eq!(config.compression, Compression::Snappy);
    assert_eq!(config.client_id.as_deref(), Some("content-writer"));
    assert_eq!(config.required_acks, RequiredAcks::Leader);
    assert_eq!(config.max_message_bytes, DEFAULT_MAX_MESSAGE_BYTES);
    assert!(config.return_successes);
}

#[test]
fn construction_outside_a_runtime_fails() {
    let (connector, _attempts) = unreachable_connector();
    let err = SelfHealingProducer::new(
        "localhost:9092",
        "content",
        PublisherConfig::default(),
        Duration::ZERO,
        Duration::from_secs(1),
        connector,
    )
    .unwrap_err();

    assert_eq!(err, BuildError::NoRuntime);
}

#[tokio::test]
async fn malformed_broker_lists_are_rejected() {
    for list in ["", " , ", "localhost", "localhost:0", "::1:9092", "host name:9092"] {
        let (connector, _attempts) = unreachable_connector();
        let err = SelfHealingProducer::new(
            list,
            "content",
            PublisherConfig::default(),
            Duration::ZERO,
            Duration::from_secs(1),
            connector,
        )
        .unwrap_err();
        assert!(
            matches!(err, BuildError::Brokers(_)),
            "{:?} should be rejected, got {:?}",
            list,
            err
        );
    }
}

#[tokio::test]
async fn accepts_prepared_broker_lists() {
    let brokers = Brokers::try_from(vec![
        "kafka-1:9092".to_string(),
        "[::1]:9093".to_string(),
    ])
    .unwrap();

    let (connector, _attempts) = unreachable_connector();
    let producer = SelfHealingProducer::new(
        brokers.clone(),
        "content",
        PublisherConfig::default(),
        Duration::from_secs(60),
        Duration::from_secs(1),
        connector,
    )
    .unwrap();

    assert_eq!(producer.brokers(), &brokers);
    assert_eq!(producer.brokers().to_string(), "kafka-1:9092,[::1]:9093");
}

#[tokio::test]
async fn empty_topic_is_rejected() {
    let (connector, _attempts) = unreachable_connector();
    let err = SelfHealingProducer::new(
        "localhost:9092",
        "",
        PublisherConfig::default(),
        Duration::ZERO,
        Duration::from_secs(1),
        connector,
    )
    .unwrap_err();

    assert_eq!(err, BuildError::EmptyTopic);
    assert_ne!(err, BuildError::Brokers(BrokersError::Empty));
}
