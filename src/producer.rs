use std::error::Error;

use async_trait::async_trait;
use serde::Serialize;
use tracing::Instrument;

use crate::{
    codec::avro::{AvroSerializer, AvroSerializerError, SchemaRegistry},
    serialization::SerializationContext,
};

/// Produces records whose key and value are framed for the schema registry.
///
/// A [`SerializationContext`] is built for every record, so one producer (and
/// its serializers) can serve any number of topics.
pub struct AvroProducer<P: Producer, R: SchemaRegistry> {
    producer: P,
    key_serializer: Option<AvroSerializer<R>>,
    value_serializer: AvroSerializer<R>,
}

impl<P: Producer, R: SchemaRegistry> AvroProducer<P, R> {
    pub fn new(producer: P, value_serializer: AvroSerializer<R>) -> Self {
        Self {
            producer,
            key_serializer: None,
            value_serializer,
        }
    }

    pub fn key_serializer(self, key_serializer: AvroSerializer<R>) -> Self {
        Self {
            key_serializer: Some(key_serializer),
            ..self
        }
    }

    /// Resolves schema ids for `topic` so the first [`Self::produce`] does not
    /// wait on the registry.
    pub async fn preload(&self, topic: &str) -> Result<(), ProducerError<P::Error>> {
        if let Some(key_serializer) = &self.key_serializer {
            key_serializer
                .load_registry_schema_id(&SerializationContext::key(topic))
                .await
                .map_err(ProducerError::EncodeError)?;
        }

        self.value_serializer
            .load_registry_schema_id(&SerializationContext::value(topic))
            .await
            .map_err(ProducerError::EncodeError)?;

        Ok(())
    }

    pub async fn produce<K, V>(
        &self,
        topic: &str,
        key: Option<&K>,
        value: &V,
        options: P::Options,
    ) -> Result<(), ProducerError<P::Error>>
    where
        K: Serialize + Sync + ?Sized,
        V: Serialize + Sync + ?Sized,
    {
        let key = match (key, &self.key_serializer) {
            (None, _) => None,
            (Some(key), Some(key_serializer)) => Some(
                key_serializer
                    .encode(key, &SerializationContext::key(topic))
                    .await
                    .map_err(ProducerError::EncodeError)?,
            ),
            (Some(_), None) => return Err(ProducerError::MissingKeySerializer),
        };

        let payload = self
            .value_serializer
            .encode(value, &SerializationContext::value(topic))
            .await
            .map_err(ProducerError::EncodeError)?;

        let span = self.producer.make_span(topic, &payload, &options);

        self.producer
            .send(topic, key, payload, options)
            .instrument(span)
            .await
            .map_err(ProducerError::SendError)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProducerError<P: Error> {
    #[error("Failed to produce message: {0}")]
    SendError(P),

    #[error("Failed to encode message: {0}")]
    EncodeError(AvroSerializerError),

    #[error("Message has a key but no key serializer is configured")]
    MissingKeySerializer,
}

#[async_trait]
pub trait Producer: Send + Sync + Sized + 'static {
    type Options: Default + Send;
    type Error: Error;

    async fn send(
        &self,
        topic: &str,
        key: Option<Vec<u8>>,
        payload: Vec<u8>,
        options: Self::Options,
    ) -> Result<(), Self::Error>;

    fn make_span(&self, topic: &str, payload: &[u8], options: &Self::Options) -> tracing::Span;
}

#[cfg(test)]
mod test {
    use std::convert::Infallible;

    use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

    use crate::{
        codec::{
            avro::{AvroSerializerConfig, Schema},
            WireHeader,
        },
        test::MockRegistry,
    };

    use super::*;

    #[derive(Debug)]
    struct TestWireMessage {
        topic: String,
        key: Option<Vec<u8>>,
        payload: Vec<u8>,
    }

    struct TestProducer {
        sender: UnboundedSender<TestWireMessage>,
    }

    #[async_trait]
    impl Producer for TestProducer {
        type Options = ();
        type Error = Infallible;

        async fn send(
            &self,
            topic: &str,
            key: Option<Vec<u8>>,
            payload: Vec<u8>,
            _: Self::Options,
        ) -> Result<(), Self::Error> {
            self.sender
                .send(TestWireMessage {
                    topic: topic.to_owned(),
                    key,
                    payload,
                })
                .unwrap();

            Ok(())
        }

        fn make_span(&self, topic: &str, _payload: &[u8], _options: &Self::Options) -> tracing::Span {
            tracing::info_span!(
                "producer",
                otel.name = %format!("{} send", topic).as_str(),
                otel.kind = "PRODUCER",
                messaging.system = "memory",
                messaging.destination = %topic,
                messaging.destination_kind = "topic",
            )
        }
    }

    fn serializer(registry: &MockRegistry, schema: &str) -> AvroSerializer<MockRegistry> {
        AvroSerializer::new(
            registry.clone(),
            Some(Schema::parse(schema).unwrap()),
            AvroSerializerConfig::default(),
        )
        .unwrap()
    }

    fn producer_with_receiver(
        registry: &MockRegistry,
    ) -> (
        AvroProducer<TestProducer, MockRegistry>,
        UnboundedReceiver<TestWireMessage>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();

        let producer = AvroProducer::new(TestProducer { sender: tx }, serializer(registry, "long"))
            .key_serializer(serializer(registry, "string"));

        (producer, rx)
    }

    #[tokio::test]
    async fn produce_frames_key_and_value() {
        let registry = MockRegistry::default();
        let (producer, mut rx) = producer_with_receiver(&registry);

        producer
            .produce("orders", Some("order-1"), &42i64, ())
            .await
            .unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.topic, "orders");

        let key = received.key.unwrap();
        let (key_header, key_body) = WireHeader::parse(&key).unwrap();
        assert_eq!(Some(key_header.schema_id), registry.registered_id("orders-key"));
        assert_eq!(key_body, b"\x0eorder-1");

        let (value_header, value_body) = WireHeader::parse(&received.payload).unwrap();
        assert_eq!(Some(value_header.schema_id), registry.registered_id("orders-value"));
        assert_eq!(value_body, &[84]);
    }

    #[tokio::test]
    async fn topics_resolve_their_own_subjects() {
        let registry = MockRegistry::default();
        let (producer, mut rx) = producer_with_receiver(&registry);

        for topic in ["orders", "refunds", "orders"] {
            producer
                .produce::<str, _>(topic, None, &1i64, ())
                .await
                .unwrap();
            assert!(rx.recv().await.unwrap().key.is_none());
        }

        assert_eq!(registry.register_calls("orders-value"), 1);
        assert_eq!(registry.register_calls("refunds-value"), 1);
        assert_eq!(registry.register_calls("orders-key"), 0);
    }

    #[tokio::test]
    async fn preload_resolves_key_and_value() {
        let registry = MockRegistry::default();
        let (producer, mut rx) = producer_with_receiver(&registry);

        producer.preload("orders").await.unwrap();
        producer
            .produce("orders", Some("order-1"), &7i64, ())
            .await
            .unwrap();
        rx.recv().await.unwrap();

        assert_eq!(registry.register_calls("orders-key"), 1);
        assert_eq!(registry.register_calls("orders-value"), 1);
    }

    #[tokio::test]
    async fn key_without_serializer_is_rejected() {
        let registry = MockRegistry::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let producer = AvroProducer::new(TestProducer { sender: tx }, serializer(&registry, "long"));

        let err = producer
            .produce("orders", Some("order-1"), &1i64, ())
            .await
            .unwrap_err();

        assert!(matches!(err, ProducerError::MissingKeySerializer));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn encode_failure_sends_nothing() {
        let registry = MockRegistry::default();
        let (producer, mut rx) = producer_with_receiver(&registry);

        let err = producer
            .produce::<str, _>("orders", None, "not a long", ())
            .await
            .unwrap_err();

        assert!(matches!(err, ProducerError::EncodeError(_)));
        assert!(rx.try_recv().is_err());
    }
}
