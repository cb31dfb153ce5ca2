use std::{fmt::Display, time::Duration};

use ahash::HashMap;
use async_trait::async_trait;
use rdkafka::{
    client::DefaultClientContext,
    message::OwnedHeaders,
    producer::{FutureProducer, FutureRecord},
    ClientContext,
};

use crate::producer::Producer;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default)]
pub struct KafkaProducerOptions {
    partition: Option<i32>,
    headers: HashMap<String, String>,
}

impl KafkaProducerOptions {
    pub fn partition(self, partition: i32) -> Self {
        Self {
            partition: Some(partition),
            ..self
        }
    }

    pub fn add_header(mut self, key: impl Display, value: impl Display) -> Self {
        let key = key.to_string();
        let value = value.to_string();

        self.headers.insert(key, value);

        self
    }
}

/// [`Producer`] sending framed records through rdkafka.
#[derive(Clone)]
pub struct KafkaProducer<C = DefaultClientContext>
where
    C: ClientContext + 'static,
{
    producer: FutureProducer<C>,
}

impl<C: ClientContext + 'static> KafkaProducer<C> {
    pub fn new(producer: FutureProducer<C>) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl<C: ClientContext + 'static> Producer for KafkaProducer<C> {
    type Options = KafkaProducerOptions;

    type Error = rdkafka::error::KafkaError;

    async fn send(
        &self,
        topic: &str,
        key: Option<Vec<u8>>,
        payload: Vec<u8>,
        options: Self::Options,
    ) -> Result<(), Self::Error> {
        let KafkaProducerOptions { partition, headers } = options;

        let headers_len = headers.len();
        let headers = headers.into_iter().fold(
            OwnedHeaders::new_with_capacity(headers_len),
            |headers, (key, value)| {
                headers.insert(rdkafka::message::Header {
                    key: &key,
                    value: Some(&value),
                })
            },
        );

        let mut record: FutureRecord<'_, [u8], [u8]> = FutureRecord::to(topic)
            .headers(headers)
            .payload(payload.as_slice());

        if let Some(key) = key.as_deref() {
            record = record.key(key);
        }

        if let Some(partition) = partition {
            record = record.partition(partition);
        }

        self.producer
            .send(record, DELIVERY_TIMEOUT)
            .await
            .map(|_| ())
            .map_err(|err| err.0)
    }

    fn make_span(&self, topic: &str, payload: &[u8], options: &Self::Options) -> tracing::Span {
        // https://opentelemetry.io/docs/specs/otel/trace/semantic_conventions/messaging/#apache-kafka
        tracing::info_span!(
            "producer",
            otel.name = %format!("{} send", topic).as_str(),
            otel.kind = "PRODUCER",
            otel.status_code = tracing::field::Empty,
            messaging.system = "kafka",
            messaging.destination = %topic,
            messaging.destination_kind = "topic",
            messaging.message.payload_size_bytes = payload.len(),
            messaging.kafka.destination.partition = options.partition,
        )
    }
}
