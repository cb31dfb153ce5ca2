mod producer;

pub use producer::{KafkaProducer, KafkaProducerOptions};
