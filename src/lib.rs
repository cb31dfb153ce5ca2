pub mod codec;
pub mod integration;
pub mod producer;
pub mod serialization;
pub mod subject;

pub use codec::avro::{AvroSerializer, AvroSerializerConfig, Schema, SchemaRegistry};
pub use serialization::{MessageField, SerializationContext};
pub use subject::SubjectNameStrategy;
