pub mod avro;
pub mod wire;

pub use avro::{AvroSerializer, AvroSerializerError, SchemaRegistry};
pub use wire::{encode_frame, WireError, WireHeader, MAGIC_BYTE};
