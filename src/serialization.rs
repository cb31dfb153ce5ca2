use std::fmt::{self, Display};

/// Part of a record a payload is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageField {
    Key,
    Value,
}

impl MessageField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageField::Key => "key",
            MessageField::Value => "value",
        }
    }
}

impl Display for MessageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a payload is headed: the topic and whether it is the record key or value.
///
/// Built per call by the producer pipeline and only borrowed by serializers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerializationContext {
    topic: String,
    field: MessageField,
}

impl SerializationContext {
    pub fn new(topic: impl Into<String>, field: MessageField) -> Self {
        Self {
            topic: topic.into(),
            field,
        }
    }

    pub fn key(topic: impl Into<String>) -> Self {
        Self::new(topic, MessageField::Key)
    }

    pub fn value(topic: impl Into<String>) -> Self {
        Self::new(topic, MessageField::Value)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn field(&self) -> MessageField {
        self.field
    }
}
