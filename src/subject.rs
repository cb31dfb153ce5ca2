//! Subject naming policies.
//!
//! A subject is the registry namespace a schema is registered under. The
//! strategy decides it from the serialization context and the schema's name.

use std::{fmt, str::FromStr, sync::Arc};

use crate::{codec::avro::ConfigError, serialization::SerializationContext};

type SubjectNameFn = dyn Fn(&SerializationContext, &str) -> String + Send + Sync + 'static;

#[derive(Clone, Default)]
pub enum SubjectNameStrategy {
    /// `{topic}-{field}`, e.g. `orders-value`.
    #[default]
    TopicName,
    /// The schema's fully-qualified name, topic and field are ignored.
    RecordName,
    /// `{topic}-{schema_name}`.
    TopicRecordName,
    Custom(Arc<SubjectNameFn>),
}

impl SubjectNameStrategy {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&SerializationContext, &str) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn subject_name(&self, ctx: &SerializationContext, schema_name: &str) -> String {
        match self {
            Self::TopicName => topic_name_strategy(ctx, schema_name),
            Self::RecordName => record_subject_name_strategy(ctx, schema_name),
            Self::TopicRecordName => topic_record_subject_name_strategy(ctx, schema_name),
            Self::Custom(f) => f(ctx, schema_name),
        }
    }
}

impl fmt::Debug for SubjectNameStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopicName => f.write_str("TopicName"),
            Self::RecordName => f.write_str("RecordName"),
            Self::TopicRecordName => f.write_str("TopicRecordName"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl FromStr for SubjectNameStrategy {
    type Err = ConfigError;

    /// Accepts function style (`topic_name_strategy`), class style
    /// (`TopicNameStrategy`) and fully-qualified class names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let short = s.rsplit('.').next().unwrap_or(s);
        let normalized: String = short
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "topicnamestrategy" | "topicname" => Ok(Self::TopicName),
            "recordnamestrategy" | "recordsubjectnamestrategy" | "recordname" => {
                Ok(Self::RecordName)
            }
            "topicrecordnamestrategy" | "topicrecordsubjectnamestrategy" | "topicrecordname" => {
                Ok(Self::TopicRecordName)
            }
            _ => Err(ConfigError::UnknownStrategy(s.to_owned())),
        }
    }
}

pub fn topic_name_strategy(ctx: &SerializationContext, _schema_name: &str) -> String {
    format!("{}-{}", ctx.topic(), ctx.field())
}

pub fn record_subject_name_strategy(_ctx: &SerializationContext, schema_name: &str) -> String {
    schema_name.to_owned()
}

pub fn topic_record_subject_name_strategy(ctx: &SerializationContext, schema_name: &str) -> String {
    format!("{}-{}", ctx.topic(), schema_name)
}
