use std::{fmt, str::FromStr};

use serde_avro_fast::schema::ParseSchemaError;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("empty schema")]
    Empty,

    #[error("schema is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema is missing `{0}`")]
    MissingAttribute(&'static str),

    #[error("parse schema error: {0}")]
    ParseSchema(#[from] ParseSchemaError),
}

/// An Avro schema resolved once, with the name subject strategies see and
/// the text the registry receives.
pub struct Schema {
    name: String,
    canonical: String,
    parsed: serde_avro_fast::Schema,
}

impl Schema {
    /// Parses schema text.
    ///
    /// Bare primitive declarations such as `int` (or the JSON string `"int"`)
    /// are normalized to `{"type":"int"}` before anything else sees them.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let text = text.trim();

        let document = match text.chars().next() {
            None => return Err(SchemaError::Empty),
            Some('{') | Some('[') => serde_json::from_str::<Value>(text)?,
            Some('"') => match serde_json::from_str::<Value>(text)? {
                Value::String(primitive) => primitive_document(&primitive),
                other => other,
            },
            Some(_) => primitive_document(text),
        };

        let name = schema_name(&document)?;
        let canonical = serde_json::to_string(&document)?;
        let parsed = serde_avro_fast::Schema::from_str(&canonical)?;

        Ok(Self {
            name,
            canonical,
            parsed,
        })
    }

    /// Fully-qualified name for named types, the type name otherwise.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn canonical_string(&self) -> &str {
        &self.canonical
    }

    pub(crate) fn avro(&self) -> &serde_avro_fast::Schema {
        &self.parsed
    }
}

impl FromStr for Schema {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("canonical", &self.canonical)
            .finish()
    }
}

fn primitive_document(primitive: &str) -> Value {
    serde_json::json!({ "type": primitive })
}

fn schema_name(document: &Value) -> Result<String, SchemaError> {
    match document {
        Value::String(name) => Ok(name.clone()),
        Value::Array(_) => Ok("union".to_owned()),
        Value::Object(attributes) => {
            let kind = attributes
                .get("type")
                .ok_or(SchemaError::MissingAttribute("type"))?;

            match kind.as_str() {
                Some("record") | Some("enum") | Some("fixed") => {
                    let name = attributes
                        .get("name")
                        .and_then(Value::as_str)
                        .ok_or(SchemaError::MissingAttribute("name"))?;

                    let namespace = attributes
                        .get("namespace")
                        .and_then(Value::as_str)
                        .filter(|ns| !ns.is_empty());

                    match namespace {
                        Some(ns) if !name.contains('.') => Ok(format!("{ns}.{name}")),
                        _ => Ok(name.to_owned()),
                    }
                }
                Some(other) => Ok(other.to_owned()),
                // `{"type": {...}}` wraps another schema
                None => schema_name(kind),
            }
        }
        _ => Err(SchemaError::MissingAttribute("type")),
    }
}
