use serde_json::{Map, Value};

use crate::subject::SubjectNameStrategy;

pub const AUTO_REGISTER_SCHEMAS: &str = "auto.register.schemas";
pub const USE_LATEST_VERSION: &str = "use.latest.version";
pub const NORMALIZE_SCHEMAS: &str = "normalize.schemas";
pub const SUBJECT_NAME_STRATEGY: &str = "subject.name.strategy";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be a boolean value")]
    NotBoolean(&'static str),

    #[error("subject.name.strategy must be callable, got {0}")]
    NotCallable(String),

    #[error("unknown subject.name.strategy `{0}`")]
    UnknownStrategy(String),

    #[error("cannot enable both use.latest.version and auto.register.schemas")]
    Conflict,

    #[error("unrecognized properties: {}", .0.join(", "))]
    Unrecognized(Vec<String>),
}

/// Serializer options.
///
/// Build it with the setters, or from a loosely-typed map with [`Self::from_map`]
/// when the options come from a config file.
#[derive(Debug, Clone)]
pub struct AvroSerializerConfig {
    pub(crate) auto_register_schemas: bool,
    pub(crate) use_latest_version: bool,
    pub(crate) normalize_schemas: bool,
    pub(crate) subject_name_strategy: SubjectNameStrategy,
}

impl Default for AvroSerializerConfig {
    fn default() -> Self {
        Self {
            auto_register_schemas: true,
            use_latest_version: false,
            normalize_schemas: false,
            subject_name_strategy: SubjectNameStrategy::default(),
        }
    }
}

impl AvroSerializerConfig {
    pub fn auto_register_schemas(self, auto_register_schemas: bool) -> Self {
        Self {
            auto_register_schemas,
            ..self
        }
    }

    pub fn use_latest_version(self, use_latest_version: bool) -> Self {
        Self {
            use_latest_version,
            ..self
        }
    }

    pub fn normalize_schemas(self, normalize_schemas: bool) -> Self {
        Self {
            normalize_schemas,
            ..self
        }
    }

    pub fn subject_name_strategy(self, subject_name_strategy: SubjectNameStrategy) -> Self {
        Self {
            subject_name_strategy,
            ..self
        }
    }

    /// Reads options from a JSON object. Missing keys keep their defaults.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ConfigError> {
        let unrecognized: Vec<String> = map
            .keys()
            .filter(|key| {
                ![
                    AUTO_REGISTER_SCHEMAS,
                    USE_LATEST_VERSION,
                    NORMALIZE_SCHEMAS,
                    SUBJECT_NAME_STRATEGY,
                ]
                .contains(&key.as_str())
            })
            .cloned()
            .collect();

        if !unrecognized.is_empty() {
            return Err(ConfigError::Unrecognized(unrecognized));
        }

        let mut config = Self::default();

        if let Some(value) = bool_option(map, AUTO_REGISTER_SCHEMAS)? {
            config.auto_register_schemas = value;
        }

        if let Some(value) = bool_option(map, USE_LATEST_VERSION)? {
            config.use_latest_version = value;
        }

        if let Some(value) = bool_option(map, NORMALIZE_SCHEMAS)? {
            config.normalize_schemas = value;
        }

        match map.get(SUBJECT_NAME_STRATEGY) {
            None => {}
            Some(Value::String(name)) => config.subject_name_strategy = name.parse()?,
            Some(other) => return Err(ConfigError::NotCallable(other.to_string())),
        }

        config.validate()?;

        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.use_latest_version && self.auto_register_schemas {
            return Err(ConfigError::Conflict);
        }

        Ok(())
    }
}

fn bool_option(map: &Map<String, Value>, key: &'static str) -> Result<Option<bool>, ConfigError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(_) => Err(ConfigError::NotBoolean(key)),
    }
}
