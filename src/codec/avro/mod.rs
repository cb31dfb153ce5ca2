use std::error::Error;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_avro_fast::ser::SerializerConfig;

mod cache;
mod config;
#[cfg(feature = "http")]
mod registry;
mod schema;

pub use cache::{CacheEntry, SchemaIdCache};
pub use config::{
    AvroSerializerConfig, ConfigError, AUTO_REGISTER_SCHEMAS, NORMALIZE_SCHEMAS,
    SUBJECT_NAME_STRATEGY, USE_LATEST_VERSION,
};
#[cfg(feature = "http")]
pub use registry::{BasicAuth, HttpRegistryError, HttpSchemaRegistry, RegistryConfig};
pub use schema::{Schema, SchemaError};

use super::wire;
use crate::{serialization::SerializationContext, subject::SubjectNameStrategy};

/// A schema version as stored by the registry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct RegisteredSchema {
    pub id: i32,
    pub subject: String,
    pub version: i32,
    pub schema: String,
}

/// Registry endpoints the serializer depends on.
///
/// Transport concerns (retries, auth, timeouts) belong to implementors.
#[async_trait]
pub trait SchemaRegistry: Debug + Send + Sync + 'static {
    type Error: Error + Send + Sync + 'static;

    /// Registers `schema` under `subject`, returning the existing id when the
    /// same schema is already registered there.
    async fn register_schema(
        &self,
        subject: &str,
        schema: &Schema,
        normalize: bool,
    ) -> Result<i32, Self::Error>;

    /// Returns the id of `schema` under `subject`. Fails when it is not
    /// registered, unless `register_missing` is set.
    async fn lookup_schema(
        &self,
        subject: &str,
        schema: &Schema,
        register_missing: bool,
    ) -> Result<i32, Self::Error>;

    async fn latest_version(&self, subject: &str) -> Result<RegisteredSchema, Self::Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum AvroSerializerError {
    #[error("no schema bound to serializer")]
    MissingSchema,

    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("registry error: {0}")]
    Registry(Box<dyn Error + Send + Sync + 'static>),

    #[error("avro serializing error: {0}")]
    AvroSerializing(#[from] serde_avro_fast::ser::SerError),

    #[error("subject `{subject}` is already bound to a different schema")]
    SubjectConflict { subject: String },

    #[error("latest schema of subject `{subject}` is invalid: {source}")]
    InvalidLatestSchema {
        subject: String,
        source: SchemaError,
    },
}

/// Encodes values into the registry wire format.
///
/// Every subject is resolved against the registry at most once per serializer
/// (and its clones); afterwards encoding is network free.
#[derive(Debug)]
pub struct AvroSerializer<R: SchemaRegistry> {
    registry: Arc<R>,
    schema: Option<Arc<Schema>>,
    config: Arc<AvroSerializerConfig>,
    cache: Arc<SchemaIdCache>,
}

impl<R> Clone for AvroSerializer<R>
where
    R: SchemaRegistry,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            schema: self.schema.clone(),
            config: Arc::clone(&self.config),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<R> AvroSerializer<R>
where
    R: SchemaRegistry,
{
    /// Creates a serializer. Without a bound `schema` values must be encoded
    /// with [`Self::encode_with_schema`].
    pub fn new(
        registry: R,
        schema: Option<Schema>,
        config: AvroSerializerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            registry: Arc::new(registry),
            schema: schema.map(Arc::new),
            config: Arc::new(config),
            cache: Arc::new(SchemaIdCache::new()),
        })
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.schema.as_deref().map(Schema::name)
    }

    pub fn subject_name_strategy(&self) -> &SubjectNameStrategy {
        &self.config.subject_name_strategy
    }

    pub fn auto_register_schemas(&self) -> bool {
        self.config.auto_register_schemas
    }

    pub fn use_latest_version(&self) -> bool {
        self.config.use_latest_version
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Subject the bound schema resolves to for `ctx`.
    pub fn subject_name(&self, ctx: &SerializationContext) -> Result<String, AvroSerializerError> {
        let schema = self.bound_schema()?;
        Ok(self.config.subject_name_strategy.subject_name(ctx, schema.name()))
    }

    /// Resolves the schema id for `ctx` ahead of the first [`Self::encode`],
    /// so that call does not wait on the registry.
    pub async fn load_registry_schema_id(
        &self,
        ctx: &SerializationContext,
    ) -> Result<i32, AvroSerializerError> {
        let schema = Arc::clone(self.bound_schema()?);
        let entry = self.resolve(&schema, ctx).await?;
        Ok(entry.schema_id)
    }

    /// Encodes `value` with the bound schema.
    pub async fn encode<S>(
        &self,
        value: &S,
        ctx: &SerializationContext,
    ) -> Result<Vec<u8>, AvroSerializerError>
    where
        S: Serialize + ?Sized,
    {
        let schema = Arc::clone(self.bound_schema()?);
        self.encode_inner(value, schema, ctx).await
    }

    /// Encodes `value` with a schema supplied for this call only.
    pub async fn encode_with_schema<S>(
        &self,
        value: &S,
        schema: Arc<Schema>,
        ctx: &SerializationContext,
    ) -> Result<Vec<u8>, AvroSerializerError>
    where
        S: Serialize + ?Sized,
    {
        self.encode_inner(value, schema, ctx).await
    }

    async fn encode_inner<S>(
        &self,
        value: &S,
        schema: Arc<Schema>,
        ctx: &SerializationContext,
    ) -> Result<Vec<u8>, AvroSerializerError>
    where
        S: Serialize + ?Sized,
    {
        let entry = self.resolve(&schema, ctx).await?;

        let mut body = vec![];
        let mut serializer_config = SerializerConfig::new(entry.schema.avro());
        serde_avro_fast::to_datum(&value, &mut body, &mut serializer_config)?;

        Ok(wire::encode_frame(entry.schema_id, &body))
    }

    fn bound_schema(&self) -> Result<&Arc<Schema>, AvroSerializerError> {
        self.schema.as_ref().ok_or(AvroSerializerError::MissingSchema)
    }

    async fn resolve(
        &self,
        schema: &Arc<Schema>,
        ctx: &SerializationContext,
    ) -> Result<CacheEntry, AvroSerializerError> {
        let subject = self
            .config
            .subject_name_strategy
            .subject_name(ctx, schema.name());

        let entry = self
            .cache
            .get_or_resolve(&subject, || self.fetch(&subject, schema))
            .await?;

        if !self.config.use_latest_version
            && entry.schema.canonical_string() != schema.canonical_string()
        {
            tracing::warn!("subject {subject} already resolved for another schema");
            return Err(AvroSerializerError::SubjectConflict { subject });
        }

        Ok(entry)
    }

    async fn fetch(
        &self,
        subject: &str,
        schema: &Arc<Schema>,
    ) -> Result<CacheEntry, AvroSerializerError> {
        let registry_error = |e: R::Error| AvroSerializerError::Registry(Box::new(e));

        if self.config.use_latest_version {
            tracing::debug!("fetching latest schema for: {subject}");

            let latest = self
                .registry
                .latest_version(subject)
                .await
                .map_err(registry_error)?;

            let latest_schema = Schema::parse(&latest.schema).map_err(|source| {
                AvroSerializerError::InvalidLatestSchema {
                    subject: subject.to_owned(),
                    source,
                }
            })?;

            return Ok(CacheEntry {
                schema_id: latest.id,
                schema: Arc::new(latest_schema),
            });
        }

        let schema_id = if self.config.auto_register_schemas {
            tracing::debug!("registering schema for: {subject}");

            self.registry
                .register_schema(subject, schema, self.config.normalize_schemas)
                .await
                .map_err(registry_error)?
        } else {
            tracing::debug!("looking up schema for: {subject}");

            self.registry
                .lookup_schema(subject, schema, false)
                .await
                .map_err(registry_error)?
        };

        tracing::debug!("resolved {subject} to schema id: {schema_id}");

        Ok(CacheEntry {
            schema_id,
            schema: Arc::clone(schema),
        })
    }
}
