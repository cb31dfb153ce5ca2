use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    RequestBuilder, Response, StatusCode, Url,
};
use serde::{Deserialize, Serialize};

use super::{RegisteredSchema, Schema, SchemaRegistry};

const REGISTRY_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Connection settings for [`HttpSchemaRegistry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub basic_auth: Option<BasicAuth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

fn default_timeout_secs() -> u64 {
    30
}

impl RegistryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout_secs(),
            basic_auth: None,
        }
    }

    pub fn basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            basic_auth: Some(BasicAuth {
                username: username.into(),
                password: password.into(),
            }),
            ..self
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum HttpRegistryError {
    #[error("invalid registry url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("schema not found under subject {subject}")]
    SchemaNotFound { subject: String },

    #[error("registry responded {status}: {message}")]
    Api {
        status: u16,
        error_code: Option<i32>,
        message: String,
    },
}

#[derive(Debug, Serialize)]
struct SchemaRequest<'a> {
    schema: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    id: i32,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    error_code: Option<i32>,
    message: Option<String>,
}

/// Registry client speaking the REST API of Confluent compatible registries.
#[derive(Debug)]
pub struct HttpSchemaRegistry {
    config: RegistryConfig,
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpSchemaRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self, HttpRegistryError> {
        let base_url = Url::parse(&config.url).map_err(|err| HttpRegistryError::InvalidUrl {
            url: config.url.clone(),
            reason: err.to_string(),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(HttpRegistryError::InvalidUrl {
                url: config.url,
                reason: "not a base url".to_owned(),
            });
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            base_url,
            http_client,
        })
    }

    /// `{base}/subjects/{subject}/{tail..}` with every segment percent-encoded,
    /// so a subject can never add segments or a query to the path.
    fn subject_url(&self, subject: &str, tail: &[&str]) -> Result<Url, HttpRegistryError> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|()| HttpRegistryError::InvalidUrl {
                url: self.config.url.clone(),
                reason: "not a base url".to_owned(),
            })?
            .pop_if_empty()
            .extend(["subjects", subject])
            .extend(tail);

        Ok(url)
    }

    fn post(&self, url: Url, schema: &Schema) -> RequestBuilder {
        let request = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, REGISTRY_CONTENT_TYPE)
            .json(&SchemaRequest {
                schema: schema.canonical_string(),
            });

        self.authorize(request)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, REGISTRY_CONTENT_TYPE);

        match &self.config.basic_auth {
            Some(auth) => request.basic_auth(&auth.username, Some(&auth.password)),
            None => request,
        }
    }

    async fn check_response(
        response: Response,
        subject: &str,
    ) -> Result<Response, HttpRegistryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(HttpRegistryError::SchemaNotFound {
                subject: subject.to_owned(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let error: ErrorResponse = serde_json::from_str(&body).unwrap_or_default();

        tracing::error!("schema registry responded {status}: {body}");

        Err(HttpRegistryError::Api {
            status: status.as_u16(),
            error_code: error.error_code,
            message: error.message.unwrap_or(body),
        })
    }
}

#[async_trait]
impl SchemaRegistry for HttpSchemaRegistry {
    type Error = HttpRegistryError;

    async fn register_schema(
        &self,
        subject: &str,
        schema: &Schema,
        normalize: bool,
    ) -> Result<i32, Self::Error> {
        let url = self.subject_url(subject, &["versions"])?;

        tracing::debug!("registering schema under subject: {subject}");

        let mut request = self.post(url, schema);
        if normalize {
            request = request.query(&[("normalize", "true")]);
        }

        let response = request.send().await?;
        let response = Self::check_response(response, subject).await?;
        let registered: RegisterResponse = response.json().await?;

        tracing::debug!("schema registered under {subject} with id: {}", registered.id);

        Ok(registered.id)
    }

    async fn lookup_schema(
        &self,
        subject: &str,
        schema: &Schema,
        register_missing: bool,
    ) -> Result<i32, Self::Error> {
        let url = self.subject_url(subject, &[])?;

        tracing::debug!("looking up schema under subject: {subject}");

        let response = self.post(url, schema).send().await?;

        match Self::check_response(response, subject).await {
            Ok(response) => {
                let registered: RegisteredSchema = response.json().await?;
                Ok(registered.id)
            }
            Err(HttpRegistryError::SchemaNotFound { .. }) if register_missing => {
                self.register_schema(subject, schema, false).await
            }
            Err(err) => Err(err),
        }
    }

    async fn latest_version(&self, subject: &str) -> Result<RegisteredSchema, Self::Error> {
        let url = self.subject_url(subject, &["versions", "latest"])?;

        tracing::debug!("fetching latest schema for: {subject}");

        let response = self.authorize(self.http_client.get(url)).send().await?;
        let response = Self::check_response(response, subject).await?;

        Ok(response.json().await?)
    }
}
