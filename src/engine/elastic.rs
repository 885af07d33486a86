//! Elasticsearch-backed engine.
//!
//! Thin adapter from [`SearchEngine`] onto the official client. Transport
//! errors, non-success statuses and unparsable bodies are mapped onto
//! [`EngineError`]; retry and timeout policy live one layer up in
//! `EngineConnection`.

use super::types::{EngineError, IndexSchema, SearchEngine};

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{IndicesCreateParts, IndicesExistsParts};
use elasticsearch::params::Refresh;
use elasticsearch::{CountParts, CreateParts, Elasticsearch, GetParts, SearchParts};
use serde_json::{Value, json};
use std::time::Duration;

/// Basic-auth credentials for the engine.
#[derive(Clone)]
pub struct ElasticCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ElasticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ElasticConfig {
    /// Engine base URL, e.g. `http://elasticsearch:9200`.
    pub url: String,
    pub credentials: Option<ElasticCredentials>,
    /// Disable to accept self-signed certificates in development.
    pub verify_certs: bool,
    /// Transport-level request timeout.
    pub timeout: Duration,
}

pub struct ElasticEngine {
    client: Elasticsearch,
}

impl ElasticEngine {
    /// Builds the client. Does not touch the network; use
    /// `EngineConnection::connect` to wait for the engine to come up.
    pub fn new(config: &ElasticConfig) -> Result<Self, EngineError> {
        let url: elasticsearch::http::Url = config
            .url
            .parse()
            .map_err(|e| EngineError::Config(format!("invalid engine URL '{}': {}", config.url, e)))?;

        let pool = SingleNodeConnectionPool::new(url);
        let mut builder = TransportBuilder::new(pool).timeout(config.timeout);

        if !config.verify_certs {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(credentials) = &config.credentials {
            builder = builder.auth(Credentials::Basic(
                credentials.username.clone(),
                credentials.password.clone(),
            ));
        }

        let transport = builder
            .build()
            .map_err(|e| EngineError::Config(format!("failed to build transport: {}", e)))?;

        Ok(Self {
            client: Elasticsearch::new(transport),
        })
    }
}

#[async_trait]
impl SearchEngine for ElasticEngine {
    async fn ping(&self) -> Result<(), EngineError> {
        let response = self.client.ping().send().await.map_err(transport)?;
        ensure_success(response).await.map(|_| ())
    }

    async fn index_exists(&self, index: &str) -> Result<bool, EngineError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(transport)?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => ensure_success(response).await.map(|_| false),
        }
    }

    async fn create_index(&self, index: &str, schema: &IndexSchema) -> Result<(), EngineError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(json!({ "mappings": schema.to_mappings() }))
            .send()
            .await
            .map_err(transport)?;

        match ensure_success(response).await {
            Ok(_) => Ok(()),
            // Someone else created it between our check and our create.
            Err(EngineError::Status { body, .. })
                if body.contains("resource_already_exists_exception") =>
            {
                tracing::debug!("Index {} already exists", index);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn count(&self, index: &str) -> Result<u64, EngineError> {
        let response = self
            .client
            .count(CountParts::Index(&[index]))
            .send()
            .await
            .map_err(transport)?;

        let body = read_json(response).await?;
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| EngineError::InvalidResponse(format!("count missing in {}", body)))
    }

    async fn create_document(
        &self,
        index: &str,
        id: &str,
        source: Value,
    ) -> Result<(), EngineError> {
        let response = self
            .client
            .create(CreateParts::IndexId(index, id))
            .refresh(Refresh::WaitFor)
            .body(source)
            .send()
            .await
            .map_err(transport)?;

        if response.status_code().as_u16() == 409 {
            return Err(EngineError::Conflict { id: id.to_string() });
        }
        ensure_success(response).await.map(|_| ())
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, EngineError> {
        let response = self
            .client
            .get(GetParts::IndexId(index, id))
            .send()
            .await
            .map_err(transport)?;

        if response.status_code().as_u16() == 404 {
            return Ok(None);
        }

        let body = read_json(response).await?;
        Ok(body.get("_source").cloned())
    }

    async fn search(&self, index: &str, body: Value) -> Result<Vec<Value>, EngineError> {
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body)
            .send()
            .await
            .map_err(transport)?;

        let body = read_json(response).await?;
        let hits = body
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .ok_or_else(|| EngineError::InvalidResponse(format!("hits missing in {}", body)))?;

        Ok(hits
            .iter()
            .filter_map(|hit| hit.get("_source").cloned())
            .collect())
    }
}

fn transport(e: elasticsearch::Error) -> EngineError {
    EngineError::Transport(e.to_string())
}

async fn ensure_success(response: Response) -> Result<Response, EngineError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(EngineError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn read_json(response: Response) -> Result<Value, EngineError> {
    ensure_success(response)
        .await?
        .json::<Value>()
        .await
        .map_err(|e| EngineError::InvalidResponse(e.to_string()))
}
