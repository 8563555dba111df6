//! Context Registry Client
//!
//! HTTP operations against the registry's `contexts` resource. Every call goes
//! through [`RegistryClient::send`], which applies the fixed transport retry policy
//! and turns exhausted transport failures into a single `ConnectionFailure`.
//! HTTP error statuses are never retried; each operation maps them itself.

use crate::config::ConnectionConfig;
use crate::context::Context;
use crate::error::ClientError;
use crate::retry::RetryPolicy;
use reqwest::{Client, Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

pub mod export;

pub use export::{export_file_name, ExportFailure, ExportReport};

const REGISTRY_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REGISTRY_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Summary entry returned by the list operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextReference {
    pub id: String,
    #[serde(default)]
    pub context_name: String,
}

/// Body of `GET /contexts`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextList {
    #[serde(default)]
    pub contexts: Vec<ContextReference>,
}

impl ContextList {
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

/// Status and raw body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_str(&self.body).map_err(|e| {
            ClientError::Serialization(format!("Failed to parse registry response: {}", e))
        })
    }

    fn into_request_failure(self) -> ClientError {
        ClientError::RequestFailed {
            status: self.status,
            body: self.body,
        }
    }
}

fn build_registry_http_client() -> Result<Client, ClientError> {
    Client::builder()
        .connect_timeout(REGISTRY_HTTP_CONNECT_TIMEOUT)
        .timeout(REGISTRY_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Client for the registry's `contexts` resource
pub struct RegistryClient {
    http: Client,
    connection: ConnectionConfig,
    retry: RetryPolicy,
}

impl RegistryClient {
    pub fn new(connection: ConnectionConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http: build_registry_http_client()?,
            connection,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    pub fn server(&self) -> &str {
        &self.connection.server
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        let raw = format!(
            "{}/{}",
            self.connection.server.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| {
            ClientError::Config(format!(
                "Invalid MCP server URL '{}': {}",
                self.connection.server, e
            ))
        })
    }

    /// Perform one HTTP call with transport retry.
    ///
    /// Any HTTP status, including 4xx/5xx, is returned as `Ok`.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpResponse, ClientError> {
        let url = self.url(path)?;
        let bearer = self.connection.bearer();

        self.retry
            .run(|attempt| {
                let mut request = self.http.request(method.clone(), url.clone());
                if let Some(bearer) = &bearer {
                    request = request.header("Authorization", bearer);
                }
                if let Some(body) = body {
                    request = request.json(body);
                }
                let method = method.clone();
                let url = url.clone();
                async move {
                    debug!(attempt, %method, %url, "Sending registry request");
                    let response = request.send().await?;
                    let status = response.status().as_u16();
                    let body = response.text().await?;
                    debug!(status, %url, "Registry responded");
                    Ok::<_, reqwest::Error>(HttpResponse { status, body })
                }
            })
            .await
            .map_err(|e| ClientError::ConnectionFailure {
                server: self.connection.server.clone(),
                cause: e.to_string(),
            })
    }

    /// Create a context; returns the server-assigned context name.
    pub async fn create(&self, context: &Context) -> Result<String, ClientError> {
        let body = serde_json::to_value(context)?;
        let response = self.send(Method::POST, "contexts", Some(&body)).await?;
        if !response.is_success() {
            return Err(response.into_request_failure());
        }

        let created: Value = response.json()?;
        let name = created
            .get("context_name")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        info!(context_name = %name, "Context created");
        Ok(name)
    }

    /// Fetch one context by id.
    pub async fn get(&self, id: &str) -> Result<Context, ClientError> {
        let response = self
            .send(Method::GET, &format!("contexts/{}", id), None)
            .await?;
        if response.is_not_found() {
            return Err(ClientError::NotFound { id: id.to_string() });
        }
        if !response.is_success() {
            return Err(response.into_request_failure());
        }
        Context::from_value(response.json()?)
    }

    /// List all context references. An empty list is a valid result.
    pub async fn list(&self) -> Result<ContextList, ClientError> {
        let response = self.send(Method::GET, "contexts", None).await?;
        if !response.is_success() {
            return Err(response.into_request_failure());
        }
        response.json()
    }

    /// Delete one context by id. Confirmation is the caller's concern.
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .send(Method::DELETE, &format!("contexts/{}", id), None)
            .await?;
        if response.is_not_found() {
            return Err(ClientError::NotFound { id: id.to_string() });
        }
        if !response.is_success() {
            return Err(response.into_request_failure());
        }
        info!(context_id = %id, "Context deleted");
        Ok(())
    }
}
