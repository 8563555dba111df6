//! Error types for the context registry client.

use thiserror::Error;

/// Process exit code for generic failures.
pub const EXIT_FAILURE: i32 = 1;

/// Process exit code for not-found outcomes.
pub const EXIT_NOT_FOUND: i32 = 3;

/// Client errors surfaced at the command boundary
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to connect to MCP server at {server}: {cause}")]
    ConnectionFailure { server: String, cause: String },

    #[error("Context {id} not found")]
    NotFound { id: String },

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("{env_var} not set (provider '{provider}' has no API key)")]
    MissingCredential { provider: String, env_var: String },

    #[error("Unknown provider: {name} (supported: {known})")]
    UnknownProvider { name: String, known: String },

    #[error("Provider '{provider}' call failed: {cause}")]
    ProviderFailed { provider: String, cause: String },

    #[error("Failed on input {index}: {cause}")]
    ItemFailed {
        index: usize,
        #[source]
        cause: Box<ClientError>,
    },

    #[error("Invalid context: {0}")]
    InvalidContext(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn provider(provider: &str, cause: impl std::fmt::Display) -> Self {
        ClientError::ProviderFailed {
            provider: provider.to_string(),
            cause: cause.to_string(),
        }
    }

    /// True for resource-level 404 outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_not_found() {
            EXIT_NOT_FOUND
        } else {
            EXIT_FAILURE
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ClientError {
    fn from(err: serde_yaml::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}
