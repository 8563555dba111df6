//! Configuration System
//!
//! Resolves effective connection parameters from a layered precedence:
//! explicit CLI value, then environment variable, then the per-user config file,
//! then a hardcoded default (server only). The config file is read fresh on every
//! resolution; nothing is cached between calls.

use crate::error::ClientError;
use crate::logging::LoggingConfig;
use config::Config;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

mod sources;

pub use sources::global_file::{global_config_path, CONFIG_DIR_NAME};

/// Registry URL used when no other source provides one.
pub const DEFAULT_SERVER: &str = "http://localhost:8081";

/// Environment variable overriding the registry URL.
pub const SERVER_ENV_VAR: &str = "MCP_SERVER_URL";

/// Environment variable supplying the registry bearer token.
pub const TOKEN_ENV_VAR: &str = "MCP_API_TOKEN";

/// Source of environment variables.
///
/// Production code reads the process environment; tests inject a map.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Per-provider section of the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSection {
    #[serde(default)]
    pub api_key: Option<String>,

    /// Alternate API endpoint (proxies, compatible gateways)
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Effective registry connection parameters for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub server: String,
    pub token: Option<String>,
}

impl ConnectionConfig {
    pub fn new(server: impl Into<String>, token: Option<String>) -> Self {
        Self {
            server: server.into(),
            token,
        }
    }

    /// `Authorization` header value, when a token is resolved.
    pub fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {}", token))
    }
}

/// Parsed config file, viewed as a mapping of string keys to values.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    values: Config,
}

impl FileConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a config file. Missing or unreadable files yield an empty mapping.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    config_path = %path.display(),
                    error = %e,
                    "Ignoring unreadable configuration file"
                );
                Self::empty()
            }
        }
    }

    /// Load a config file, surfacing parse errors.
    pub fn try_load(path: &Path) -> Result<Self, ClientError> {
        if !path.exists() {
            return Ok(Self::empty());
        }
        let values = sources::global_file::add_to_builder(Config::builder(), path)?.build()?;
        Ok(Self { values })
    }

    pub fn server(&self) -> Option<String> {
        self.string("server")
    }

    pub fn token(&self) -> Option<String> {
        self.string("token")
    }

    /// Section named after a provider, e.g. `openai: { api_key: ... }`.
    pub fn provider(&self, provider_name: &str) -> Option<ProviderSection> {
        self.values.get::<ProviderSection>(provider_name).ok()
    }

    pub fn logging(&self) -> Option<LoggingConfig> {
        self.values.get::<LoggingConfig>("logging").ok()
    }

    fn string(&self, key: &str) -> Option<String> {
        non_empty(self.values.get_string(key).ok())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Apply server precedence: explicit, environment, file, default.
///
/// The file lookup runs only when the higher layers are absent.
pub fn pick_server(
    explicit: Option<&str>,
    env: Option<String>,
    file: impl FnOnce() -> Option<String>,
) -> String {
    pick_token(explicit, env, file).unwrap_or_else(|| DEFAULT_SERVER.to_string())
}

/// Apply token precedence: explicit, environment, file. No default.
pub fn pick_token(
    explicit: Option<&str>,
    env: Option<String>,
    file: impl FnOnce() -> Option<String>,
) -> Option<String> {
    non_empty(explicit.map(str::to_string))
        .or_else(|| non_empty(env))
        .or_else(|| non_empty(file()))
}

/// Config resolver bound to a config file path and an environment source.
#[derive(Clone)]
pub struct ConfigResolver {
    config_path: Option<PathBuf>,
    env: Arc<dyn EnvSource>,
}

impl ConfigResolver {
    /// Resolver over the process environment and the global config file.
    pub fn new() -> Self {
        Self {
            config_path: global_config_path(),
            env: Arc::new(ProcessEnv),
        }
    }

    /// Resolver reading an explicit config file instead of the global one.
    pub fn with_config_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(config_path.into()),
            env: Arc::new(ProcessEnv),
        }
    }

    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn env_var(&self, key: &str) -> Option<String> {
        non_empty(self.env.var(key))
    }

    /// Read the config file. Called on every resolution.
    pub fn load_file(&self) -> FileConfig {
        match &self.config_path {
            Some(path) => FileConfig::load(path),
            None => FileConfig::empty(),
        }
    }

    pub fn resolve_server(&self, explicit: Option<&str>) -> String {
        pick_server(explicit, self.env_var(SERVER_ENV_VAR), || {
            self.load_file().server()
        })
    }

    pub fn resolve_token(&self, explicit: Option<&str>) -> Option<String> {
        pick_token(explicit, self.env_var(TOKEN_ENV_VAR), || {
            self.load_file().token()
        })
    }

    pub fn resolve_connection(
        &self,
        server: Option<&str>,
        token: Option<&str>,
    ) -> ConnectionConfig {
        ConnectionConfig::new(self.resolve_server(server), self.resolve_token(token))
    }

    /// Resolve a provider API key: environment variable, then the provider's
    /// config section. Absence is a `MissingCredential` error.
    pub fn resolve_api_key(&self, provider_name: &str, env_var: &str) -> Result<String, ClientError> {
        pick_token(None, self.env_var(env_var), || {
            self.load_file()
                .provider(provider_name)
                .and_then(|section| section.api_key)
        })
        .ok_or_else(|| ClientError::MissingCredential {
            provider: provider_name.to_string(),
            env_var: env_var.to_string(),
        })
    }

    pub fn provider_base_url(&self, provider_name: &str) -> Option<String> {
        non_empty(
            self.load_file()
                .provider(provider_name)
                .and_then(|section| section.base_url),
        )
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("config_path", &self.config_path)
            .finish_non_exhaustive()
    }
}
