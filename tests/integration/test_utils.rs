//! Shared test utilities for integration tests
//!
//! Resolvers here never read the process environment or the user's config file,
//! so tests stay isolated without serializing on environment variables.

use mcp_client::config::{ConfigResolver, ConnectionConfig};
use mcp_client::registry::RegistryClient;
use mcp_client::retry::RetryPolicy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Resolver over an explicit environment map and a config file that does not exist.
pub fn isolated_resolver(env: &[(&str, &str)]) -> ConfigResolver {
    ConfigResolver::with_config_path("/nonexistent/mcp-client/config.yaml").with_env(env_map(env))
}

/// Resolver over an explicit environment map and the given config file.
pub fn resolver_with_file(path: &Path, env: &[(&str, &str)]) -> ConfigResolver {
    ConfigResolver::with_config_path(path).with_env(env_map(env))
}

fn env_map(env: &[(&str, &str)]) -> HashMap<String, String> {
    env.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Three attempts without waiting between them.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::ZERO)
}

pub fn registry_client(server: &str, token: Option<&str>) -> RegistryClient {
    RegistryClient::new(ConnectionConfig::new(server, token.map(str::to_string)))
        .unwrap()
        .with_retry_policy(fast_retry())
}

/// URL of a local port with nothing listening on it.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

pub const SAMPLE_CONTEXT_YAML: &str = "\
context_name: summarizer
context_version: 1.0.0
body:
  model: gpt-4
  description: Summarize the user's text in one sentence.
";
