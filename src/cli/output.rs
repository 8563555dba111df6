//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::config::SERVER_ENV_VAR;
use crate::error::ClientError;

/// Map domain errors to a string for CLI output.
///
/// Connection failures carry remediation hints: the URL tried, how to start the
/// server, and how to point the client elsewhere.
pub fn map_error(e: &ClientError) -> String {
    match e {
        ClientError::ConnectionFailure { server, cause } => format!(
            "Error: Could not connect to MCP server at {server}\n\
             Cause: {cause}\n\n\
             Make sure the server is running, for example:\n  \
             cockroachdb-mcp-server serve --init-schema\n\n\
             Or point the client at another server:\n  \
             mcp-client --server <url> ...\n  \
             export {env}=<url>",
            server = server,
            cause = cause,
            env = SERVER_ENV_VAR,
        ),
        ClientError::MissingCredential { env_var, .. } => {
            format!("Error: {}\nSet it with: export {}=<key>", e, env_var)
        }
        other => format!("Error: {}", other),
    }
}
