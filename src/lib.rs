//! mcp-client: Model Context Registry Client
//!
//! Client for a remote registry of model contexts (named, versioned prompt and
//! model configurations) and a harness that runs those contexts against LLM
//! providers, once or over a batch of inputs.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod invocation;
pub mod logging;
pub mod provider;
pub mod registry;
pub mod retry;
