//! Service configuration.
//!
//! Defaults cover local development; deployments override through the
//! environment. Credentials only ever come from the environment, never
//! from disk.

use serde::{Deserialize, Serialize};
use std::env;

/// Directory (business listings) client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.yelp.com/v3/businesses".to_string(),
            api_key: None,
            timeout_secs: 5,
        }
    }
}

/// LLM search agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// No timeout when unset; the pipeline imposes no deadline of its own.
    pub timeout_secs: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4.1".to_string(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub directory: DirectoryConfig,
    pub agent: AgentConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            directory: DirectoryConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Build the config from defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = env::var("SAVOR_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(url) = env::var("DIRECTORY_BASE_URL") {
            config.directory.base_url = url;
        }
        if let Ok(key) = env::var("DIRECTORY_API_KEY") {
            config.directory.api_key = Some(key);
        }
        if let Ok(endpoint) = env::var("LLM_ENDPOINT") {
            config.agent.endpoint = endpoint;
        }
        if let Ok(model) = env::var("LLM_MODEL") {
            config.agent.model = model;
        }
        if let Ok(key) = env::var("LLM_API_KEY") {
            config.agent.api_key = Some(key);
        }

        config
    }
}
