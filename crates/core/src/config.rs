//! Configuration management for the Citegate gateway.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Environment variables
//! - An optional YAML config file
//! - Command-line flags (applied by the server binary)
//!
//! Environment variables win over the config file; CLI flags win over both.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Default number of evidence snippets shown to the model.
pub const DEFAULT_MAX_CTX_SNIPPETS: usize = 3;

/// Default cumulative character budget for evidence text.
pub const DEFAULT_MAX_CTX_CHARS: usize = 2400;

/// Main gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the retrieval service
    pub retriever_url: String,

    /// Base URL of the OpenAI-compatible generation backend
    pub generation_url: String,

    /// Model name sent with every completion request
    pub model_name: String,

    /// Maximum number of evidence snippets per request
    pub max_ctx_snippets: usize,

    /// Maximum cumulative evidence text length in characters
    pub max_ctx_chars: usize,

    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Port the HTTP server listens on
    pub port: u16,

    /// Log level override
    pub log_level: Option<String>,
}

/// Config file structure. Every section is optional; missing values keep
/// their defaults.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    upstream: Option<UpstreamConfig>,
    limits: Option<LimitsConfig>,
    server: Option<ServerConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct UpstreamConfig {
    retriever_url: Option<String>,
    generation_url: Option<String>,
    model_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct LimitsConfig {
    max_ctx_snippets: Option<usize>,
    max_ctx_chars: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerConfig {
    bind_addr: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            retriever_url: "http://localhost:8001".to_string(),
            generation_url: "http://localhost:8000".to_string(),
            model_name: "smollm2-135m".to_string(),
            max_ctx_snippets: DEFAULT_MAX_CTX_SNIPPETS,
            max_ctx_chars: DEFAULT_MAX_CTX_CHARS,
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            log_level: None,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from the config file (if any) and environment
    /// variables.
    ///
    /// Environment variables:
    /// - `RETRIEVER_URL`: Base URL of the retrieval service
    /// - `GENERATION_URL`: Base URL of the generation backend
    /// - `MODEL_NAME`: Model identifier for completion requests
    /// - `MAX_CTX_SNIPPETS`: Evidence snippet limit
    /// - `MAX_CTX_CHARS`: Evidence character budget
    /// - `BIND_ADDR` / `PORT`: HTTP server binding
    /// - `CITEGATE_CONFIG`: Path to a YAML config file
    /// - `RUST_LOG`: Log level
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        let config_path = std::env::var("CITEGATE_CONFIG").ok().map(PathBuf::from);
        if let Some(ref path) = config_path {
            config = config.merge_yaml(path)?;
        }

        if let Ok(url) = std::env::var("RETRIEVER_URL") {
            config.retriever_url = url;
        }
        if let Ok(url) = std::env::var("GENERATION_URL") {
            config.generation_url = url;
        }
        if let Ok(model) = std::env::var("MODEL_NAME") {
            config.model_name = model;
        }
        if let Ok(n) = std::env::var("MAX_CTX_SNIPPETS") {
            config.max_ctx_snippets = parse_env("MAX_CTX_SNIPPETS", &n)?;
        }
        if let Ok(n) = std::env::var("MAX_CTX_CHARS") {
            config.max_ctx_chars = parse_env("MAX_CTX_CHARS", &n)?;
        }
        if let Ok(addr) = std::env::var("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(port) = std::env::var("PORT") {
            config.port = parse_env("PORT", &port)?;
        }
        config.log_level = std::env::var("RUST_LOG").ok();

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(upstream) = config_file.upstream {
            if let Some(url) = upstream.retriever_url {
                result.retriever_url = url;
            }
            if let Some(url) = upstream.generation_url {
                result.generation_url = url;
            }
            if let Some(model) = upstream.model_name {
                result.model_name = model;
            }
        }

        if let Some(limits) = config_file.limits {
            if let Some(n) = limits.max_ctx_snippets {
                result.max_ctx_snippets = n;
            }
            if let Some(n) = limits.max_ctx_chars {
                result.max_ctx_chars = n;
            }
        }

        if let Some(server) = config_file.server {
            if let Some(addr) = server.bind_addr {
                result.bind_addr = addr;
            }
            if let Some(port) = server.port {
                result.port = port;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    pub fn with_overrides(
        mut self,
        bind_addr: Option<String>,
        port: Option<u16>,
        log_level: Option<String>,
    ) -> Self {
        if let Some(addr) = bind_addr {
            self.bind_addr = addr;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(level) = log_level {
            self.log_level = Some(level);
        }
        self
    }

    /// Validate the loaded configuration.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_ctx_snippets == 0 {
            return Err(AppError::Config(
                "max_ctx_snippets must be at least 1".to_string(),
            ));
        }
        for (name, url) in [
            ("retriever_url", &self.retriever_url),
            ("generation_url", &self.generation_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "{} must be an http(s) URL, got {:?}",
                    name, url
                )));
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> AppResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| AppError::Config(format!("Invalid {} {:?}: {}", name, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.max_ctx_snippets, 3);
        assert_eq!(config.max_ctx_chars, 2400);
        assert_eq!(config.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "upstream:\n  retriever_url: http://retriever:9001\n  model_name: test-model\nlimits:\n  max_ctx_snippets: 5\nserver:\n  port: 9090"
        )
        .unwrap();

        let config = GatewayConfig::default()
            .merge_yaml(&file.path().to_path_buf())
            .unwrap();

        assert_eq!(config.retriever_url, "http://retriever:9001");
        assert_eq!(config.model_name, "test-model");
        assert_eq!(config.max_ctx_snippets, 5);
        assert_eq!(config.port, 9090);
        // Untouched values keep defaults
        assert_eq!(config.max_ctx_chars, 2400);
        assert_eq!(config.generation_url, "http://localhost:8000");
    }

    #[test]
    fn test_merge_yaml_missing_file() {
        let result = GatewayConfig::default().merge_yaml(&PathBuf::from("/nonexistent/config.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_with_overrides() {
        let config = GatewayConfig::default().with_overrides(
            Some("127.0.0.1".to_string()),
            Some(3000),
            Some("debug".to_string()),
        );
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_rejects_zero_snippets() {
        let mut config = GatewayConfig::default();
        config.max_ctx_snippets = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = GatewayConfig::default();
        config.retriever_url = "retriever:8001".to_string();
        assert!(config.validate().is_err());
    }
}
