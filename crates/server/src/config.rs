use axum::http::{HeaderName, Method};
use llm::{LlmConfig, LlmError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Deployment environment; `production` turns on strict CORS checks
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout for non-streaming routes, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in KB
    #[serde(default = "default_max_body_size_kb")]
    pub max_body_size_kb: usize,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Comma-separated allowed origins; `*` allows any
    #[serde(default = "default_cors_allow_origins")]
    pub cors_allow_origins: String,

    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// Comma-separated allowed methods
    #[serde(default = "default_cors_allow_methods")]
    pub cors_allow_methods: String,

    /// Comma-separated allowed request headers
    #[serde(default = "default_cors_allow_headers")]
    pub cors_allow_headers: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_kb: default_max_body_size_kb(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            cors_allow_origins: default_cors_allow_origins(),
            cors_allow_credentials: false,
            cors_allow_methods: default_cors_allow_methods(),
            cors_allow_headers: default_cors_allow_headers(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config files
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("rephrase").required(false))
            // Override with REPHRASE_* environment variables
            .add_source(
                config::Environment::with_prefix("REPHRASE")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject CORS settings that are unsafe or that tower-http would panic on
    pub fn validate(&self) -> anyhow::Result<()> {
        let origins = self.cors_origins();
        let wildcard = origins.iter().any(|origin| origin == "*");

        if self.is_production() {
            if origins.is_empty() {
                anyhow::bail!("CORS_ALLOW_ORIGINS must not be empty in production");
            }
            if wildcard {
                anyhow::bail!("CORS_ALLOW_ORIGINS must not contain '*' in production");
            }
        }
        if wildcard && self.cors_allow_credentials {
            anyhow::bail!("CORS_ALLOW_CREDENTIALS cannot be combined with a '*' origin");
        }

        self.cors_methods()?;
        self.cors_headers()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case("production")
    }

    pub fn cors_origins(&self) -> Vec<String> {
        split_list(&self.cors_allow_origins)
    }

    pub fn cors_methods(&self) -> anyhow::Result<Vec<Method>> {
        split_list(&self.cors_allow_methods)
            .into_iter()
            .map(|name| -> anyhow::Result<Method> {
                let upper = name.to_ascii_uppercase();
                match upper.as_str() {
                    "GET" | "POST" | "PUT" | "PATCH" | "DELETE" | "HEAD" | "OPTIONS" => {
                        Ok(Method::from_bytes(upper.as_bytes())?)
                    }
                    _ => anyhow::bail!("unknown CORS method: {name}"),
                }
            })
            .collect()
    }

    pub fn cors_headers(&self) -> anyhow::Result<Vec<HeaderName>> {
        split_list(&self.cors_allow_headers)
            .into_iter()
            .map(|name| {
                HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| anyhow::anyhow!("invalid CORS header name: {name}"))
            })
            .collect()
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_kb * 1024
    }
}

/// Read provider settings from the (unprefixed) process environment.
///
/// Called on every provider construction so that changes to `LLM_MODE` or
/// `ALLOW_REAL_LLM` take effect without a restart.
pub fn load_llm_config() -> Result<LlmConfig, LlmError> {
    config::Config::builder()
        .add_source(config::Environment::default())
        .build()
        .and_then(|cfg| cfg.try_deserialize())
        .map_err(|e| LlmError::InvalidConfig(format!("failed to read LLM settings: {e}")))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_body_size_kb() -> usize {
    64
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cors_allow_origins() -> String {
    "http://localhost:5173,http://127.0.0.1:5173".to_string()
}

fn default_cors_allow_methods() -> String {
    "GET,POST,OPTIONS".to_string()
}

fn default_cors_allow_headers() -> String {
    "Content-Type,Authorization,X-Request-Id".to_string()
}
