use crate::config::{load_llm_config, ServerConfig};
use llm::{build_provider, LlmError, LlmProvider};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Builds a provider for one request.
pub type ProviderFactory =
    Arc<dyn Fn() -> Result<Arc<dyn LlmProvider>, LlmError> + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    provider_factory: ProviderFactory,

    /// Prometheus handle, present when the recorder is installed
    metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// State whose providers come from the process environment
    pub fn new(config: ServerConfig) -> Self {
        Self::with_provider_factory(config, env_provider_factory())
    }

    pub fn with_provider_factory(config: ServerConfig, provider_factory: ProviderFactory) -> Self {
        Self {
            config: Arc::new(config),
            provider_factory,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Construct a provider. No network I/O happens here.
    pub fn provider(&self) -> Result<Arc<dyn LlmProvider>, LlmError> {
        (self.provider_factory)()
    }

    /// Prometheus text exposition, empty without a recorder
    pub fn render_metrics(&self) -> String {
        self.metrics
            .as_ref()
            .map(PrometheusHandle::render)
            .unwrap_or_default()
    }
}

/// Factory that re-reads `LlmConfig` from the environment on every call
pub fn env_provider_factory() -> ProviderFactory {
    Arc::new(|| -> Result<Arc<dyn LlmProvider>, LlmError> {
        let cfg = load_llm_config()?;
        build_provider(&cfg)
    })
}
