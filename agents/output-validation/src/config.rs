//! Engine configuration
//!
//! Loaded from environment variables (unparseable values fall back to the
//! defaults) or assembled with [`EngineConfigBuilder`].

/// Default semantic budget in milliseconds
pub const DEFAULT_SEMANTIC_TIMEOUT_MS: u64 = 10_000;

/// Default wait before re-initializing an unavailable reasoning service
pub const DEFAULT_INIT_RETRY_MS: u64 = 30_000;

/// Configuration for the validation engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Base URL of the chat-completions API
    pub reasoning_endpoint: String,

    /// API key; without one the engine runs heuristics only
    pub reasoning_api_key: Option<String>,

    pub reasoning_model: String,

    /// Hard bound on one remote semantic call, always >= 1
    pub semantic_timeout_ms: u64,

    pub init_retry_after_ms: u64,

    /// Under `strict` level, double heuristic content minimums and flag
    /// one-character strings
    pub strict_heuristics: bool,

    pub enable_metrics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reasoning_endpoint: "https://api.openai.com".to_string(),
            reasoning_api_key: None,
            reasoning_model: "gpt-4o".to_string(),
            semantic_timeout_ms: DEFAULT_SEMANTIC_TIMEOUT_MS,
            init_retry_after_ms: DEFAULT_INIT_RETRY_MS,
            strict_heuristics: false,
            enable_metrics: true,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            reasoning_endpoint: lookup("REASONING_ENDPOINT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.reasoning_endpoint),
            reasoning_api_key: lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty()),
            reasoning_model: lookup("REASONING_MODEL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.reasoning_model),
            semantic_timeout_ms: lookup("SEMANTIC_TIMEOUT_MS")
                .map(|v| v.parse().unwrap_or(DEFAULT_SEMANTIC_TIMEOUT_MS))
                .unwrap_or(DEFAULT_SEMANTIC_TIMEOUT_MS)
                .max(1),
            init_retry_after_ms: lookup("REASONING_INIT_RETRY_MS")
                .map(|v| v.parse().unwrap_or(DEFAULT_INIT_RETRY_MS))
                .unwrap_or(DEFAULT_INIT_RETRY_MS),
            strict_heuristics: lookup("STRICT_HEURISTICS")
                .map(|v| v.parse().unwrap_or(false))
                .unwrap_or(false),
            enable_metrics: lookup("ENABLE_METRICS")
                .map(|v| v.parse().unwrap_or(true))
                .unwrap_or(true),
        }
    }

    /// Whether a remote reasoning service can be attempted at all
    pub fn has_reasoning_service(&self) -> bool {
        self.reasoning_api_key.is_some()
    }
}

/// Builder for EngineConfig
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn reasoning_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.reasoning_endpoint = endpoint.into();
        self
    }

    pub fn reasoning_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.config.reasoning_api_key = (!key.trim().is_empty()).then_some(key);
        self
    }

    pub fn reasoning_model(mut self, model: impl Into<String>) -> Self {
        self.config.reasoning_model = model.into();
        self
    }

    /// Zero is raised to 1 ms so the budget stays finite and non-zero
    pub fn semantic_timeout_ms(mut self, timeout: u64) -> Self {
        self.config.semantic_timeout_ms = timeout.max(1);
        self
    }

    pub fn init_retry_after_ms(mut self, retry: u64) -> Self {
        self.config.init_retry_after_ms = retry;
        self
    }

    pub fn strict_heuristics(mut self, enabled: bool) -> Self {
        self.config.strict_heuristics = enabled;
        self
    }

    pub fn enable_metrics(mut self, enabled: bool) -> Self {
        self.config.enable_metrics = enabled;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
