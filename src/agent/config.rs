//! Agent Configuration
//!
//! Settings for the affiliate promoter: identity, goal, cycle pacing and one
//! section per collaborator. Loaded from a JSON file, the environment, or both
//! (environment wins).
//!
//! ```ignore
//! let settings = AgentSettings::load(Some(Path::new("agent.json")))?
//!     .with_role("tech reviewer")
//!     .with_max_code_retries(5);
//! settings.validate()?;
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{AgentError, AgentResult, ConfigurationError};
use crate::logging::{LogFormat, LogSettings};
use crate::llm::openrouter::{DEFAULT_API_BASE, DEFAULT_MODEL};

/// OpenRouter backend settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Falls back to `OPENROUTER_API_KEY` when unset
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub include_reasoning: bool,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_BASE.to_string(),
            max_tokens: 8192,
            timeout_secs: 120,
            include_reasoning: false,
        }
    }
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("include_reasoning", &self.include_reasoning)
            .finish()
    }
}

/// Where and how generated code runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    pub interpreter: String,
    pub timeout_secs: u64,
    /// Working directory for runs; the process cwd when unset
    pub workdir: Option<PathBuf>,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            timeout_secs: 120,
            workdir: None,
        }
    }
}

/// Strategy retrieval service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Retrieval is skipped when unset
    pub base_url: Option<String>,
    pub top_k: usize,
    pub timeout_secs: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            top_k: 5,
            timeout_secs: 30,
        }
    }
}

/// Local persistence of chat histories and strategies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Product discovery and publishing
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Run the product promotion pass after each cycle
    pub enabled: bool,
    pub ebay_query: String,
    pub aliexpress_query: String,
    pub products_per_source: usize,
    /// Requests each product source may make per process lifetime
    pub request_limit: u32,
    pub ebay_campaign_id: Option<String>,
    pub ebay_client_id: Option<String>,
    pub ebay_client_secret: Option<String>,
    pub ebay_refresh_token: Option<String>,
    pub ebay_user_token: Option<String>,
    pub aliexpress_app_key: Option<String>,
    pub aliexpress_app_secret: Option<String>,
    pub aliexpress_tracking_id: Option<String>,
    /// Mock posts land here when no platform publisher succeeds
    pub mock_posts_dir: PathBuf,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            ebay_query: "laptop".to_string(),
            aliexpress_query: "smartwatch".to_string(),
            products_per_source: 3,
            request_limit: 5000,
            ebay_campaign_id: None,
            ebay_client_id: None,
            ebay_client_secret: None,
            ebay_refresh_token: None,
            ebay_user_token: None,
            aliexpress_app_key: None,
            aliexpress_app_secret: None,
            aliexpress_tracking_id: None,
            mock_posts_dir: PathBuf::from("demo_output"),
        }
    }
}

impl std::fmt::Debug for CatalogSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secret = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("CatalogSettings")
            .field("enabled", &self.enabled)
            .field("ebay_query", &self.ebay_query)
            .field("aliexpress_query", &self.aliexpress_query)
            .field("products_per_source", &self.products_per_source)
            .field("request_limit", &self.request_limit)
            .field("ebay_campaign_id", &self.ebay_campaign_id)
            .field("ebay_client_id", &self.ebay_client_id)
            .field("ebay_client_secret", &secret(&self.ebay_client_secret))
            .field("ebay_refresh_token", &secret(&self.ebay_refresh_token))
            .field("ebay_user_token", &secret(&self.ebay_user_token))
            .field("aliexpress_app_key", &self.aliexpress_app_key)
            .field("aliexpress_app_secret", &secret(&self.aliexpress_app_secret))
            .field("aliexpress_tracking_id", &self.aliexpress_tracking_id)
            .field("mock_posts_dir", &self.mock_posts_dir)
            .finish()
    }
}

/// Configuration for an AffiliatePromoterAgent run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub agent_id: String,
    pub session_id: String,

    /// Persona given to the model ("influencer", "tech reviewer", ...)
    pub role: String,
    /// Time horizon of the goal ("24h", "7d", ...)
    pub time: String,
    pub metric_name: String,

    /// API descriptors offered to the model; the built-in one when empty
    pub apis: Vec<String>,

    /// Pause between autonomous cycles
    pub cycle_interval_secs: u64,
    /// Stop the autonomous loop after this many cycles; unbounded when unset
    pub max_cycles: Option<u32>,
    /// Regeneration attempts after the first failed execution
    pub max_code_retries: u32,

    /// JSON object of template name -> body; the built-in templates when unset
    pub prompts_file: Option<PathBuf>,

    pub llm: LlmSettings,
    pub sandbox: SandboxSettings,
    pub retrieval: RetrievalSettings,
    pub storage: StorageSettings,
    pub catalog: CatalogSettings,
    pub logging: LogSettings,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            agent_id: "affiliate_promoter_agent".to_string(),
            session_id: uuid::Uuid::new_v4().to_string(),
            role: "influencer".to_string(),
            time: "24h".to_string(),
            metric_name: "followers".to_string(),
            apis: Vec::new(),
            cycle_interval_secs: 600,
            max_cycles: None,
            max_code_retries: 3,
            prompts_file: None,
            llm: LlmSettings::default(),
            sandbox: SandboxSettings::default(),
            retrieval: RetrievalSettings::default(),
            storage: StorageSettings::default(),
            catalog: CatalogSettings::default(),
            logging: LogSettings::default(),
        }
    }
}

impl AgentSettings {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env_with(|key| std::env::var(key).ok());
        settings
    }

    /// Read settings from a JSON file; absent keys take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> AgentResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&raw).map_err(|e| {
            AgentError::from(ConfigurationError::invalid(format!(
                "Failed to parse settings file {:?}: {}",
                path, e
            )))
        })?;
        tracing::info!("[Config] Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// File settings (when given) overlaid with the environment
    pub fn load(path: Option<&Path>) -> AgentResult<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env_with(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Overlay values from a variable lookup (the environment in production)
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key) {
                *target = value;
            }
        };
        set(&mut self.agent_id, "AGENT_ID");
        set(&mut self.session_id, "SESSION_ID");
        set(&mut self.role, "AGENT_ROLE");
        set(&mut self.time, "AGENT_TIME");
        set(&mut self.metric_name, "AGENT_METRIC");
        set(&mut self.llm.model, "OPENROUTER_MODEL");
        set(&mut self.llm.base_url, "OPENROUTER_BASE_URL");
        set(&mut self.sandbox.interpreter, "SANDBOX_INTERPRETER");
        set(&mut self.logging.level, "LOG_LEVEL");
        set(&mut self.catalog.ebay_query, "EBAY_QUERY");
        set(&mut self.catalog.aliexpress_query, "ALIEXPRESS_QUERY");

        let set_opt = |target: &mut Option<String>, key: &str| {
            if let Some(value) = lookup(key) {
                *target = Some(value);
            }
        };
        set_opt(&mut self.llm.api_key, "OPENROUTER_API_KEY");
        set_opt(&mut self.retrieval.base_url, "RAG_SERVICE_URL");
        set_opt(&mut self.catalog.ebay_campaign_id, "EBAY_CAMPID");
        set_opt(&mut self.catalog.ebay_client_id, "EBAY_CLIENT_ID");
        set_opt(&mut self.catalog.ebay_client_secret, "EBAY_CLIENT_SECRET");
        set_opt(&mut self.catalog.ebay_refresh_token, "EBAY_REFRESH_TOKEN");
        set_opt(&mut self.catalog.ebay_user_token, "EBAY_USER_TOKEN");
        set_opt(&mut self.catalog.aliexpress_app_key, "ALIEXPRESS_API_KEY");
        set_opt(&mut self.catalog.aliexpress_app_secret, "ALIEXPRESS_API_SECRET");
        set_opt(&mut self.catalog.aliexpress_tracking_id, "ALIEXPRESS_PID");

        let parse = |key: &str| lookup(key).and_then(|v| v.parse::<u64>().ok());
        if let Some(v) = parse("AGENT_CYCLE_INTERVAL_SECS") {
            self.cycle_interval_secs = v;
        }
        if let Some(v) = parse("AGENT_MAX_CYCLES") {
            self.max_cycles = u32::try_from(v).ok();
        }
        if let Some(v) = parse("AGENT_MAX_CODE_RETRIES").and_then(|v| u32::try_from(v).ok()) {
            self.max_code_retries = v;
        }
        if let Some(v) = parse("OPENROUTER_MAX_TOKENS").and_then(|v| u32::try_from(v).ok()) {
            self.llm.max_tokens = v;
        }
        if let Some(v) = parse("SANDBOX_TIMEOUT_SECS") {
            self.sandbox.timeout_secs = v;
        }

        let set_path = |target: &mut Option<PathBuf>, key: &str| {
            if let Some(value) = lookup(key) {
                *target = Some(PathBuf::from(value));
            }
        };
        set_path(&mut self.prompts_file, "AGENT_PROMPTS_FILE");
        set_path(&mut self.sandbox.workdir, "SANDBOX_WORKDIR");
        set_path(&mut self.logging.log_dir, "LOG_DIR");

        if let Some(dir) = lookup("AGENT_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            };
        }
        if let Some(enabled) = lookup("CATALOG_ENABLED") {
            self.catalog.enabled = matches!(enabled.as_str(), "1" | "true" | "yes");
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }

    pub fn with_metric_name(mut self, metric_name: impl Into<String>) -> Self {
        self.metric_name = metric_name.into();
        self
    }

    pub fn with_apis(mut self, apis: Vec<String>) -> Self {
        self.apis = apis;
        self
    }

    pub fn with_max_code_retries(mut self, retries: u32) -> Self {
        self.max_code_retries = retries;
        self
    }

    pub fn with_cycle_interval_secs(mut self, secs: u64) -> Self {
        self.cycle_interval_secs = secs;
        self
    }

    pub fn with_max_cycles(mut self, cycles: u32) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    pub fn with_prompts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.prompts_file = Some(path.into());
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.data_dir = dir.into();
        self
    }

    /// Reject settings the agent cannot run with
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let required = [
            ("agent_id", &self.agent_id),
            ("session_id", &self.session_id),
            ("role", &self.role),
            ("time", &self.time),
            ("metric_name", &self.metric_name),
            ("llm.model", &self.llm.model),
            ("sandbox.interpreter", &self.sandbox.interpreter),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigurationError::invalid(format!("{} must not be empty", name)));
            }
        }

        if self.cycle_interval_secs == 0 {
            return Err(ConfigurationError::invalid("cycle_interval_secs must be at least 1"));
        }
        if self.sandbox.timeout_secs == 0 {
            return Err(ConfigurationError::invalid("sandbox.timeout_secs must be at least 1"));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigurationError::invalid("llm.max_tokens must be at least 1"));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigurationError::invalid("retrieval.top_k must be at least 1"));
        }
        if self.max_cycles == Some(0) {
            return Err(ConfigurationError::invalid("max_cycles must be at least 1 when set"));
        }
        if let Some(ref url) = self.retrieval.base_url {
            url::Url::parse(url).map_err(|e| {
                ConfigurationError::invalid(format!("retrieval.base_url {:?}: {}", url, e))
            })?;
        }
        url::Url::parse(&self.llm.base_url).map_err(|e| {
            ConfigurationError::invalid(format!("llm.base_url {:?}: {}", self.llm.base_url, e))
        })?;

        Ok(())
    }
}
