use crate::adapters::scryfall::{DEFAULT_COLLECTION_ENDPOINT, DEFAULT_NAMED_ENDPOINT};
use crate::core::catalog::{DEFAULT_MAX_FALLBACK_FAILURES, MAX_BATCH_SIZE, MIN_REQUEST_DELAY_MS};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, ValidatorError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub catalog: CatalogConfig,
    pub webhook: WebhookConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub collection_endpoint: String,
    pub named_endpoint: String,
    pub batch_size: usize,
    pub request_delay_ms: u64,
    pub max_fallback_failures: usize,
    pub user_agent: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            collection_endpoint: DEFAULT_COLLECTION_ENDPOINT.to_string(),
            named_endpoint: DEFAULT_NAMED_ENDPOINT.to_string(),
            batch_size: MAX_BATCH_SIZE,
            request_delay_ms: MIN_REQUEST_DELAY_MS,
            max_fallback_failures: DEFAULT_MAX_FALLBACK_FAILURES,
            user_agent: concat!("commander-deck-validator/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub username: String,
    pub avatar_url: String,
    /// `{player1}` / `{player2}` are replaced with the commanders' names.
    pub thread_name: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: "Deck Validator".to_string(),
            avatar_url: String::new(),
            thread_name: "{player1} vs {player2}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub cache_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_dir: "./.deck-validator".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ValidatorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ValidatorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DISCORD_WEBHOOK_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("catalog.collection_endpoint", &self.catalog.collection_endpoint)?;
        validation::validate_url("catalog.named_endpoint", &self.catalog.named_endpoint)?;
        validation::validate_range("catalog.batch_size", self.catalog.batch_size, 1, MAX_BATCH_SIZE)?;
        // 110ms 是 Scryfall 速率限制的硬性下限
        validation::validate_range(
            "catalog.request_delay_ms",
            self.catalog.request_delay_ms,
            MIN_REQUEST_DELAY_MS,
            60_000,
        )?;
        validation::validate_positive_number(
            "catalog.max_fallback_failures",
            self.catalog.max_fallback_failures,
            1,
        )?;
        validation::validate_non_empty_string("catalog.user_agent", &self.catalog.user_agent)?;

        if let Some(url) = &self.webhook.url {
            validation::validate_url("webhook.url", url)?;
        }
        validation::validate_non_empty_string("webhook.username", &self.webhook.username)?;

        validation::validate_path("storage.cache_dir", &self.storage.cache_dir)?;

        Ok(())
    }

    pub fn webhook_url(&self) -> Result<&str> {
        validation::validate_required_field("webhook.url", &self.webhook.url).map(String::as_str)
    }
}

impl ConfigProvider for TomlConfig {
    fn collection_endpoint(&self) -> &str {
        &self.catalog.collection_endpoint
    }

    fn named_endpoint(&self) -> &str {
        &self.catalog.named_endpoint
    }

    fn batch_size(&self) -> usize {
        self.catalog.batch_size
    }

    fn request_delay_ms(&self) -> u64 {
        self.catalog.request_delay_ms
    }

    fn max_fallback_failures(&self) -> usize {
        self.catalog.max_fallback_failures
    }

    fn user_agent(&self) -> &str {
        &self.catalog.user_agent
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.catalog.timeout_seconds.map(Duration::from_secs)
    }

    fn cache_dir(&self) -> &str {
        &self.storage.cache_dir
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
