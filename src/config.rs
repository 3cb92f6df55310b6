//! Configuration types for the email reputation agent.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use crate::validator::ValidateOptions;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global settings.
    #[serde(default)]
    pub settings: Settings,

    /// Local blocklist sources.
    #[serde(default)]
    pub reputation: ReputationConfig,

    /// Format/MX oracle.
    #[serde(default)]
    pub format_oracle: FormatOracleConfig,

    /// Realtime disposable-domain oracle.
    #[serde(default)]
    pub realtime_oracle: RealtimeOracleConfig,

    /// Deep mailbox verification backend.
    #[serde(default)]
    pub mailbox_oracle: MailboxOracleConfig,

    /// Result cache for deep verifications.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Global settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Maximum concurrent validations in a batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// What a configuration error does to the rest of a batch.
    #[serde(default)]
    pub fatal_policy: FatalPolicy,

    /// Reject domains the format oracle reports without MX records.
    #[serde(default = "default_true")]
    pub check_mx: bool,

    /// Consult the realtime disposable oracle.
    #[serde(default = "default_true")]
    pub realtime_disposable: bool,

    /// Use the result cache for deep verifications.
    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Format/MX oracle call budget in milliseconds.
    #[serde(default = "default_format_timeout")]
    pub format_timeout_ms: u64,

    /// Realtime oracle call budget in milliseconds.
    #[serde(default = "default_realtime_timeout")]
    pub realtime_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            fatal_policy: FatalPolicy::default(),
            check_mx: true,
            realtime_disposable: true,
            use_cache: true,
            format_timeout_ms: default_format_timeout(),
            realtime_timeout_ms: default_realtime_timeout(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}

fn default_format_timeout() -> u64 {
    5000
}

fn default_realtime_timeout() -> u64 {
    3000
}

/// Behavior of a batch when one item hits a configuration error.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FatalPolicy {
    /// Fail the whole batch.
    #[default]
    AbortBatch,
    /// Record the error for that item and keep going.
    Isolate,
}

/// Local blocklist sources.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReputationConfig {
    #[serde(default)]
    pub remote: RemoteFeedConfig,

    #[serde(default)]
    pub scraper: ScraperConfig,

    #[serde(default)]
    pub discovered: DiscoveredConfig,
}

/// Remote plaintext blocklist feed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteFeedConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Newline-delimited domain list.
    #[serde(default = "default_remote_url")]
    pub url: String,

    #[serde(default = "default_daily")]
    pub refresh_interval_seconds: u64,

    #[serde(default = "default_feed_timeout")]
    pub timeout_ms: u64,
}

impl Default for RemoteFeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_remote_url(),
            refresh_interval_seconds: default_daily(),
            timeout_ms: default_feed_timeout(),
        }
    }
}

fn default_remote_url() -> String {
    "https://raw.githubusercontent.com/disposable-email-domains/disposable-email-domains/master/disposable_email_blocklist.conf".to_string()
}

fn default_daily() -> u64 {
    86_400
}

fn default_feed_timeout() -> u64 {
    10_000
}

/// Temporary-mail provider pages scraped for their domain lists.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_providers")]
    pub providers: Vec<ScrapeTarget>,

    #[serde(default = "default_daily")]
    pub refresh_interval_seconds: u64,

    /// Below this many unique domains the static list is used instead.
    #[serde(default = "default_min_domains")]
    pub min_domains: usize,

    #[serde(default = "default_feed_timeout")]
    pub timeout_ms: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            providers: default_providers(),
            refresh_interval_seconds: default_daily(),
            min_domains: default_min_domains(),
            timeout_ms: default_feed_timeout(),
        }
    }
}

/// One provider page.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub name: String,
    pub url: String,
}

fn default_providers() -> Vec<ScrapeTarget> {
    [
        ("temp-mail", "https://temp-mail.org/en/"),
        ("guerrillamail", "https://www.guerrillamail.com/"),
        ("10minutemail", "https://10minutemail.net/"),
        ("tempmail-plus", "https://tempmail.plus/en/"),
        ("emailondeck", "https://www.emailondeck.com/"),
    ]
    .into_iter()
    .map(|(name, url)| ScrapeTarget {
        name: name.to_string(),
        url: url.to_string(),
    })
    .collect()
}

fn default_min_domains() -> usize {
    100
}

/// Domains discovered by the external scraper bot.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveredConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSON document `{domains, lastScrape, count}`.
    #[serde(default = "default_discovered_path")]
    pub path: PathBuf,

    #[serde(default = "default_hourly")]
    pub refresh_interval_seconds: u64,
}

impl Default for DiscoveredConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_discovered_path(),
            refresh_interval_seconds: default_hourly(),
        }
    }
}

fn default_discovered_path() -> PathBuf {
    PathBuf::from("data/discovered-domains.json")
}

fn default_hourly() -> u64 {
    3600
}

/// Format/MX oracle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatOracleConfig {
    #[serde(default = "default_format_url")]
    pub url: String,

    #[serde(default = "default_format_timeout")]
    pub timeout_ms: u64,
}

impl Default for FormatOracleConfig {
    fn default() -> Self {
        Self {
            url: default_format_url(),
            timeout_ms: default_format_timeout(),
        }
    }
}

fn default_format_url() -> String {
    "http://127.0.0.1:8787/check".to_string()
}

/// Realtime disposable oracle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RealtimeOracleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_realtime_url")]
    pub url: String,

    #[serde(default = "default_realtime_timeout")]
    pub timeout_ms: u64,

    /// Per-domain answer cache TTL.
    #[serde(default = "default_daily")]
    pub cache_ttl_seconds: u64,

    #[serde(default = "default_max_entries")]
    pub max_cache_entries: usize,
}

impl Default for RealtimeOracleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_realtime_url(),
            timeout_ms: default_realtime_timeout(),
            cache_ttl_seconds: default_daily(),
            max_cache_entries: default_max_entries(),
        }
    }
}

fn default_realtime_url() -> String {
    "https://disposable.debounce.io/".to_string()
}

fn default_max_entries() -> usize {
    10_000
}

/// Deep mailbox verification backend. Unset `url` disables deep mode.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailboxOracleConfig {
    #[serde(default)]
    pub url: Option<String>,

    /// Sent as the `Authorization` header (supports ${ENV_VAR} syntax).
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_mailbox_timeout")]
    pub timeout_ms: u64,
}

impl Default for MailboxOracleConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_ms: default_mailbox_timeout(),
        }
    }
}

impl MailboxOracleConfig {
    /// Configured endpoint, ignoring blank values left by unset env vars.
    pub fn endpoint(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

fn default_mailbox_timeout() -> u64 {
    30_000
}

/// Result cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: CacheBackend,

    /// Required for the redis backend.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Bound for the memory backend.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Per-reachability TTL overrides.
    #[serde(default)]
    pub ttl: TtlOverrides,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::default(),
            redis_url: None,
            max_entries: default_max_entries(),
            ttl: TtlOverrides::default(),
        }
    }
}

/// Result cache store.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

/// TTL overrides in seconds. A value ≤ 0 disables caching for that class.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TtlOverrides {
    #[serde(default)]
    pub safe: Option<i64>,
    #[serde(default)]
    pub risky: Option<i64>,
    #[serde(default)]
    pub invalid: Option<i64>,
    #[serde(default)]
    pub unknown: Option<i64>,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let expanded = expand_env_vars(&content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.settings.concurrency == 0 {
            anyhow::bail!("settings.concurrency must be at least 1");
        }

        if self.format_oracle.url.trim().is_empty() {
            anyhow::bail!("format_oracle.url is empty");
        }

        if self.realtime_oracle.enabled && self.realtime_oracle.url.trim().is_empty() {
            anyhow::bail!("realtime_oracle is enabled but url is empty");
        }

        let remote = &self.reputation.remote;
        if remote.enabled && remote.url.trim().is_empty() {
            anyhow::bail!("reputation.remote is enabled but url is empty");
        }

        for provider in &self.reputation.scraper.providers {
            if provider.url.trim().is_empty() {
                anyhow::bail!("scraper provider '{}' has an empty url", provider.name);
            }
        }

        if self.cache.enabled && self.cache.backend == CacheBackend::Redis {
            let url = self.cache.redis_url.as_deref().unwrap_or_default();
            if url.trim().is_empty() {
                anyhow::bail!("cache backend is redis but redis_url is empty");
            }
        }

        Ok(())
    }

    /// Per-address options derived from the global settings.
    pub fn validate_options(&self) -> ValidateOptions {
        ValidateOptions {
            check_mx: self.settings.check_mx,
            realtime_disposable: self.settings.realtime_disposable && self.realtime_oracle.enabled,
            deep: false,
            use_cache: self.settings.use_cache && self.cache.enabled,
            format_timeout: Duration::from_millis(self.settings.format_timeout_ms),
            realtime_timeout: Duration::from_millis(self.settings.realtime_timeout_ms),
        }
    }

    /// Generate example configuration YAML.
    pub fn example() -> String {
        r#"# Email Reputation Agent Configuration

settings:
  concurrency: 5               # Concurrent validations per batch
  fatal_policy: abort_batch    # abort_batch or isolate
  check_mx: true
  realtime_disposable: true
  use_cache: true
  format_timeout_ms: 5000
  realtime_timeout_ms: 3000

# Local blocklists (checked synchronously, refreshed in the background)
reputation:
  remote:
    enabled: true
    url: "https://raw.githubusercontent.com/disposable-email-domains/disposable-email-domains/master/disposable_email_blocklist.conf"
    refresh_interval_seconds: 86400
  scraper:
    enabled: true
    min_domains: 100           # Fall back to the static list below this
    refresh_interval_seconds: 86400
    providers:
      - name: "temp-mail"
        url: "https://temp-mail.org/en/"
  discovered:
    enabled: true
    path: "data/discovered-domains.json"
    refresh_interval_seconds: 3600

# Format + MX + disposable-list oracle
format_oracle:
  url: "http://127.0.0.1:8787/check"
  timeout_ms: 5000

# Realtime disposable oracle (fails open)
realtime_oracle:
  enabled: true
  url: "https://disposable.debounce.io/"
  timeout_ms: 3000
  cache_ttl_seconds: 86400

# Deep mailbox verification (required for deep mode)
mailbox_oracle:
  url: "${MAILBOX_ORACLE_URL}"
  api_key: "${MAILBOX_ORACLE_KEY}"
  timeout_ms: 30000

# Deep verification result cache
cache:
  enabled: true
  backend: memory              # memory or redis
  # redis_url: "redis://127.0.0.1/"
  max_entries: 10000
  ttl:                         # seconds; <= 0 disables caching
    safe: 604800
    invalid: 2592000
    risky: 86400
    unknown: 0
"#
        .to_string()
    }
}

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// Expand environment variables in the format ${VAR_NAME}.
fn expand_env_vars(content: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(content, |cap: &regex::Captures<'_>| {
            std::env::var(&cap[1]).unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.concurrency, 5);
        assert_eq!(settings.fatal_policy, FatalPolicy::AbortBatch);
        assert!(settings.check_mx);
        assert!(settings.realtime_disposable);
        assert_eq!(settings.format_timeout_ms, 5000);
        assert_eq!(settings.realtime_timeout_ms, 3000);
    }

    #[test]
    fn test_default_sources() {
        let config = ReputationConfig::default();
        assert!(config.remote.enabled);
        assert_eq!(config.scraper.min_domains, 100);
        assert_eq!(config.discovered.refresh_interval_seconds, 3600);
        assert!(!config.scraper.providers.is_empty());
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("TEST_MAILBOX_KEY", "secret123");
        let input = "api_key: \"${TEST_MAILBOX_KEY}\"";
        let result = expand_env_vars(input);
        assert_eq!(result, "api_key: \"secret123\"");
        std::env::remove_var("TEST_MAILBOX_KEY");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        let input = "url: \"${NONEXISTENT_MAILBOX_VAR}\"";
        let result = expand_env_vars(input);
        assert_eq!(result, "url: \"\"");
    }

    #[test]
    fn test_blank_mailbox_url_is_unconfigured() {
        let config = MailboxOracleConfig {
            url: Some("  ".to_string()),
            ..MailboxOracleConfig::default()
        };
        assert!(config.endpoint().is_none());

        let config = MailboxOracleConfig {
            url: Some("http://reacher:8080/v0/check_email".to_string()),
            ..MailboxOracleConfig::default()
        };
        assert_eq!(config.endpoint(), Some("http://reacher:8080/v0/check_email"));
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
settings:
  concurrency: 10
  fatal_policy: isolate
  check_mx: false

cache:
  backend: memory
  ttl:
    safe: 60
    unknown: -1
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.settings.concurrency, 10);
        assert_eq!(config.settings.fatal_policy, FatalPolicy::Isolate);
        assert!(!config.settings.check_mx);
        assert_eq!(config.cache.ttl.safe, Some(60));
        assert_eq!(config.cache.ttl.unknown, Some(-1));
        assert_eq!(config.cache.ttl.risky, None);
        assert!(config.mailbox_oracle.url.is_none());
    }

    #[test]
    fn test_example_parses_and_validates() {
        let config: Config = serde_yaml::from_str(&Config::example()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl.safe, Some(604_800));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = Config::default();
        config.settings.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_redis_without_url() {
        let mut config = Config::default();
        config.cache.backend = CacheBackend::Redis;
        assert!(config.validate().is_err());

        config.cache.redis_url = Some("redis://127.0.0.1/".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_options_follow_settings() {
        let mut config = Config::default();
        config.realtime_oracle.enabled = false;
        config.cache.enabled = false;

        let options = config.validate_options();
        assert!(options.check_mx);
        assert!(!options.realtime_disposable);
        assert!(!options.use_cache);
        assert!(!options.deep);
        assert_eq!(options.format_timeout, Duration::from_secs(5));
    }
}
