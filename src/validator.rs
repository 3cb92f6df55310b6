//! Validation orchestrator.
//!
//! Runs one address through the pipeline: syntax, local blocklists, the
//! format/MX oracle, the realtime disposable oracle, and optionally the
//! result cache plus deep mailbox verification. Oracle failures are
//! classified once, at [`EmailValidator::validate`]: a missing deep backend
//! is returned to the caller, everything else becomes a fail-open verdict.

use crate::cache::memory::MemoryStore;
use crate::cache::{CacheStore, ResultCache, TtlPolicy};
use crate::config::{CacheBackend, Config};
use crate::oracles::format::HttpFormatOracle;
use crate::oracles::mailbox::HttpMailboxOracle;
use crate::oracles::realtime::HttpDisposableOracle;
use crate::oracles::{
    domain_of, DisposableOracle, FormatOracle, FormatRequest, MailboxOracle, OracleError, Severity,
};
use crate::reputation::ReputationStore;
use crate::verdict::{Outcome, ValidationResult};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, info, warn};

static EMAIL_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$",
    )
    .expect("email syntax pattern is valid")
});

/// Per-call pipeline switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Reject domains the format oracle reports without MX records.
    pub check_mx: bool,
    /// Consult the realtime disposable oracle.
    pub realtime_disposable: bool,
    /// Run deep mailbox verification.
    pub deep: bool,
    /// Use the result cache for deep verification.
    pub use_cache: bool,
    pub format_timeout: Duration,
    pub realtime_timeout: Duration,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            check_mx: true,
            realtime_disposable: true,
            deep: false,
            use_cache: true,
            format_timeout: Duration::from_secs(5),
            realtime_timeout: Duration::from_secs(3),
        }
    }
}

/// Error surfaced to callers of the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Deep verification requested without a configured backend.
    Configuration(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Lowercase and trim an address.
pub fn normalize_email(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Structural syntax check on a normalized address.
pub fn is_valid_syntax(email: &str) -> bool {
    email.len() <= 254 && EMAIL_SYNTAX.is_match(email)
}

/// The validation orchestrator.
pub struct EmailValidator {
    reputation: Arc<ReputationStore>,
    format: Arc<dyn FormatOracle>,
    realtime: Option<Arc<dyn DisposableOracle>>,
    mailbox: Option<Arc<dyn MailboxOracle>>,
    cache: Option<ResultCache>,
}

impl EmailValidator {
    pub fn new(reputation: Arc<ReputationStore>, format: Arc<dyn FormatOracle>) -> Self {
        Self {
            reputation,
            format,
            realtime: None,
            mailbox: None,
            cache: None,
        }
    }

    pub fn with_realtime(mut self, oracle: Arc<dyn DisposableOracle>) -> Self {
        self.realtime = Some(oracle);
        self
    }

    pub fn with_mailbox(mut self, oracle: Arc<dyn MailboxOracle>) -> Self {
        self.mailbox = Some(oracle);
        self
    }

    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build every collaborator from configuration and load the blocklists.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let reputation = Arc::new(ReputationStore::new(&config.reputation)?);
        reputation.initialize().await;

        let format = Arc::new(HttpFormatOracle::new(config.format_oracle.clone())?);
        let mut validator = Self::new(reputation, format);

        if config.realtime_oracle.enabled {
            let oracle = HttpDisposableOracle::new(config.realtime_oracle.clone())?;
            validator = validator.with_realtime(Arc::new(oracle));
            info!(url = %config.realtime_oracle.url, "Realtime disposable oracle enabled");
        }

        if config.mailbox_oracle.endpoint().is_some() {
            let oracle = HttpMailboxOracle::new(config.mailbox_oracle.clone())?;
            validator = validator.with_mailbox(Arc::new(oracle));
            info!("Deep mailbox verification enabled");
        }

        if config.cache.enabled {
            let store = open_store(config).await?;
            info!(store = store.name(), "Result cache enabled");
            let policy = TtlPolicy::with_overrides(&config.cache.ttl);
            validator = validator.with_cache(ResultCache::new(store, policy));
        }

        Ok(validator)
    }

    pub fn reputation(&self) -> &Arc<ReputationStore> {
        &self.reputation
    }

    /// Validate one address.
    ///
    /// Only a configuration problem is an error; transient oracle trouble
    /// yields an optimistic verdict.
    pub async fn validate(
        &self,
        address: &str,
        options: &ValidateOptions,
    ) -> Result<ValidationResult, ValidationError> {
        let email = normalize_email(address);

        match self.run(&email, options).await {
            Ok(result) => Ok(result),
            Err(e) => match e.severity() {
                Severity::Fatal => Err(ValidationError::Configuration(e.to_string())),
                Severity::Recoverable => {
                    warn!(email = %email, error = %e, "Validation failed open");
                    Ok(ValidationResult::fail_open(email))
                }
            },
        }
    }

    async fn run(
        &self,
        email: &str,
        options: &ValidateOptions,
    ) -> Result<ValidationResult, OracleError> {
        if !is_valid_syntax(email) {
            return Ok(finish(email, Outcome::SyntaxFail));
        }

        let domain = domain_of(email);
        if self.reputation.is_disposable(domain) {
            return Ok(finish(email, Outcome::Disposable));
        }

        let request = FormatRequest {
            email: email.to_string(),
            check_mx: options.check_mx,
            check_disposable: true,
            timeout: options.format_timeout,
        };
        let report = tokio::time::timeout(options.format_timeout, self.format.check(&request)).await??;
        debug!(
            email = %email,
            oracle = self.format.name(),
            format_valid = report.format_valid,
            has_mx = report.has_mx,
            provider = report.provider.as_deref().unwrap_or("-"),
            "Format oracle answered"
        );

        if !report.format_valid {
            return Ok(finish(email, Outcome::SyntaxFail));
        }
        if report.disposable {
            return Ok(finish(email, Outcome::Disposable));
        }
        if options.check_mx && !report.has_mx {
            return Ok(finish(email, Outcome::NoMx));
        }

        if options.realtime_disposable && self.realtime_flags(email, options).await {
            return Ok(finish(email, Outcome::Disposable));
        }

        if !options.deep {
            return Ok(finish(email, Outcome::ValidShallow));
        }

        let cache = self.cache.as_ref().filter(|_| options.use_cache);
        if let Some(cache) = cache {
            if let Some(hit) = cache.load(email).await {
                debug!(email = %email, valid = hit.valid, "Serving cached deep result");
                return Ok(hit.from_cache());
            }
        }

        let mailbox = self.mailbox.as_ref().ok_or_else(|| {
            OracleError::NotConfigured("deep verification requires a mailbox backend".to_string())
        })?;
        let report = mailbox.verify(email).await?;
        let result = ValidationResult::from_mailbox(email, &report);
        debug!(
            email = %email,
            oracle = mailbox.name(),
            reachability = %report.reachability,
            valid = result.valid,
            reason = ?result.reason,
            "Deep verification complete"
        );

        if let Some(cache) = cache {
            cache.save(&result, report.reachability).await;
        }

        Ok(result)
    }

    /// Whether the realtime oracle flags the address. Any failure reads as
    /// "not flagged".
    async fn realtime_flags(&self, email: &str, options: &ValidateOptions) -> bool {
        let Some(oracle) = &self.realtime else {
            return false;
        };

        match tokio::time::timeout(options.realtime_timeout, oracle.is_disposable(email)).await {
            Ok(Ok(flagged)) => flagged,
            Ok(Err(e)) => {
                warn!(email = %email, oracle = oracle.name(), error = %e, "Realtime oracle failed, continuing");
                false
            }
            Err(_) => {
                warn!(email = %email, oracle = oracle.name(), "Realtime oracle timed out, continuing");
                false
            }
        }
    }
}

fn finish(email: &str, outcome: Outcome) -> ValidationResult {
    debug!(email = %email, outcome = ?outcome, "Validation finished");
    ValidationResult::from_outcome(email, outcome)
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn CacheStore>> {
    match config.cache.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryStore::new(config.cache.max_entries))),
        #[cfg(feature = "redis")]
        CacheBackend::Redis => {
            let url = config
                .cache
                .redis_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("cache.redis_url is required for the redis backend"))?;
            let store = crate::cache::redis_store::RedisStore::connect(url).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        CacheBackend::Redis => {
            anyhow::bail!("redis cache backend requires building with the `redis` feature")
        }
    }
}
