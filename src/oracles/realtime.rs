//! Realtime disposable-domain oracle.
//!
//! Answers are cached per domain so a burst of addresses on one domain costs
//! a single request.

use super::{domain_of, DisposableOracle, OracleError};
use crate::cache::ttl::TtlMap;
use crate::config::RealtimeOracleConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// The API reports its flag as a string; plain booleans are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RealtimeResponse {
    disposable: Flag,
}

fn parse_disposable_flag(body: &str) -> Result<bool, OracleError> {
    let response: RealtimeResponse = serde_json::from_str(body)
        .map_err(|e| OracleError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    match response.disposable {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(OracleError::InvalidResponse(format!(
                "Unexpected disposable flag: {}",
                other
            ))),
        },
    }
}

/// Realtime disposable oracle over HTTP.
pub struct HttpDisposableOracle {
    config: RealtimeOracleConfig,
    client: Client,
    cache: TtlMap<String, bool>,
}

impl HttpDisposableOracle {
    pub fn new(config: RealtimeOracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let cache = TtlMap::new(config.max_cache_entries);

        Ok(Self {
            config,
            client,
            cache,
        })
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache_ttl_seconds)
    }

    /// Cached answer for a domain.
    pub fn cached(&self, domain: &str) -> Option<bool> {
        self.cache.get(&domain.to_string())
    }
}

#[async_trait]
impl DisposableOracle for HttpDisposableOracle {
    async fn is_disposable(&self, email: &str) -> Result<bool, OracleError> {
        let domain = domain_of(email).to_string();

        if let Some(flag) = self.cache.get(&domain) {
            debug!(domain = %domain, disposable = flag, "Realtime oracle cache hit");
            return Ok(flag);
        }

        let response = self
            .client
            .get(&self.config.url)
            .query(&[("email", email)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(OracleError::InvalidResponse(format!("HTTP {}", status)));
        }

        let body = response.text().await?;
        let flag = parse_disposable_flag(&body)?;

        self.cache.insert(domain.clone(), flag, self.cache_ttl());
        debug!(domain = %domain, disposable = flag, "Realtime oracle answered");

        Ok(flag)
    }

    fn name(&self) -> &str {
        "realtime"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_flag() {
        assert!(parse_disposable_flag(r#"{"disposable":"true"}"#).unwrap());
        assert!(!parse_disposable_flag(r#"{"disposable":"false"}"#).unwrap());
        assert!(parse_disposable_flag(r#"{"disposable":"TRUE"}"#).unwrap());
    }

    #[test]
    fn test_parse_bool_flag() {
        assert!(parse_disposable_flag(r#"{"disposable":true}"#).unwrap());
        assert!(!parse_disposable_flag(r#"{"disposable":false}"#).unwrap());
    }

    #[test]
    fn test_parse_bad_flag() {
        assert!(matches!(
            parse_disposable_flag(r#"{"disposable":"maybe"}"#),
            Err(OracleError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_disposable_flag(r#"{"other":1}"#),
            Err(OracleError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let config = RealtimeOracleConfig {
            // Nothing listens here; a request would fail.
            url: "http://127.0.0.1:9/".to_string(),
            ..RealtimeOracleConfig::default()
        };
        let oracle = HttpDisposableOracle::new(config).unwrap();
        oracle
            .cache
            .insert("tempmail.dev".to_string(), true, Duration::from_secs(60));

        assert!(oracle.is_disposable("x@tempmail.dev").await.unwrap());
        assert_eq!(oracle.cached("tempmail.dev"), Some(true));
        assert_eq!(oracle.cached("example.com"), None);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_recoverable() {
        let config = RealtimeOracleConfig {
            url: "http://127.0.0.1:9/".to_string(),
            timeout_ms: 500,
            ..RealtimeOracleConfig::default()
        };
        let oracle = HttpDisposableOracle::new(config).unwrap();

        let err = oracle.is_disposable("x@example.com").await.unwrap_err();
        assert_eq!(err.severity(), crate::oracles::Severity::Recoverable);
        assert_eq!(oracle.cached("example.com"), None);
    }
}
