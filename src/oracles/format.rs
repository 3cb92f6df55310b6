//! HTTP format/MX oracle.

use super::{FormatOracle, FormatReport, FormatRequest, OracleError};
use crate::config::FormatOracleConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormatCheckBody<'a> {
    email: &'a str,
    check_mx: bool,
    check_disposable: bool,
    /// Milliseconds.
    timeout: u64,
}

/// Response body.
#[derive(Debug, Deserialize)]
struct FormatCheckResponse {
    valid: bool,
    #[serde(default)]
    validators: Validators,
    #[serde(default)]
    provider: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Validators {
    #[serde(default)]
    regex: Option<Check>,
    #[serde(default)]
    mx: Option<Check>,
    #[serde(default)]
    disposable: Option<Check>,
}

#[derive(Debug, Deserialize)]
struct Check {
    valid: bool,
}

impl From<FormatCheckResponse> for FormatReport {
    fn from(response: FormatCheckResponse) -> Self {
        let validators = response.validators;
        // Without a regex verdict the overall flag speaks for the format.
        let format_valid = validators
            .regex
            .map_or(response.valid, |check| check.valid);

        FormatReport {
            format_valid,
            has_mx: validators.mx.map_or(true, |check| check.valid),
            disposable: validators.disposable.is_some_and(|check| !check.valid),
            provider: response.provider,
        }
    }
}

/// Parse a response body.
fn parse_format_response(body: &str) -> Result<FormatReport, OracleError> {
    let response: FormatCheckResponse = serde_json::from_str(body)
        .map_err(|e| OracleError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
    Ok(response.into())
}

/// Format/MX oracle over HTTP.
pub struct HttpFormatOracle {
    config: FormatOracleConfig,
    client: Client,
}

impl HttpFormatOracle {
    pub fn new(config: FormatOracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl FormatOracle for HttpFormatOracle {
    async fn check(&self, request: &FormatRequest) -> Result<FormatReport, OracleError> {
        let body = FormatCheckBody {
            email: &request.email,
            check_mx: request.check_mx,
            check_disposable: request.check_disposable,
            timeout: request.timeout.as_millis() as u64,
        };

        debug!(email = %request.email, "Querying format oracle");

        let response = self
            .client
            .post(&self.config.url)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(OracleError::InvalidResponse(format!("HTTP {}", status)));
        }

        let text = response.text().await?;
        let report = parse_format_response(&text)?;

        debug!(
            email = %request.email,
            format_valid = report.format_valid,
            has_mx = report.has_mx,
            disposable = report.disposable,
            provider = ?report.provider,
            "Format oracle answered"
        );

        Ok(report)
    }

    fn name(&self) -> &str {
        "format"
    }
}
