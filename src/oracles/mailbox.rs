//! Deep mailbox verification backend (Reacher-compatible API).

use super::{MailboxOracle, MailboxReport, OracleError};
use crate::config::MailboxOracleConfig;
use crate::verdict::Reachability;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct VerifyBody<'a> {
    to_email: &'a str,
}

/// Backend response. Missing sections default to the pessimistic value.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    is_reachable: String,
    #[serde(default)]
    syntax: SyntaxSection,
    #[serde(default)]
    mx: MxSection,
    #[serde(default)]
    smtp: SmtpSection,
    #[serde(default)]
    misc: MiscSection,
}

#[derive(Debug, Default, Deserialize)]
struct SyntaxSection {
    #[serde(default)]
    is_valid_syntax: bool,
}

#[derive(Debug, Default, Deserialize)]
struct MxSection {
    #[serde(default)]
    accepts_mail: bool,
}

#[derive(Debug, Default, Deserialize)]
struct SmtpSection {
    #[serde(default)]
    can_connect_smtp: bool,
    #[serde(default)]
    has_full_inbox: bool,
    #[serde(default)]
    is_catch_all: bool,
    #[serde(default)]
    is_deliverable: bool,
    #[serde(default)]
    is_disabled: bool,
}

#[derive(Debug, Default, Deserialize)]
struct MiscSection {
    #[serde(default)]
    is_disposable: bool,
}

impl From<VerifyResponse> for MailboxReport {
    fn from(r: VerifyResponse) -> Self {
        MailboxReport {
            reachability: Reachability::from_label(&r.is_reachable),
            syntax_valid: r.syntax.is_valid_syntax,
            accepts_mail: r.mx.accepts_mail,
            can_connect: r.smtp.can_connect_smtp,
            has_full_inbox: r.smtp.has_full_inbox,
            is_catch_all: r.smtp.is_catch_all,
            is_deliverable: r.smtp.is_deliverable,
            is_disabled: r.smtp.is_disabled,
            disposable: r.misc.is_disposable,
        }
    }
}

fn parse_verify_response(body: &str) -> Result<MailboxReport, OracleError> {
    let response: VerifyResponse = serde_json::from_str(body)
        .map_err(|e| OracleError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
    Ok(response.into())
}

/// Mailbox oracle over HTTP.
pub struct HttpMailboxOracle {
    config: MailboxOracleConfig,
    client: Client,
}

impl HttpMailboxOracle {
    pub fn new(config: MailboxOracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn is_configured(&self) -> bool {
        self.config.endpoint().is_some()
    }
}

#[async_trait]
impl MailboxOracle for HttpMailboxOracle {
    async fn verify(&self, email: &str) -> Result<MailboxReport, OracleError> {
        let url = self.config.endpoint().ok_or_else(|| {
            OracleError::NotConfigured("mailbox_oracle.url is not set".to_string())
        })?;

        debug!(email = %email, "Querying mailbox oracle");

        let mut request = self.client.post(url).json(&VerifyBody { to_email: email });
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.header("Authorization", key);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            warn!(status = %status, "Mailbox oracle rejected credentials");
            return Err(OracleError::InvalidResponse(format!(
                "credentials rejected (HTTP {})",
                status
            )));
        }

        if !status.is_success() {
            let body = response.text().await?;
            return Err(OracleError::InvalidResponse(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let report = parse_verify_response(&body)?;

        debug!(
            email = %email,
            reachability = %report.reachability,
            can_connect = report.can_connect,
            deliverable = report.is_deliverable,
            "Mailbox oracle answered"
        );

        Ok(report)
    }

    fn name(&self) -> &str {
        "mailbox"
    }
}
