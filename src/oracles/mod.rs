//! External oracles consulted after the local blocklists.

pub mod format;
pub mod mailbox;
pub mod realtime;

use crate::verdict::Reachability;
use async_trait::async_trait;
use std::time::Duration;

/// How an oracle failure is handled by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Surfaced to the caller.
    Fatal,
    /// Converted to a fail-open verdict.
    Recoverable,
}

/// Error from an oracle.
#[derive(Debug)]
pub enum OracleError {
    /// HTTP request failed.
    Http(reqwest::Error),
    /// Timeout.
    Timeout,
    /// Non-success status or unparsable body.
    InvalidResponse(String),
    /// The oracle has no backend configured.
    NotConfigured(String),
    /// Other error.
    Other(String),
}

impl OracleError {
    /// Only a missing backend configuration is fatal.
    pub fn severity(&self) -> Severity {
        match self {
            OracleError::NotConfigured(_) => Severity::Fatal,
            _ => Severity::Recoverable,
        }
    }
}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleError::Http(e) => write!(f, "HTTP error: {}", e),
            OracleError::Timeout => write!(f, "Request timed out"),
            OracleError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            OracleError::NotConfigured(msg) => write!(f, "Not configured: {}", msg),
            OracleError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for OracleError {}

impl From<reqwest::Error> for OracleError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            OracleError::Timeout
        } else {
            OracleError::Http(e)
        }
    }
}

impl From<tokio::time::error::Elapsed> for OracleError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        OracleError::Timeout
    }
}

/// Parameters of a format/MX check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRequest {
    pub email: String,
    pub check_mx: bool,
    pub check_disposable: bool,
    pub timeout: Duration,
}

/// Answer of a format/MX check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatReport {
    pub format_valid: bool,
    pub has_mx: bool,
    /// Domain is on the oracle's own disposable list.
    pub disposable: bool,
    pub provider: Option<String>,
}

impl FormatReport {
    /// A report that finds nothing wrong.
    pub fn clean() -> Self {
        Self {
            format_valid: true,
            has_mx: true,
            disposable: false,
            provider: None,
        }
    }
}

/// Normalized answer of a deep mailbox verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxReport {
    pub reachability: Reachability,
    pub syntax_valid: bool,
    pub accepts_mail: bool,
    pub can_connect: bool,
    pub has_full_inbox: bool,
    pub is_catch_all: bool,
    pub is_deliverable: bool,
    pub is_disabled: bool,
    pub disposable: bool,
}

/// Format + MX + disposable-list oracle.
#[async_trait]
pub trait FormatOracle: Send + Sync {
    async fn check(&self, request: &FormatRequest) -> Result<FormatReport, OracleError>;

    /// Oracle name for logging.
    fn name(&self) -> &str;
}

/// Per-address realtime disposable lookup.
#[async_trait]
pub trait DisposableOracle: Send + Sync {
    async fn is_disposable(&self, email: &str) -> Result<bool, OracleError>;

    fn name(&self) -> &str;
}

/// SMTP-level mailbox existence check.
#[async_trait]
pub trait MailboxOracle: Send + Sync {
    async fn verify(&self, email: &str) -> Result<MailboxReport, OracleError>;

    fn name(&self) -> &str;
}

/// Domain part of a normalized address.
pub(crate) fn domain_of(email: &str) -> &str {
    email.rsplit_once('@').map(|(_, d)| d).unwrap_or_default()
}
