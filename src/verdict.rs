//! Validation verdicts.
//!
//! Every validation ends in exactly one [`Outcome`]. The outcome decides the
//! `valid` flag and the [`Reason`] carried by the [`ValidationResult`].

use crate::oracles::MailboxReport;
use serde::{Deserialize, Serialize};

/// Confidence of the deep-verification backend in mailbox existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    Safe,
    Risky,
    Invalid,
    Unknown,
}

impl Reachability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reachability::Safe => "safe",
            Reachability::Risky => "risky",
            Reachability::Invalid => "invalid",
            Reachability::Unknown => "unknown",
        }
    }

    /// Parse the backend's label. Anything unrecognized is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "safe" => Reachability::Safe,
            "risky" => Reachability::Risky,
            "invalid" => Reachability::Invalid,
            _ => Reachability::Unknown,
        }
    }
}

impl std::fmt::Display for Reachability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an address was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    InvalidSyntax,
    Disposable,
    NoMx,
    MailboxNotFound,
    MailboxFull,
    MailboxDisabled,
    CatchAll,
    SmtpError,
}

/// Terminal state of the validation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    SyntaxFail,
    Disposable,
    NoMx,
    ValidShallow,
    MailboxNotFound,
    MailboxFull,
    MailboxDisabled,
    CatchAll,
    SmtpError,
    ValidDeep,
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::ValidShallow | Outcome::ValidDeep)
    }

    /// Rejection reason; `None` exactly for the valid outcomes.
    pub fn reason(&self) -> Option<Reason> {
        match self {
            Outcome::SyntaxFail => Some(Reason::InvalidSyntax),
            Outcome::Disposable => Some(Reason::Disposable),
            Outcome::NoMx => Some(Reason::NoMx),
            Outcome::MailboxNotFound => Some(Reason::MailboxNotFound),
            Outcome::MailboxFull => Some(Reason::MailboxFull),
            Outcome::MailboxDisabled => Some(Reason::MailboxDisabled),
            Outcome::CatchAll => Some(Reason::CatchAll),
            Outcome::SmtpError => Some(Reason::SmtpError),
            Outcome::ValidShallow | Outcome::ValidDeep => None,
        }
    }
}

/// Deep verification details.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SmtpResult {
    pub reachability: Reachability,
    pub can_connect: bool,
    pub is_deliverable: bool,
    pub is_catch_all: bool,
}

/// Final verdict for one address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ValidationResult {
    /// Normalized address.
    pub email: String,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
    pub disposable: bool,
    pub mx: bool,
    /// Present only when deep verification ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp: Option<SmtpResult>,
    #[serde(default)]
    pub cached: bool,
}

impl ValidationResult {
    /// Build a result from a terminal state.
    ///
    /// `mx` starts out true for everything past the MX check and false for
    /// the states reached before it (or because of it).
    pub fn from_outcome(email: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            email: email.into(),
            valid: outcome.is_valid(),
            reason: outcome.reason(),
            disposable: outcome == Outcome::Disposable,
            mx: !matches!(
                outcome,
                Outcome::SyntaxFail | Outcome::Disposable | Outcome::NoMx
            ),
            smtp: None,
            cached: false,
        }
    }

    /// Optimistic verdict used when a collaborator could not answer.
    pub fn fail_open(email: impl Into<String>) -> Self {
        Self::from_outcome(email, Outcome::ValidShallow)
    }

    /// Verdict for a completed deep verification.
    pub fn from_mailbox(email: impl Into<String>, report: &MailboxReport) -> Self {
        let outcome = classify_mailbox(report);
        let mut result = Self::from_outcome(email, outcome);
        result.mx = report.accepts_mail;
        result.smtp = Some(SmtpResult {
            reachability: report.reachability,
            can_connect: report.can_connect,
            is_deliverable: report.is_deliverable,
            is_catch_all: report.is_catch_all,
        });
        result
    }

    /// Override the MX flag.
    pub fn with_mx(mut self, mx: bool) -> Self {
        self.mx = mx;
        self
    }

    /// Mark as served from the result cache.
    pub fn from_cache(mut self) -> Self {
        self.cached = true;
        self
    }

    /// Reachability reported by deep verification, if it ran.
    pub fn reachability(&self) -> Option<Reachability> {
        self.smtp.as_ref().map(|s| s.reachability)
    }
}

/// A precedence rule: when `applies` holds for a report, the verdict is `outcome`.
pub struct MailboxRule {
    pub name: &'static str,
    pub applies: fn(&MailboxReport) -> bool,
    pub outcome: Outcome,
}

fn is_disposable(r: &MailboxReport) -> bool {
    r.disposable
}

fn rejects_mail(r: &MailboxReport) -> bool {
    !r.accepts_mail
}

fn cannot_connect(r: &MailboxReport) -> bool {
    !r.can_connect
}

fn full_inbox(r: &MailboxReport) -> bool {
    r.has_full_inbox
}

fn disabled(r: &MailboxReport) -> bool {
    r.is_disabled
}

fn catch_all(r: &MailboxReport) -> bool {
    r.is_catch_all
}

fn not_deliverable(r: &MailboxReport) -> bool {
    !r.is_deliverable
}

/// Deep-verification precedence, first match wins. No match means `ValidDeep`.
pub const MAILBOX_PRECEDENCE: &[MailboxRule] = &[
    MailboxRule { name: "disposable", applies: is_disposable, outcome: Outcome::Disposable },
    MailboxRule { name: "rejects_mail", applies: rejects_mail, outcome: Outcome::NoMx },
    MailboxRule { name: "cannot_connect", applies: cannot_connect, outcome: Outcome::SmtpError },
    MailboxRule { name: "full_inbox", applies: full_inbox, outcome: Outcome::MailboxFull },
    MailboxRule { name: "disabled", applies: disabled, outcome: Outcome::MailboxDisabled },
    MailboxRule { name: "catch_all", applies: catch_all, outcome: Outcome::CatchAll },
    MailboxRule { name: "not_deliverable", applies: not_deliverable, outcome: Outcome::MailboxNotFound },
];

/// Map a deep-verification report to a terminal state.
pub fn classify_mailbox(report: &MailboxReport) -> Outcome {
    MAILBOX_PRECEDENCE
        .iter()
        .find(|rule| (rule.applies)(report))
        .map(|rule| rule.outcome)
        .unwrap_or(Outcome::ValidDeep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deliverable() -> MailboxReport {
        MailboxReport {
            reachability: Reachability::Safe,
            syntax_valid: true,
            accepts_mail: true,
            can_connect: true,
            has_full_inbox: false,
            is_catch_all: false,
            is_deliverable: true,
            is_disabled: false,
            disposable: false,
        }
    }

    #[test]
    fn test_reason_absent_iff_valid() {
        let all = [
            Outcome::SyntaxFail,
            Outcome::Disposable,
            Outcome::NoMx,
            Outcome::ValidShallow,
            Outcome::MailboxNotFound,
            Outcome::MailboxFull,
            Outcome::MailboxDisabled,
            Outcome::CatchAll,
            Outcome::SmtpError,
            Outcome::ValidDeep,
        ];
        for outcome in all {
            assert_eq!(outcome.is_valid(), outcome.reason().is_none(), "{:?}", outcome);
        }
    }

    #[test]
    fn test_clean_report_is_valid_deep() {
        assert_eq!(classify_mailbox(&deliverable()), Outcome::ValidDeep);
    }

    #[test]
    fn test_disposable_beats_everything() {
        let report = MailboxReport {
            disposable: true,
            accepts_mail: false,
            can_connect: false,
            has_full_inbox: true,
            is_deliverable: false,
            ..deliverable()
        };
        assert_eq!(classify_mailbox(&report), Outcome::Disposable);
    }

    #[test]
    fn test_precedence_chain() {
        let mut report = MailboxReport {
            accepts_mail: false,
            can_connect: false,
            has_full_inbox: true,
            is_disabled: true,
            is_catch_all: true,
            is_deliverable: false,
            ..deliverable()
        };
        assert_eq!(classify_mailbox(&report), Outcome::NoMx);

        report.accepts_mail = true;
        assert_eq!(classify_mailbox(&report), Outcome::SmtpError);

        report.can_connect = true;
        assert_eq!(classify_mailbox(&report), Outcome::MailboxFull);

        report.has_full_inbox = false;
        assert_eq!(classify_mailbox(&report), Outcome::MailboxDisabled);

        report.is_disabled = false;
        assert_eq!(classify_mailbox(&report), Outcome::CatchAll);

        report.is_catch_all = false;
        assert_eq!(classify_mailbox(&report), Outcome::MailboxNotFound);

        report.is_deliverable = true;
        assert_eq!(classify_mailbox(&report), Outcome::ValidDeep);
    }

    #[test]
    fn test_precedence_table_order() {
        let names: Vec<&str> = MAILBOX_PRECEDENCE.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "disposable",
                "rejects_mail",
                "cannot_connect",
                "full_inbox",
                "disabled",
                "catch_all",
                "not_deliverable",
            ]
        );
    }

    #[test]
    fn test_from_mailbox_carries_smtp() {
        let report = MailboxReport {
            reachability: Reachability::Risky,
            is_catch_all: true,
            ..deliverable()
        };
        let result = ValidationResult::from_mailbox("a@example.com", &report);
        assert!(!result.valid);
        assert_eq!(result.reason, Some(Reason::CatchAll));
        assert!(result.mx);
        let smtp = result.smtp.unwrap();
        assert_eq!(smtp.reachability, Reachability::Risky);
        assert!(smtp.is_catch_all);
    }

    #[test]
    fn test_fail_open_shape() {
        let result = ValidationResult::fail_open("a@example.com");
        assert!(result.valid);
        assert!(result.reason.is_none());
        assert!(!result.disposable);
        assert!(result.mx);
        assert!(result.smtp.is_none());
        assert!(!result.cached);
    }

    #[test]
    fn test_serialized_shape() {
        let result = ValidationResult::from_outcome("a@tempmail.com", Outcome::Disposable);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["reason"], "disposable");
        assert_eq!(json["disposable"], true);
        assert!(json.get("smtp").is_none());

        let back: ValidationResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_reachability_labels() {
        assert_eq!(Reachability::from_label("SAFE"), Reachability::Safe);
        assert_eq!(Reachability::from_label("invalid"), Reachability::Invalid);
        assert_eq!(Reachability::from_label("whatever"), Reachability::Unknown);
    }
}
