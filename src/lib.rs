//! Email Reputation Agent for Zentinel.
//!
//! Decides whether an email address is worth accepting by combining local
//! disposable-domain blocklists with remote format/MX, realtime disposable and
//! deep mailbox oracles into a single verdict.
//!
//! # Features
//!
//! - **Local Blocklists** - Remote public list, scraped provider pages, and a
//!   discovered-domain file, all served from in-memory snapshots
//! - **Ancestor Matching** - `xyz.tempmail.com` is caught by `tempmail.com`
//! - **Format/MX Oracle** - Syntax, MX and provider checks over HTTP
//! - **Realtime Disposable Oracle** - Per-address lookup with a domain cache
//! - **Deep Verification** - SMTP-level mailbox checks with a result cache
//! - **Fail-Open** - Transient backend trouble never blocks an address
//! - **Batch Validation** - Bounded concurrency with order-stable output
//!
//! # Example Configuration
//!
//! ```yaml
//! settings:
//!   concurrency: 5
//!   fatal_policy: abort_batch
//!
//! format_oracle:
//!   url: "http://127.0.0.1:8787/check"
//!
//! mailbox_oracle:
//!   url: "${REACHER_URL}"
//!   api_key: "${REACHER_API_KEY}"
//!
//! cache:
//!   backend: memory
//!   ttl:
//!     safe: 604800
//! ```

pub mod batch;
pub mod cache;
pub mod config;
pub mod oracles;
pub mod reputation;
pub mod validator;
pub mod verdict;

pub use batch::{validate_many, BatchExecutor, BatchReport, BatchSummary};
pub use config::Config;
pub use reputation::ReputationStore;
pub use validator::{EmailValidator, ValidateOptions, ValidationError};
pub use verdict::{Reachability, Reason, ValidationResult};
