//! Bounded-concurrency batch validation.
//!
//! At most `concurrency` validations are in flight. A new one is spawned each
//! time one finishes, and every result is written to the slot of its input
//! index, so output order always matches input order.

use crate::config::FatalPolicy;
use crate::validator::{normalize_email, EmailValidator, ValidateOptions, ValidationError};
use crate::verdict::{Reachability, ValidationResult};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Tallies over a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    /// Invalid for a reason other than being disposable.
    pub invalid: usize,
    pub disposable: usize,
    /// Deep results whose reachability was unknown.
    pub unknown: usize,
    /// Items that ended in an isolated error.
    pub errors: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[Result<ValidationResult, ValidationError>]) -> Self {
        let mut summary = BatchSummary {
            total: results.len(),
            ..BatchSummary::default()
        };

        for result in results {
            let Ok(result) = result else {
                summary.errors += 1;
                continue;
            };

            if result.valid {
                summary.valid += 1;
            } else if result.disposable {
                summary.disposable += 1;
            } else {
                summary.invalid += 1;
            }

            if result.reachability() == Some(Reachability::Unknown) {
                summary.unknown += 1;
            }
        }

        summary
    }
}

/// Ordered results plus summary.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<Result<ValidationResult, ValidationError>>,
    pub summary: BatchSummary,
}

/// Runs many validations against one validator.
pub struct BatchExecutor {
    validator: Arc<EmailValidator>,
    concurrency: usize,
    fatal_policy: FatalPolicy,
}

impl BatchExecutor {
    /// A concurrency of zero is treated as one.
    pub fn new(validator: Arc<EmailValidator>, concurrency: usize) -> Self {
        Self {
            validator,
            concurrency: concurrency.max(1),
            fatal_policy: FatalPolicy::default(),
        }
    }

    pub fn with_fatal_policy(mut self, policy: FatalPolicy) -> Self {
        self.fatal_policy = policy;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn spawn(
        &self,
        join_set: &mut JoinSet<(usize, Result<ValidationResult, ValidationError>)>,
        index: usize,
        address: String,
        options: &Arc<ValidateOptions>,
    ) {
        let validator = Arc::clone(&self.validator);
        let options = Arc::clone(options);

        join_set.spawn(async move {
            let result = validator.validate(&address, &options).await;
            (index, result)
        });
    }

    /// Validate every address.
    ///
    /// With [`FatalPolicy::AbortBatch`] the first configuration error cancels
    /// the remaining work and is returned. With [`FatalPolicy::Isolate`] it is
    /// recorded in that item's slot.
    pub async fn run(
        &self,
        addresses: &[String],
        options: &ValidateOptions,
    ) -> Result<BatchReport, ValidationError> {
        let total = addresses.len();
        info!(
            total,
            concurrency = self.concurrency,
            policy = ?self.fatal_policy,
            "Starting batch validation"
        );

        let options = Arc::new(options.clone());
        let mut slots: Vec<Option<Result<ValidationResult, ValidationError>>> =
            (0..total).map(|_| None).collect();
        let mut join_set = JoinSet::new();
        let mut pending = addresses.iter().cloned().enumerate();

        for (index, address) in pending.by_ref().take(self.concurrency) {
            self.spawn(&mut join_set, index, address, &options);
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, Err(e))) if self.fatal_policy == FatalPolicy::AbortBatch => {
                    warn!(index, error = %e, "Aborting batch on configuration error");
                    join_set.abort_all();
                    return Err(e);
                }
                Ok((index, result)) => {
                    debug!(index, "Batch item finished");
                    slots[index] = Some(result);
                }
                Err(e) => {
                    warn!(error = %e, "Validation task did not complete");
                }
            }

            if let Some((index, address)) = pending.next() {
                self.spawn(&mut join_set, index, address, &options);
            }
        }

        let results: Vec<_> = slots
            .into_iter()
            .zip(addresses)
            .map(|(slot, address)| {
                slot.unwrap_or_else(|| Ok(ValidationResult::fail_open(normalize_email(address))))
            })
            .collect();
        let summary = BatchSummary::from_results(&results);

        info!(
            total = summary.total,
            valid = summary.valid,
            invalid = summary.invalid,
            disposable = summary.disposable,
            unknown = summary.unknown,
            "Batch validation complete"
        );

        Ok(BatchReport { results, summary })
    }
}

/// Validate a batch with the default fatal policy.
pub async fn validate_many(
    validator: Arc<EmailValidator>,
    addresses: &[String],
    options: &ValidateOptions,
    concurrency: usize,
) -> Result<BatchReport, ValidationError> {
    BatchExecutor::new(validator, concurrency)
        .run(addresses, options)
        .await
}
