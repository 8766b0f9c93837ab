//! Two-phase scheduling of a rule set's entries
//!
//! Entries that neither read their target nor depend on files written by
//! other entries run together on the rayon pool. Everything else runs
//! afterwards, one entry at a time in declaration order.

use log::debug;
use rayon::prelude::*;

use super::entry::{Outcome, RuleEntry};
use super::ApplyContext;
use crate::error::Error;

/// Split entries into (parallel, sequential) batches, keeping their order
pub fn partition(entries: &[RuleEntry]) -> (Vec<&RuleEntry>, Vec<&RuleEntry>) {
    entries.iter().partition(|entry| entry.is_concurrent())
}

/// Run every entry and return their outcomes in declaration order of each
/// batch (parallel batch first).
///
/// All parallel entries run to completion even when some fail; their
/// failures are returned together and the sequential batch never starts.
/// The sequential batch stops at its first failure.
pub fn run(entries: &[RuleEntry], ctx: &ApplyContext) -> std::result::Result<Vec<Outcome>, Vec<Error>> {
    let (parallel, sequential) = partition(entries);
    debug!(
        "Scheduling {} parallel and {} sequential entries",
        parallel.len(),
        sequential.len()
    );

    let results: Vec<_> = parallel.par_iter().map(|entry| entry.apply(ctx)).collect();

    let mut outcomes = Vec::with_capacity(entries.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => failures.push(err),
        }
    }
    if !failures.is_empty() {
        return Err(failures);
    }

    for entry in sequential {
        outcomes.push(entry.apply(ctx).map_err(|err| vec![err])?);
    }
    Ok(outcomes)
}
