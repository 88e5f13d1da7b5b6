//! Two-phase verification of a fake against its real counterpart.
//!
//! Phase one replays the real-call log against the behaviour tables, marking
//! the first behaviour each real call matches as confirmed. Phase two checks
//! that the real object declares every mocked method and that every behaviour
//! the fake answered was confirmed. The outcome depends only on the log and
//! the tables at verification time, never on how fake and real use were
//! interleaved.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::behaviour::Mock;
use crate::error::ContractError;
use crate::fake::FakeState;
use crate::interceptor::RealCallRecord;
use crate::real::Capabilities;

/// Counters from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Real calls examined.
    pub examined: usize,
    /// Calls to methods the fake never mocked.
    pub unmocked: usize,
    /// Calls that confirmed a behaviour.
    pub confirmed: usize,
    /// Calls to mocked methods that matched no behaviour.
    pub unmatched: usize,
}

/// Replay `call_log` in order. A call confirms at most one behaviour: the
/// first, in insertion order, whose args and return value both match.
pub fn reconcile(call_log: &[RealCallRecord], mocks: &BTreeMap<String, Mock>) -> ReconcileStats {
    let mut stats = ReconcileStats::default();
    for record in call_log {
        stats.examined += 1;
        let Some(mock) = mocks.get(&record.method) else {
            stats.unmocked += 1;
            continue;
        };
        if mock.confirm(&record.args, &record.return_value) {
            stats.confirmed += 1;
        } else {
            stats.unmatched += 1;
        }
    }
    stats
}

/// Every mocked method must be declared by the real object.
pub fn check_completeness<'a>(
    fake: &str,
    mocked: impl IntoIterator<Item = &'a str>,
    capabilities: &Capabilities,
) -> Result<(), ContractError> {
    match mocked.into_iter().find(|m| !capabilities.contains(m)) {
        Some(method) => Err(ContractError::RealMethodMissing {
            fake: fake.to_string(),
            method: method.to_string(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn verify_state(fake: &str, state: &FakeState) -> Result<ReconcileStats, ContractError> {
    let Some(binding) = &state.binding else {
        return Err(ContractError::MissingRealBinding {
            fake: fake.to_string(),
        });
    };

    let stats = reconcile(&state.call_log, &state.mocks);
    // Completeness first: a missing method is reported as such even when the
    // fake also has unconfirmed behaviours for it.
    check_completeness(
        fake,
        state.mocks.keys().map(String::as_str),
        &binding.capabilities,
    )?;
    for mock in state.mocks.values() {
        mock.verify_usage()?;
    }
    Ok(stats)
}
