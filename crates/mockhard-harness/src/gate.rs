//! Suite-end verification gate.
//!
//! A test suite calls the gate once, after every test that touches the
//! context has run. `run` reports on every fake; `enforce` is the fail-fast
//! variant that surfaces the first contract failure as an error.

use mockhard_core::VerificationContext;
use mockhard_core::structured_log::now_utc;

use crate::error::HarnessError;
use crate::report::GateReport;

/// Runs the end-of-suite check over a verification context.
#[derive(Debug, Clone)]
pub struct SuiteGate {
    title: String,
}

impl Default for SuiteGate {
    fn default() -> Self {
        Self::new("mockhard contract report")
    }
}

impl SuiteGate {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Verify every fake and report on all of them.
    pub fn run(&self, ctx: &VerificationContext) -> Result<GateReport, HarnessError> {
        let verdicts = ctx.verify_each();
        ctx.flush_log().map_err(HarnessError::Flush)?;
        let config = ctx.config();
        Ok(GateReport::from_verdicts(
            self.title.clone(),
            config.run_id.clone(),
            config.policy.as_str(),
            now_utc(),
            verdicts,
        ))
    }

    /// Verify fakes in name order and fail on the first broken contract.
    pub fn enforce(&self, ctx: &VerificationContext) -> Result<(), HarnessError> {
        let outcome = ctx.verify_all();
        ctx.flush_log().map_err(HarnessError::Flush)?;
        outcome.map_err(HarnessError::from)
    }
}
