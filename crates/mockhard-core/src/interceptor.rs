//! Transparent recording wrapper around a bound real object.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ContractError;
use crate::fake::Fake;
use crate::real::{Capabilities, RealObject};
use crate::value::{Value, signature};

pub(crate) type SharedReal = Arc<Mutex<Box<dyn RealObject>>>;

/// One observed, successful invocation of a real method.
#[derive(Debug, Clone)]
pub struct RealCallRecord {
    pub method: String,
    pub args: Vec<Value>,
    pub return_value: Value,
}

impl fmt::Display for RealCallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&signature(&self.method, &self.args, Some(&self.return_value)))
    }
}

/// Handle tests use in place of the real object.
///
/// Every successful call is appended to the owning fake's call log, whether or
/// not the method is mocked. Return values and failures of the real object
/// come back unchanged; failed calls are not recorded. Handles from earlier
/// bindings keep recording into the same fake after a rebind.
#[derive(Clone)]
pub struct WrappedReal {
    real: SharedReal,
    fake: Fake,
}

impl WrappedReal {
    pub(crate) fn new(real: SharedReal, fake: Fake) -> Self {
        Self { real, fake }
    }

    /// Call the real method and record the observation.
    ///
    /// Under the eager policy a call to a mocked method that matches no
    /// behaviour fails with `RealBehaviourMismatch` after being recorded.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value, ContractError> {
        // The real object is released before the fake is locked.
        let return_value = self.real.lock().call(method, args)?;
        self.fake.record_real_call(RealCallRecord {
            method: method.to_string(),
            args: args.to_vec(),
            return_value: return_value.clone(),
        })?;
        Ok(return_value)
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.real.lock().capabilities()
    }

    /// The fake this handle records into.
    #[must_use]
    pub fn fake(&self) -> &Fake {
        &self.fake
    }

    /// Both handles drive the same real object.
    #[must_use]
    pub fn same_real(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.real, &other.real)
    }
}

impl fmt::Debug for WrappedReal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedReal")
            .field("fake", &self.fake.name())
            .finish_non_exhaustive()
    }
}
