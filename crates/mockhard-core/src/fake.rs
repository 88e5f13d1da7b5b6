//! Fakes: named stand-ins holding behaviour tables, an optional real binding,
//! and the log of calls observed on that real object.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::behaviour::{BehaviourTable, Mock};
use crate::config::InterceptionPolicy;
use crate::error::ContractError;
use crate::interceptor::{RealCallRecord, SharedReal, WrappedReal};
use crate::real::{Capabilities, RealObject};
use crate::structured_log::{EventLog, LogEntry, LogLevel, Outcome, events};
use crate::value::Value;
use crate::verifier;

pub(crate) struct Binding {
    pub(crate) real: SharedReal,
    pub(crate) capabilities: Capabilities,
    pub(crate) generation: u64,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("capabilities", &self.capabilities)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub(crate) mocks: BTreeMap<String, Mock>,
    pub(crate) binding: Option<Binding>,
    pub(crate) call_log: Vec<RealCallRecord>,
}

#[derive(Debug)]
struct FakeInner {
    name: String,
    policy: InterceptionPolicy,
    events: EventLog,
    state: Mutex<FakeState>,
}

/// Shared handle to a named fake.
///
/// Clones refer to the same fake; [`Fake::ptr_eq`] tests identity.
#[derive(Debug, Clone)]
pub struct Fake {
    inner: Arc<FakeInner>,
}

impl Fake {
    /// A standalone fake using the deferred policy and no event log.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, InterceptionPolicy::Deferred, EventLog::disabled())
    }

    pub(crate) fn with_settings(
        name: impl Into<String>,
        policy: InterceptionPolicy,
        events: EventLog,
    ) -> Self {
        Self {
            inner: Arc::new(FakeInner {
                name: name.into(),
                policy,
                events,
                state: Mutex::new(FakeState::default()),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn policy(&self) -> InterceptionPolicy {
        self.inner.policy
    }

    /// Get or create the behaviour table for `method`.
    pub fn mock_method(&self, method: &str) -> Mock {
        let mut state = self.inner.state.lock();
        state
            .mocks
            .entry(method.to_string())
            .or_insert_with(|| {
                Mock::new(
                    BehaviourTable::new(self.inner.name.clone(), method),
                    self.inner.events.clone(),
                )
            })
            .clone()
    }

    /// Call `method` on the fake, as the code under test would.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value, ContractError> {
        let mock = self.inner.state.lock().mocks.get(method).cloned();
        match mock {
            Some(mock) => mock.invoke(args),
            None => {
                let err = ContractError::UnmockedCall {
                    method: method.to_string(),
                    args: args.to_vec(),
                    known: Vec::new(),
                };
                self.inner.events.record(
                    LogEntry::event(LogLevel::Warn, events::UNMOCKED_CALL)
                        .with_fake(self.name())
                        .with_method(method)
                        .with_error(&err),
                );
                Err(err)
            }
        }
    }

    /// Bind the real implementation and return the recording handle.
    ///
    /// Rebinding replaces the previous binding; the call log is kept.
    pub fn bind_real<R: RealObject + 'static>(&self, real: R) -> WrappedReal {
        let capabilities = real.capabilities();
        let boxed: Box<dyn RealObject> = Box::new(real);
        let shared: SharedReal = Arc::new(Mutex::new(boxed));
        let generation = {
            let mut state = self.inner.state.lock();
            let generation = state.binding.as_ref().map_or(1, |b| b.generation + 1);
            state.binding = Some(Binding {
                real: Arc::clone(&shared),
                capabilities: capabilities.clone(),
                generation,
            });
            generation
        };
        self.inner.events.record(
            LogEntry::event(LogLevel::Info, events::REAL_BOUND)
                .with_fake(self.name())
                .with_details(serde_json::json!({
                    "generation": generation,
                    "capabilities": capabilities.iter().collect::<Vec<_>>(),
                })),
        );
        WrappedReal::new(shared, self.clone())
    }

    /// A fresh handle onto the current binding, if any.
    #[must_use]
    pub fn bound_real(&self) -> Option<WrappedReal> {
        let state = self.inner.state.lock();
        state
            .binding
            .as_ref()
            .map(|b| WrappedReal::new(Arc::clone(&b.real), self.clone()))
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.state.lock().binding.is_some()
    }

    /// Snapshot of the calls observed on the real object, in call order.
    #[must_use]
    pub fn real_calls(&self) -> Vec<RealCallRecord> {
        self.inner.state.lock().call_log.clone()
    }

    /// Names of every mocked method, sorted.
    #[must_use]
    pub fn mocked_methods(&self) -> Vec<String> {
        self.inner.state.lock().mocks.keys().cloned().collect()
    }

    /// Reconcile the real-call log against the behaviour tables and check
    /// the fake against its real counterpart.
    pub fn verify(&self) -> Result<(), ContractError> {
        let outcome = {
            let state = self.inner.state.lock();
            verifier::verify_state(self.name(), &state)
        };
        match &outcome {
            Ok(stats) => self.inner.events.record(
                LogEntry::event(LogLevel::Info, events::VERIFY_PASS)
                    .with_fake(self.name())
                    .with_policy(self.inner.policy.as_str())
                    .with_outcome(Outcome::Pass)
                    .with_details(serde_json::to_value(stats).unwrap_or_default()),
            ),
            Err(err) => self.inner.events.record(
                LogEntry::event(LogLevel::Error, events::VERIFY_FAIL)
                    .with_fake(self.name())
                    .with_policy(self.inner.policy.as_str())
                    .with_outcome(Outcome::Fail)
                    .with_error(err),
            ),
        }
        outcome.map(|_| ())
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn record_real_call(&self, record: RealCallRecord) -> Result<(), ContractError> {
        let verdict = {
            let mut state = self.inner.state.lock();
            let verdict = if self.inner.policy.validates_on_call() {
                state
                    .mocks
                    .get(&record.method)
                    .map_or(Ok(()), |mock| self.check_on_arrival(mock, &record))
            } else {
                Ok(())
            };
            state.call_log.push(record);
            verdict
        };
        if let Err(err) = &verdict {
            self.inner.events.record(
                LogEntry::event(LogLevel::Error, events::REAL_CALL_REJECTED)
                    .with_fake(self.name())
                    .with_policy(self.inner.policy.as_str())
                    .with_error(err),
            );
        }
        verdict
    }

    fn check_on_arrival(&self, mock: &Mock, record: &RealCallRecord) -> Result<(), ContractError> {
        if mock.confirm(&record.args, &record.return_value) {
            return Ok(());
        }
        Err(ContractError::RealBehaviourMismatch {
            fake: self.name().to_string(),
            method: record.method.clone(),
            args: record.args.clone(),
            actual: record.return_value.clone(),
            known: mock.signatures(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::error::ErrorKind;
    use crate::real::MethodTable;
    use crate::value::really_equal;

    #[test]
    fn mock_method_is_idempotent() {
        let fake = Fake::new("example");
        let first = fake.mock_method("example");
        let second = fake.mock_method("example");
        assert!(first.ptr_eq(&second));
        assert_eq!(fake.mocked_methods(), vec!["example".to_string()]);
    }

    #[test]
    fn call_routes_to_the_mock() {
        let fake = Fake::new("example");
        fake.mock_method("foo").map(args!["a1", "a2"], "r1");
        let value = fake.call("foo", &args!["a1", "a2"]).unwrap();
        assert!(really_equal(&value, &Value::from("r1")));
        assert!(fake.mock_method("foo").behaviours()[0].used_by_fake());
    }

    #[test]
    fn call_to_unknown_method_is_unmocked() {
        let fake = Fake::new("example");
        let err = fake.call("missing", &args![]).unwrap_err();
        assert!(matches!(err, ContractError::UnmockedCall { ref known, .. } if known.is_empty()));
    }

    #[test]
    fn verify_without_binding_fails() {
        let fake = Fake::new("example");
        fake.mock_method("foo").map(args![], "bar");
        let err = fake.verify().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRealBinding);
    }

    #[test]
    fn bind_real_marks_fake_bound() {
        let fake = Fake::new("example");
        assert!(!fake.is_bound());
        assert!(fake.bound_real().is_none());
        let wrapper = fake.bind_real(MethodTable::new().returning("foo", "bar"));
        assert!(fake.is_bound());
        let again = fake.bound_real().unwrap();
        assert!(wrapper.same_real(&again));
        assert!(wrapper.fake().ptr_eq(&fake));
    }

    #[test]
    fn rebinding_replaces_real_and_keeps_log() {
        let fake = Fake::new("example");
        let first = fake.bind_real(MethodTable::new().returning("foo", "bar"));
        first.call("foo", &args![]).unwrap();
        let second = fake.bind_real(MethodTable::new().returning("foo", "baz"));
        second.call("foo", &args![]).unwrap();
        // The old handle still records into the same fake.
        first.call("foo", &args![]).unwrap();

        assert!(!first.same_real(&second));
        assert!(fake.bound_real().unwrap().same_real(&second));
        assert_eq!(fake.real_calls().len(), 3);
    }

    #[test]
    fn verify_passes_once_fake_use_is_confirmed() {
        let fake = Fake::new("example");
        fake.mock_method("foo").map(args![], "bar");
        fake.call("foo", &args![]).unwrap();
        let wrapper = fake.bind_real(MethodTable::new().returning("foo", "bar"));
        wrapper.call("foo", &args![]).unwrap();
        assert!(fake.verify().is_ok());
        // Verification is repeatable.
        assert!(fake.verify().is_ok());
    }

    #[test]
    fn eager_policy_rejects_mismatching_real_calls() {
        let fake = Fake::with_settings("example", InterceptionPolicy::Eager, EventLog::disabled());
        fake.mock_method("foo").map(args![], "bar");
        let wrapper = fake.bind_real(
            MethodTable::new()
                .returning("foo", "baz")
                .returning("other", 1),
        );
        let err = wrapper.call("foo", &args![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RealBehaviourMismatch);
        // Unmocked methods are not checked on arrival.
        assert!(wrapper.call("other", &args![]).is_ok());
        assert_eq!(fake.real_calls().len(), 2);
    }

    #[test]
    fn eager_policy_confirms_on_arrival() {
        let fake = Fake::with_settings("example", InterceptionPolicy::Eager, EventLog::disabled());
        fake.mock_method("foo").map(args![], "bar");
        let wrapper = fake.bind_real(MethodTable::new().returning("foo", "bar"));
        wrapper.call("foo", &args![]).unwrap();
        assert!(fake.mock_method("foo").behaviours()[0].used_by_real());
    }
}
