//! Per-method behaviour tables.
//!
//! A table is an append-only list of `(args -> return value)` mappings for one
//! method of one fake. Lookups scan in insertion order and the first match
//! wins. Lookups only ever flip usage flags from false to true.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ContractError;
use crate::structured_log::{EventLog, LogEntry, LogLevel, events};
use crate::value::{Value, args_equal, really_equal, signature};

/// One registered mapping plus its usage flags.
#[derive(Debug, Clone)]
pub struct Behaviour {
    args: Vec<Value>,
    return_value: Value,
    used_by_fake: bool,
    used_by_real: bool,
}

impl Behaviour {
    fn new(args: Vec<Value>, return_value: Value) -> Self {
        Self {
            args,
            return_value,
            used_by_fake: false,
            used_by_real: false,
        }
    }

    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    #[must_use]
    pub fn return_value(&self) -> &Value {
        &self.return_value
    }

    #[must_use]
    pub fn used_by_fake(&self) -> bool {
        self.used_by_fake
    }

    #[must_use]
    pub fn used_by_real(&self) -> bool {
        self.used_by_real
    }

    /// Exercised on the fake but not (yet) observed on the real object.
    #[must_use]
    pub fn is_unconfirmed(&self) -> bool {
        self.used_by_fake && !self.used_by_real
    }

    fn matches_real(&self, args: &[Value], return_value: &Value) -> bool {
        args_equal(&self.args, args) && really_equal(&self.return_value, return_value)
    }
}

/// Ordered behaviours for a single method.
#[derive(Debug, Clone)]
pub struct BehaviourTable {
    fake: String,
    method: String,
    behaviours: Vec<Behaviour>,
}

impl BehaviourTable {
    #[must_use]
    pub fn new(fake: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            fake: fake.into(),
            method: method.into(),
            behaviours: Vec::new(),
        }
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn behaviours(&self) -> &[Behaviour] {
        &self.behaviours
    }

    /// Append a behaviour. Duplicate argument tuples are kept: a real method
    /// may legitimately answer the same arguments differently over time.
    pub fn map(&mut self, args: Vec<Value>, return_value: Value) -> &mut Self {
        self.behaviours.push(Behaviour::new(args, return_value));
        self
    }

    /// Answer a call on the fake from the first behaviour with equal args.
    pub fn invoke(&mut self, args: &[Value]) -> Result<Value, ContractError> {
        match self
            .behaviours
            .iter_mut()
            .find(|b| args_equal(&b.args, args))
        {
            Some(behaviour) => {
                behaviour.used_by_fake = true;
                Ok(behaviour.return_value.clone())
            }
            None => Err(ContractError::UnmockedCall {
                method: self.method.clone(),
                args: args.to_vec(),
                known: self.signatures(),
            }),
        }
    }

    /// Mark the first behaviour matching an observed real call as confirmed.
    /// Returns false when nothing matches.
    pub fn confirm(&mut self, args: &[Value], return_value: &Value) -> bool {
        match self
            .behaviours
            .iter_mut()
            .find(|b| b.matches_real(args, return_value))
        {
            Some(behaviour) => {
                behaviour.used_by_real = true;
                true
            }
            None => false,
        }
    }

    /// Every behaviour the fake answered must have been seen on the real
    /// object. Behaviours never used by the fake are inert.
    pub fn verify_usage(&self) -> Result<(), ContractError> {
        match self.behaviours.iter().find(|b| b.is_unconfirmed()) {
            Some(b) => Err(ContractError::UnconfirmedBehaviour {
                fake: self.fake.clone(),
                method: self.method.clone(),
                args: b.args.clone(),
                expected: b.return_value.clone(),
            }),
            None => Ok(()),
        }
    }

    /// `method(args) => value` for every behaviour, in insertion order.
    #[must_use]
    pub fn signatures(&self) -> Vec<String> {
        self.behaviours
            .iter()
            .map(|b| signature(&self.method, &b.args, Some(&b.return_value)))
            .collect()
    }
}

#[derive(Debug)]
struct MockInner {
    table: Mutex<BehaviourTable>,
    events: EventLog,
}

/// Shared handle to a fake's behaviour table for one method.
///
/// Clones refer to the same table; [`Mock::ptr_eq`] tests identity.
#[derive(Debug, Clone)]
pub struct Mock {
    inner: Arc<MockInner>,
}

impl Mock {
    pub(crate) fn new(table: BehaviourTable, events: EventLog) -> Self {
        Self {
            inner: Arc::new(MockInner {
                table: Mutex::new(table),
                events,
            }),
        }
    }

    /// Register `args -> return_value`. Chainable.
    pub fn map(&self, args: Vec<Value>, return_value: impl Into<Value>) -> &Self {
        self.inner.table.lock().map(args, return_value.into());
        self
    }

    /// Call the mocked method.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, ContractError> {
        let mut table = self.inner.table.lock();
        let result = table.invoke(args);
        if let Err(err) = &result {
            self.inner.events.record(
                LogEntry::event(LogLevel::Warn, events::UNMOCKED_CALL)
                    .with_fake(table.fake.clone())
                    .with_method(table.method())
                    .with_error(err),
            );
        }
        result
    }

    pub fn verify_usage(&self) -> Result<(), ContractError> {
        self.inner.table.lock().verify_usage()
    }

    pub(crate) fn confirm(&self, args: &[Value], return_value: &Value) -> bool {
        self.inner.table.lock().confirm(args, return_value)
    }

    #[must_use]
    pub fn method(&self) -> String {
        self.inner.table.lock().method.clone()
    }

    /// Snapshot of the behaviours and their flags.
    #[must_use]
    pub fn behaviours(&self) -> Vec<Behaviour> {
        self.inner.table.lock().behaviours.clone()
    }

    #[must_use]
    pub fn signatures(&self) -> Vec<String> {
        self.inner.table.lock().signatures()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.table.lock().behaviours.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
