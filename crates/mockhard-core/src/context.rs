//! Verification context: the registry of fakes for one test run.
//!
//! The surrounding test framework owns the context and decides when to reset
//! it. Nothing here resets implicitly.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ContextConfig};
use crate::error::{ContractError, ErrorKind};
use crate::fake::Fake;
use crate::interceptor::WrappedReal;
use crate::real::RealObject;
use crate::structured_log::{EventLog, LogEmitter, LogEntry, LogLevel, events};

/// Outcome of verifying one fake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakeVerdict {
    pub fake: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FakeVerdict {
    #[must_use]
    pub fn pass(fake: impl Into<String>) -> Self {
        Self {
            fake: fake.into(),
            error_kind: None,
            message: None,
        }
    }

    #[must_use]
    pub fn fail(fake: impl Into<String>, err: &ContractError) -> Self {
        Self {
            fake: fake.into(),
            error_kind: Some(err.kind()),
            message: Some(err.to_string()),
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.error_kind.is_none()
    }
}

/// Registry of named fakes plus the settings they share.
#[derive(Debug)]
pub struct VerificationContext {
    config: ContextConfig,
    fakes: RwLock<BTreeMap<String, Fake>>,
    events: EventLog,
}

impl Default for VerificationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationContext {
    /// Deferred policy, no event log.
    #[must_use]
    pub fn new() -> Self {
        Self::with_event_log(ContextConfig::default(), EventLog::disabled())
    }

    /// Build from a configuration, opening its event log when one is set.
    pub fn from_config(config: ContextConfig) -> Result<Self, ConfigError> {
        let events = match &config.log_path {
            Some(path) => EventLog::new(LogEmitter::to_file(path, &config.run_id).map_err(
                |source| ConfigError::Log {
                    path: path.clone(),
                    source,
                },
            )?),
            None => EventLog::disabled(),
        };
        Ok(Self::with_event_log(config, events))
    }

    /// Build from `MOCKHARD_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_config(ContextConfig::from_env())
    }

    /// Build with an explicit emitter; `config.log_path` is ignored and the
    /// run id is taken from the emitter.
    #[must_use]
    pub fn with_emitter(config: ContextConfig, emitter: LogEmitter) -> Self {
        let config = config.with_run_id(emitter.run_id());
        Self::with_event_log(config, EventLog::new(emitter))
    }

    fn with_event_log(config: ContextConfig, events: EventLog) -> Self {
        Self {
            config,
            fakes: RwLock::new(BTreeMap::new()),
            events,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Get or create the fake called `name`.
    pub fn fake(&self, name: &str) -> Fake {
        if let Some(fake) = self.fakes.read().get(name) {
            return fake.clone();
        }
        let mut created = false;
        let fake = self
            .fakes
            .write()
            .entry(name.to_string())
            .or_insert_with(|| {
                created = true;
                Fake::with_settings(name, self.config.policy, self.events.clone())
            })
            .clone();
        if created {
            self.events.record(
                LogEntry::event(LogLevel::Debug, events::FAKE_CREATED)
                    .with_fake(name)
                    .with_policy(self.config.policy.as_str()),
            );
        }
        fake
    }

    /// Get or create the fake called `name`, bind `object` to it, and return
    /// the recording handle to use in place of `object`.
    pub fn real<R: RealObject + 'static>(&self, name: &str, object: R) -> WrappedReal {
        self.fake(name).bind_real(object)
    }

    /// Verify every fake in name order, stopping at the first failure.
    pub fn verify_all(&self) -> Result<(), ContractError> {
        for fake in self.snapshot() {
            fake.verify()?;
        }
        Ok(())
    }

    /// Verify every fake and collect one verdict per fake.
    #[must_use]
    pub fn verify_each(&self) -> Vec<FakeVerdict> {
        self.snapshot()
            .into_iter()
            .map(|fake| match fake.verify() {
                Ok(()) => FakeVerdict::pass(fake.name()),
                Err(err) => FakeVerdict::fail(fake.name(), &err),
            })
            .collect()
    }

    /// Drop every fake.
    pub fn reset(&self) {
        let dropped = {
            let mut fakes = self.fakes.write();
            let count = fakes.len();
            fakes.clear();
            count
        };
        self.events.record(
            LogEntry::event(LogLevel::Debug, events::CONTEXT_RESET)
                .with_details(serde_json::json!({ "dropped": dropped })),
        );
    }

    /// Names of all registered fakes, sorted.
    #[must_use]
    pub fn fake_names(&self) -> Vec<String> {
        self.fakes.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fakes.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fakes.read().is_empty()
    }

    pub fn flush_log(&self) -> std::io::Result<()> {
        self.events.flush()
    }

    // Handles are cloned out so no registry lock is held while verifying.
    fn snapshot(&self) -> Vec<Fake> {
        self.fakes.read().values().cloned().collect()
    }
}
