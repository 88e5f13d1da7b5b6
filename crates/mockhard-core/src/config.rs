//! Context configuration.
//!
//! A context is configured from JSON or from the environment:
//! - `MOCKHARD_POLICY`: `deferred` (default) records real calls and reconciles
//!   them at verification time; `eager` also checks each real call against the
//!   fake's behaviours the moment it happens.
//! - `MOCKHARD_RUN_ID`: prefix for structured-log trace ids (default `local`).
//! - `MOCKHARD_LOG`: path of a JSONL event log. Unset means no log.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const POLICY_ENV: &str = "MOCKHARD_POLICY";
pub const RUN_ID_ENV: &str = "MOCKHARD_RUN_ID";
pub const LOG_ENV: &str = "MOCKHARD_LOG";

/// How real calls are checked against the fake.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterceptionPolicy {
    /// Log every real call; reconcile at verification. Tolerates any
    /// fake/real ordering.
    #[default]
    Deferred,
    /// Also validate each real call of a mocked method on arrival and fail
    /// with `RealBehaviourMismatch` when no behaviour matches.
    Eager,
}

impl InterceptionPolicy {
    /// Parse from string (case-insensitive). Unknown values fall back to
    /// `Deferred`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "eager" | "strict" | "fail-fast" | "immediate" => Self::Eager,
            _ => Self::Deferred,
        }
    }

    #[must_use]
    pub const fn validates_on_call(self) -> bool {
        matches!(self, Self::Eager)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deferred => "deferred",
            Self::Eager => "eager",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("open event log {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Settings for one verification context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub policy: InterceptionPolicy,
    pub run_id: String,
    pub log_path: Option<PathBuf>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            policy: InterceptionPolicy::Deferred,
            run_id: "local".to_string(),
            log_path: None,
        }
    }
}

impl ContextConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Resolve from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary variable lookup; blank values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            policy: get(POLICY_ENV)
                .map_or(defaults.policy, |raw| InterceptionPolicy::from_str_loose(&raw)),
            run_id: get(RUN_ID_ENV).unwrap_or(defaults.run_id),
            log_path: get(LOG_ENV).map(PathBuf::from),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: InterceptionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    #[must_use]
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }
}
