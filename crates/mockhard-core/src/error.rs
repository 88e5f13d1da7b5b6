//! Failure taxonomy for fakes, real bindings and verification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::{Value, signature};

/// Failure raised by a real object itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealError {
    #[error("real object does not implement `{method}`")]
    NoSuchMethod { method: String },
    #[error("real `{method}` failed: {message}")]
    Failed { method: String, message: String },
}

impl RealError {
    /// Convenience constructor for real implementations.
    #[must_use]
    pub fn failed(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            method: method.into(),
            message: message.into(),
        }
    }
}

/// Every way a fake, a real binding, or a verification pass can fail.
#[derive(Debug, Clone, Error)]
pub enum ContractError {
    #[error(
        "unmocked call: no behaviour mapped for {}; mocked calls: [{}]",
        signature(.method, .args, None),
        .known.join("; ")
    )]
    UnmockedCall {
        method: String,
        args: Vec<Value>,
        known: Vec<String>,
    },

    #[error("no real object bound for fake `{fake}`; bind one with real(\"{fake}\", object)")]
    MissingRealBinding { fake: String },

    #[error("fake `{fake}` mocks `{method}`, but the real object does not implement it")]
    RealMethodMissing { fake: String, method: String },

    #[error(
        "fake `{fake}`: call {} was used on the fake but never observed on the real object",
        signature(.method, .args, Some(.expected))
    )]
    UnconfirmedBehaviour {
        fake: String,
        method: String,
        args: Vec<Value>,
        expected: Value,
    },

    #[error(
        "fake `{fake}` is not set up to receive {} observed on the real object; mocked calls: [{}]",
        signature(.method, .args, Some(.actual)),
        .known.join("; ")
    )]
    RealBehaviourMismatch {
        fake: String,
        method: String,
        args: Vec<Value>,
        actual: Value,
        known: Vec<String>,
    },

    #[error(transparent)]
    Real(#[from] RealError),
}

/// Discriminant of [`ContractError`], for logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnmockedCall,
    MissingRealBinding,
    RealMethodMissing,
    UnconfirmedBehaviour,
    RealBehaviourMismatch,
    RealFailure,
}

impl ErrorKind {
    pub const ALL: [Self; 6] = [
        Self::UnmockedCall,
        Self::MissingRealBinding,
        Self::RealMethodMissing,
        Self::UnconfirmedBehaviour,
        Self::RealBehaviourMismatch,
        Self::RealFailure,
    ];

    /// True when the fake and the real object disagree, as opposed to a
    /// test setup mistake.
    #[must_use]
    pub const fn is_divergence(self) -> bool {
        matches!(
            self,
            Self::RealMethodMissing | Self::UnconfirmedBehaviour | Self::RealBehaviourMismatch
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnmockedCall => "unmocked_call",
            Self::MissingRealBinding => "missing_real_binding",
            Self::RealMethodMissing => "real_method_missing",
            Self::UnconfirmedBehaviour => "unconfirmed_behaviour",
            Self::RealBehaviourMismatch => "real_behaviour_mismatch",
            Self::RealFailure => "real_failure",
        }
    }

    /// Parse the snake_case form used in logs.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }
}

impl ContractError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnmockedCall { .. } => ErrorKind::UnmockedCall,
            Self::MissingRealBinding { .. } => ErrorKind::MissingRealBinding,
            Self::RealMethodMissing { .. } => ErrorKind::RealMethodMissing,
            Self::UnconfirmedBehaviour { .. } => ErrorKind::UnconfirmedBehaviour,
            Self::RealBehaviourMismatch { .. } => ErrorKind::RealBehaviourMismatch,
            Self::Real(_) => ErrorKind::RealFailure,
        }
    }

    #[must_use]
    pub const fn is_divergence(&self) -> bool {
        self.kind().is_divergence()
    }

    /// Structured context for log entries.
    #[must_use]
    pub fn details(&self) -> serde_json::Value {
        let args_json = |args: &[Value]| -> serde_json::Value {
            args.iter().map(Value::to_json).collect()
        };
        match self {
            Self::UnmockedCall { method, args, known } => serde_json::json!({
                "method": method,
                "args": args_json(args),
                "known": known,
            }),
            Self::MissingRealBinding { fake } => serde_json::json!({ "fake": fake }),
            Self::RealMethodMissing { fake, method } => {
                serde_json::json!({ "fake": fake, "method": method })
            }
            Self::UnconfirmedBehaviour {
                fake,
                method,
                args,
                expected,
            } => serde_json::json!({
                "fake": fake,
                "method": method,
                "args": args_json(args),
                "expected": expected.to_json(),
            }),
            Self::RealBehaviourMismatch {
                fake,
                method,
                args,
                actual,
                known,
            } => serde_json::json!({
                "fake": fake,
                "method": method,
                "args": args_json(args),
                "actual": actual.to_json(),
                "known": known,
            }),
            Self::Real(err) => serde_json::json!({ "message": err.to_string() }),
        }
    }

    /// Method the failure concerns, when there is one.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::UnmockedCall { method, .. }
            | Self::RealMethodMissing { method, .. }
            | Self::UnconfirmedBehaviour { method, .. }
            | Self::RealBehaviourMismatch { method, .. }
            | Self::Real(RealError::NoSuchMethod { method } | RealError::Failed { method, .. }) => {
                Some(method)
            }
            Self::MissingRealBinding { .. } => None,
        }
    }
}
