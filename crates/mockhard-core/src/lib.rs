//! Contract-consistency verification for fakes.
//!
//! A test declares a fake for a collaborator and programs behaviours on it:
//! `(args -> return value)` per method. The real implementation is bound to
//! the same fake and driven through a recording handle. Verification replays
//! what the real object actually did against what the fake promised, and
//! fails if any behaviour the fake answered was never exhibited by the real
//! object, or if the real object lacks a mocked method.
//!
//! ```
//! use mockhard_core::{MethodTable, VerificationContext, args};
//!
//! let ctx = VerificationContext::new();
//! ctx.fake("Library").mock_method("checkout").map(args![], "Moby Dick");
//! ctx.fake("Library").call("checkout", &args![]).unwrap();
//!
//! let library = ctx.real("Library", MethodTable::new().returning("checkout", "Moby Dick"));
//! library.call("checkout", &args![]).unwrap();
//!
//! ctx.verify_all().unwrap();
//! ```

#![forbid(unsafe_code)]

pub mod behaviour;
pub mod config;
pub mod context;
pub mod error;
pub mod fake;
pub mod interceptor;
pub mod real;
pub mod structured_log;
pub mod value;
pub mod verifier;

pub use behaviour::{Behaviour, BehaviourTable, Mock};
pub use config::{ConfigError, ContextConfig, InterceptionPolicy};
pub use context::{FakeVerdict, VerificationContext};
pub use error::{ContractError, ErrorKind, RealError};
pub use fake::Fake;
pub use interceptor::{RealCallRecord, WrappedReal};
pub use real::{Capabilities, MethodTable, RealObject};
pub use value::{Value, really_equal};
pub use verifier::ReconcileStats;
