//! Real objects: the genuine implementations fakes are checked against.
//!
//! A real object declares the methods it offers up front. The interceptor and
//! the completeness check only consult that declared set.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::RealError;
use crate::value::Value;

/// Declared method names of a real object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(BTreeSet<String>);

impl Capabilities {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, method: impl Into<String>) -> Self {
        self.0.insert(method.into());
        self
    }

    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.0.contains(method)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Capabilities {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A genuine implementation that can be bound to a fake.
pub trait RealObject: Send {
    /// Every method name this object answers.
    fn capabilities(&self) -> Capabilities;

    /// Invoke `method`. Undeclared methods should yield
    /// [`RealError::NoSuchMethod`].
    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value, RealError>;
}

type MethodFn = Box<dyn FnMut(&[Value]) -> Result<Value, RealError> + Send>;

/// Closure-backed real object, for implementations small enough to declare
/// inline.
#[derive(Default)]
pub struct MethodTable {
    methods: BTreeMap<String, MethodFn>,
}

impl MethodTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name`, replacing any earlier declaration of the same name.
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnMut(&[Value]) -> Result<Value, RealError> + Send + 'static,
    {
        self.methods.insert(name.into(), Box::new(f));
        self
    }

    /// Declare `name` as always answering `value`.
    #[must_use]
    pub fn returning(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.method(name, move |_| Ok(value.clone()))
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RealObject for MethodTable {
    fn capabilities(&self) -> Capabilities {
        self.methods.keys().cloned().collect()
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value, RealError> {
        match self.methods.get_mut(method) {
            Some(f) => f(args),
            None => Err(RealError::NoSuchMethod {
                method: method.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::value::really_equal;

    #[test]
    fn method_table_declares_its_methods() {
        let real = MethodTable::new()
            .returning("foo", "bar")
            .returning("somethingElse", "hi");
        let caps = real.capabilities();
        assert!(caps.contains("foo"));
        assert!(caps.contains("somethingElse"));
        assert!(!caps.contains("notAFunction"));
        assert_eq!(caps.iter().collect::<Vec<_>>(), vec!["foo", "somethingElse"]);
    }

    #[test]
    fn undeclared_method_is_no_such_method() {
        let mut real = MethodTable::new();
        let err = real.call("notAFunction", &args![]).unwrap_err();
        assert_eq!(
            err,
            RealError::NoSuchMethod {
                method: "notAFunction".into()
            }
        );
    }

    #[test]
    fn stateful_closures_keep_their_state() {
        let mut count = 0_i64;
        let mut real = MethodTable::new().method("next", move |_| {
            count += 1;
            Ok(Value::from(count))
        });
        real.call("next", &args![]).unwrap();
        let second = real.call("next", &args![]).unwrap();
        assert!(really_equal(&second, &Value::from(2)));
    }

    #[test]
    fn capabilities_collect_from_names() {
        let caps: Capabilities = ["checkout", "returnBook"].into_iter().collect();
        assert_eq!(caps.len(), 2);
        assert_eq!(caps, Capabilities::new().with("returnBook").with("checkout"));
    }
}
