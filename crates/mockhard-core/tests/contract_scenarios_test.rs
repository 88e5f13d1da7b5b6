//! Integration test: end-to-end fake/real contract scenarios.
//!
//! Exercises the public surface the way a test suite would: declare fakes,
//! drive code under test against them, drive the real collaborator in a
//! separate block, verify at suite end.
//!
//! Run: cargo test -p mockhard-core --test contract_scenarios_test

use mockhard_core::{
    Capabilities, ContractError, ErrorKind, MethodTable, RealError, RealObject, Value,
    VerificationContext, args, really_equal,
};

/// A real collaborator with state shared between its methods.
struct Library {
    book: String,
}

impl Library {
    fn new(book: &str) -> Self {
        Self {
            book: book.to_string(),
        }
    }
}

impl RealObject for Library {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new().with("checkout").with("returnBook")
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value, RealError> {
        match method {
            "checkout" => Ok(Value::from(self.book.as_str())),
            "returnBook" => match args {
                [Value::Str(book)] => {
                    self.book = book.to_string();
                    Ok(Value::Undefined)
                }
                _ => Err(RealError::failed("returnBook", "expected one title")),
            },
            other => Err(RealError::NoSuchMethod {
                method: other.to_string(),
            }),
        }
    }
}

/// Code under test: depends on anything answering `checkout`.
fn learn(library: impl Fn() -> Result<Value, ContractError>) -> Result<String, ContractError> {
    Ok(format!("I learned {}", library()?))
}

fn fake_usage(ctx: &VerificationContext) {
    let fake = ctx.fake("Library");
    fake.mock_method("checkout").map(args![], "Moby Dick");
    let learned = learn(|| fake.call("checkout", &args![])).unwrap();
    assert_eq!(learned, "I learned Moby Dick");
}

fn real_usage(ctx: &VerificationContext, real: impl RealObject + 'static) {
    let library = ctx.real("Library", real);
    library.call("checkout", &args![]).unwrap();
}

#[test]
fn matching_fake_and_real_verify() {
    let ctx = VerificationContext::new();
    ctx.fake("Library");
    fake_usage(&ctx);
    real_usage(&ctx, MethodTable::new().returning("checkout", "Moby Dick"));
    assert!(ctx.verify_all().is_ok());
}

#[test]
fn diverging_real_return_value_is_unconfirmed() {
    let ctx = VerificationContext::new();
    fake_usage(&ctx);
    real_usage(&ctx, MethodTable::new().returning("checkout", "Different Book"));
    let err = ctx.verify_all().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnconfirmedBehaviour);
    assert!(err.is_divergence());
    assert!(err.to_string().contains("checkout() => Moby Dick"), "{err}");
}

#[test]
fn missing_real_method_is_reported_without_calls() {
    let ctx = VerificationContext::new();
    ctx.fake("Library")
        .mock_method("checkout")
        .map(args![], "Moby Dick");
    ctx.real("Library", MethodTable::new().returning("returnBook", ()));
    let err = ctx.verify_all().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RealMethodMissing);
}

#[test]
fn missing_real_method_is_reported_after_fake_use() {
    let ctx = VerificationContext::new();
    fake_usage(&ctx);
    ctx.real("Library", MethodTable::new().returning("returnBook", ()));
    let err = ctx.verify_all().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RealMethodMissing);
    assert_eq!(err.method(), Some("checkout"));
}

#[test]
fn unbound_fake_fails_verification() {
    let ctx = VerificationContext::new();
    fake_usage(&ctx);
    let err = ctx.verify_all().unwrap_err();
    assert!(matches!(err, ContractError::MissingRealBinding { ref fake } if fake == "Library"));
    assert!(!err.is_divergence());
}

#[test]
fn binding_without_exercising_the_real_is_not_enough() {
    let ctx = VerificationContext::new();
    fake_usage(&ctx);
    ctx.real("Library", Library::new("Moby Dick"));
    let err = ctx.verify_all().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnconfirmedBehaviour);
}

#[test]
fn verification_is_independent_of_fake_real_ordering() {
    let fake_first = VerificationContext::new();
    fake_usage(&fake_first);
    real_usage(&fake_first, Library::new("Moby Dick"));

    let real_first = VerificationContext::new();
    real_usage(&real_first, Library::new("Moby Dick"));
    fake_usage(&real_first);

    assert!(fake_first.verify_all().is_ok());
    assert!(real_first.verify_all().is_ok());
    assert_eq!(fake_first.verify_each(), real_first.verify_each());
}

#[test]
fn ordering_invariance_holds_for_failures_too() {
    let fake_first = VerificationContext::new();
    fake_usage(&fake_first);
    real_usage(&fake_first, Library::new("Different Book"));

    let real_first = VerificationContext::new();
    real_usage(&real_first, Library::new("Different Book"));
    fake_usage(&real_first);

    assert_eq!(fake_first.verify_each(), real_first.verify_each());
    assert!(!fake_first.verify_each()[0].passed());
}

#[test]
fn unused_behaviours_need_no_real_confirmation() {
    let ctx = VerificationContext::new();
    let fake = ctx.fake("Library");
    fake.mock_method("checkout").map(args![], "Moby Dick");
    fake.mock_method("checkout").map(args!["rare"], "Ulysses");
    fake.call("checkout", &args![]).unwrap();
    real_usage(&ctx, Library::new("Moby Dick"));
    assert!(ctx.verify_all().is_ok());
}

#[test]
fn stateful_real_confirms_each_behaviour_it_exhibits() {
    let ctx = VerificationContext::new();
    let fake = ctx.fake("Library");
    fake.mock_method("checkout").map(args![], "Moby Dick");
    fake.mock_method("returnBook").map(args!["Ulysses"], ());
    fake.call("checkout", &args![]).unwrap();
    fake.call("returnBook", &args!["Ulysses"]).unwrap();

    let library = ctx.real("Library", Library::new("Moby Dick"));
    assert!(really_equal(
        &library.call("checkout", &args![]).unwrap(),
        &Value::from("Moby Dick")
    ));
    library.call("returnBook", &args!["Ulysses"]).unwrap();
    assert!(really_equal(
        &library.call("checkout", &args![]).unwrap(),
        &Value::from("Ulysses")
    ));
    assert!(ctx.verify_all().is_ok());
}

#[test]
fn real_calls_made_before_a_mock_exists_still_count() {
    let ctx = VerificationContext::new();
    real_usage(&ctx, Library::new("Moby Dick"));
    // Mock added after the real call was already recorded.
    fake_usage(&ctx);
    assert_eq!(ctx.fake("Library").real_calls().len(), 1);
    assert!(ctx.verify_all().is_ok());
}

#[test]
fn verify_all_stops_at_first_failing_fake() {
    let ctx = VerificationContext::new();
    ctx.fake("Archive").mock_method("lookup").map(args![1], "x");
    ctx.fake("Catalog").mock_method("search").map(args!["q"], "y");
    // Both unbound; name order puts Archive first.
    let err = ctx.verify_all().unwrap_err();
    assert!(matches!(err, ContractError::MissingRealBinding { ref fake } if fake == "Archive"));
}

#[test]
fn reset_prevents_stale_bindings_from_leaking() {
    let ctx = VerificationContext::new();
    fake_usage(&ctx);
    real_usage(&ctx, Library::new("Moby Dick"));
    assert!(ctx.verify_all().is_ok());

    ctx.reset();
    fake_usage(&ctx);
    let err = ctx.verify_all().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRealBinding);
}

#[test]
fn real_failures_surface_unchanged() {
    let ctx = VerificationContext::new();
    let library = ctx.real("Library", Library::new("Moby Dick"));
    let err = library.call("returnBook", &args![]).unwrap_err();
    assert!(matches!(
        err,
        ContractError::Real(RealError::Failed { ref message, .. }) if message == "expected one title"
    ));
    assert!(ctx.fake("Library").real_calls().is_empty());
}

#[test]
fn argument_matching_is_shallow() {
    let ctx = VerificationContext::new();
    let shelf = Value::list([Value::from("Moby Dick")]);
    let fake = ctx.fake("Shelf");
    fake.mock_method("contains").map(vec![shelf.clone()], true);

    // Same list instance matches; an equal-looking copy does not.
    assert!(fake.call("contains", &[shelf]).is_ok());
    let copy = Value::list([Value::from("Moby Dick")]);
    let err = fake.call("contains", &[copy]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnmockedCall);
}
