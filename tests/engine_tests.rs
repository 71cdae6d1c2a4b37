//! Tests for the grading engine and rubric construction.

use anyhow::bail;
use jsgrade::{
    Category, Check, CheckOutcome, CheckRegistry, ConfigurationError, FnCheck, GradingEngine,
    ReportBundle, Status,
    checks::{FunctionDefinedCheck, reference_rubric},
    parse,
    registry::RegisteredCheck,
};

const SOURCE: &str = r#"
function greet(name, age = 25) {
    return `Hello ${name}, ${age}`;
}
function sum(a, b) { return a + b; }
"#;

fn always(passed: bool, name: &str) -> FnCheck {
    FnCheck::new(name, move |_| {
        Ok(if passed { CheckOutcome::pass() } else { CheckOutcome::fail("nope") })
    })
}

#[test]
fn one_record_per_check() {
    let tree = parse(SOURCE).expect("parse");
    let registry = CheckRegistry::builder()
        .register(always(true, "a"), true, 1.0)
        .register(always(false, "b"), false, 2.5)
        .register(FunctionDefinedCheck, true, 1.0)
        .build()
        .expect("registry");

    let bundle = GradingEngine::new("base").run(&tree, &registry, "meta");

    assert_eq!(bundle.len(), registry.len());
    let names: Vec<_> = bundle.records().map(|r| r.check_name()).collect();
    assert_eq!(names, ["a", "b", "FunctionDefinition"]);
    assert_eq!(bundle.metadata(), "meta");
    assert_eq!(bundle.max_total(), registry.max_total());
}

#[test]
fn status_score_and_feedback_agree() {
    let tree = parse("").expect("parse");
    let registry = CheckRegistry::builder()
        .register(always(true, "pass"), true, 3.0)
        .register(always(false, "fail"), true, 3.0)
        .build()
        .expect("registry");

    let bundle = GradingEngine::new("base").run(&tree, &registry, "");
    for record in bundle.records() {
        let full_marks = record.earned_score() == record.max_score();
        assert_eq!(record.status() == Status::Pass, full_marks);
        assert_eq!(full_marks, record.feedback().is_empty());
        assert!(record.earned_score() == 0.0 || full_marks);
    }
}

#[test]
fn blank_failure_reason_still_yields_feedback() {
    let tree = parse("").expect("parse");
    let registry = CheckRegistry::builder()
        .register(FnCheck::new("blank", |_| Ok(CheckOutcome::fail(""))), true, 1.0)
        .register(FnCheck::new("blank-require", |_| Ok(CheckOutcome::require(false, " "))), true, 1.0)
        .build()
        .expect("registry");

    let bundle = GradingEngine::new("base").run(&tree, &registry, "");
    for record in bundle.records() {
        assert_eq!(record.status(), Status::Fail);
        assert!(!record.feedback().trim().is_empty());
    }
}

#[test]
fn checks_and_bundles_cross_threads() {
    fn assert_send_sync<T: Send + Sync + ?Sized>() {}

    assert_send_sync::<Box<dyn Check>>();
    assert_send_sync::<CheckRegistry>();
    assert_send_sync::<ReportBundle>();
}

#[test]
fn runs_are_deterministic() {
    let tree = parse(SOURCE).expect("parse");
    let registry = reference_rubric().expect("registry");
    let engine = GradingEngine::new("base");

    let first = engine.run(&tree, &registry, "meta").to_json().expect("json");
    let second = engine.run(&tree, &registry, "meta").to_json().expect("json");
    assert_eq!(first, second);
}

#[test]
fn erroring_check_is_isolated() {
    let tree = parse(SOURCE).expect("parse");
    let registry = CheckRegistry::builder()
        .register(FnCheck::new("broken", |_| bail!("malformed tree")), true, 1.0)
        .register(always(true, "after"), true, 1.0)
        .build()
        .expect("registry");

    let bundle = GradingEngine::new("base").run(&tree, &registry, "");

    let broken = bundle.by_check("broken").expect("broken record");
    assert_eq!(broken.status(), Status::Fail);
    assert_eq!(broken.earned_score(), 0.0);
    assert!(broken.feedback().contains("malformed tree"));
    assert!(bundle.by_check("after").expect("after record").passed());
}

#[test]
fn panicking_check_is_isolated() {
    let tree = parse(SOURCE).expect("parse");
    let registry = CheckRegistry::builder()
        .register(always(true, "before"), true, 1.0)
        .register(FnCheck::new("panics", |_| panic!("index out of bounds")), true, 1.0)
        .register(always(true, "after"), true, 1.0)
        .build()
        .expect("registry");

    let bundle = GradingEngine::new("base").run(&tree, &registry, "");

    assert_eq!(bundle.len(), 3);
    let panicked = bundle.by_check("panics").expect("panics record");
    assert_eq!(panicked.status(), Status::Fail);
    assert!(panicked.feedback().contains("index out of bounds"));
    assert!(bundle.by_check("after").expect("after record").passed());
}

#[test]
fn duplicate_names_are_rejected() {
    let err = CheckRegistry::builder()
        .register(always(true, "x"), true, 1.0)
        .register(always(false, "x"), true, 1.0)
        .build()
        .expect_err("duplicate names");
    assert_eq!(err, ConfigurationError::DuplicateName("x".into()));
}

#[test]
fn names_colliding_as_keys_are_rejected() {
    let err = CheckRegistry::builder()
        .register(always(true, "ReturnUsage"), true, 1.0)
        .register(always(true, "return usage"), true, 1.0)
        .build()
        .expect_err("colliding keys");
    assert!(matches!(err, ConfigurationError::DuplicateName(_)));
}

#[test]
fn malformed_registrations_are_rejected() {
    assert_eq!(
        CheckRegistry::builder().build().expect_err("empty"),
        ConfigurationError::Empty
    );
    assert_eq!(
        CheckRegistry::builder()
            .register(always(true, "  "), true, 1.0)
            .build()
            .expect_err("blank name"),
        ConfigurationError::EmptyName(0)
    );
    assert!(matches!(
        CheckRegistry::builder()
            .register(always(true, "nan"), true, f64::NAN)
            .build()
            .expect_err("nan score"),
        ConfigurationError::InvalidMaxScore { .. }
    ));
}

#[test]
fn registered_check_builder_defaults() {
    let entry = RegisteredCheck::builder()
        .check(Box::new(always(true, "built")))
        .build();
    assert!(entry.mandatory());
    assert_eq!(entry.max_score(), 1.0);

    let registry = CheckRegistry::builder()
        .entry(entry)
        .build()
        .expect("registry");
    assert_eq!(registry.len(), 1);
}

#[test]
fn categories_and_mandatory_flags_flow_into_records() {
    let tree = parse("").expect("parse");
    let registry = CheckRegistry::builder()
        .register(always(false, "edge").with_category(Category::Boundary), false, 1.0)
        .build()
        .expect("registry");

    let bundle = GradingEngine::new("base").run(&tree, &registry, "");
    let record = bundle.get("base-edge").expect("keyed record");
    assert_eq!(record.category(), Category::Boundary);
    assert!(!record.mandatory());
    // A failing optional check does not block acceptance.
    assert!(bundle.accepted());
}

#[test]
fn bundle_serializes_in_rubric_order() {
    let tree = parse(SOURCE).expect("parse");
    let registry = reference_rubric().expect("registry");
    let bundle = GradingEngine::new("g").run(&tree, &registry, "custom");

    let value: serde_json::Value =
        serde_json::from_str(&bundle.to_json().expect("json")).expect("valid json");
    assert_eq!(value["metadata"], "custom");
    let record = &value["results"]["g-function-definition"];
    assert_eq!(record["checkName"], "FunctionDefinition");
    assert_eq!(record["category"], "functional");
    assert_eq!(record["maxScore"], 1.0);
    assert_eq!(record["earnedScore"], 1.0);
    assert_eq!(record["status"], "Pass");
    assert_eq!(record["mandatory"], true);
    assert_eq!(record["feedback"], "");

    let json = bundle.to_json().expect("json");
    let first = json.find("g-function-definition").expect("first key");
    let last = json.find("g-return-statement-usage").expect("last key");
    assert!(first < last);
}
