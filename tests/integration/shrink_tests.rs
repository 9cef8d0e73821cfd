//! Integration tests for complete shrink passes
//!
//! These tests run the whole pipeline on program models, built in code or
//! loaded from the JSON fixtures.

use deadsweep::config::KeepConfig;
use deadsweep::program::SymbolRef;
use deadsweep::{ClassDef, Config, MemberDef, Program, ShrinkError, Shrinker, Stage, Visibility};
use serde_json::json;
use std::path::PathBuf;

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(name: &str) -> Program {
    let contents = std::fs::read_to_string(fixtures_path().join(name)).expect("fixture exists");
    serde_json::from_str(&contents).expect("fixture parses")
}

fn keep(class: &str, methods: &[&str]) -> Config {
    Config {
        keep: vec![KeepConfig {
            class: class.to_string(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
        }],
        ..Config::default()
    }
}

fn member_names(program: &Program, class: &str) -> Vec<String> {
    program
        .find_class(class)
        .unwrap_or_else(|| panic!("{} was removed", class))
        .members
        .iter()
        .map(|m| m.name.clone())
        .collect()
}

// ============================================================================
// Keep rules
// ============================================================================

#[test]
fn test_foo_test_keeps_only_test_bar() {
    let program: Program = Program::new(vec![ClassDef::new("com.example.FooTest")
        .with_member(MemberDef::method("testBar", "()V"))
        .with_member(MemberDef::method("helper", "()V"))]);

    let outcome = Shrinker::new(&keep("FooTest", &["testBar"])).run(&program).unwrap();

    assert_eq!(member_names(&outcome.program, "com.example.FooTest"), vec!["testBar"]);
    assert_eq!(outcome.report.roots, 1);
    assert_eq!(outcome.report.methods_removed, 1);
    assert_eq!(outcome.report.removed, vec!["com.example.FooTest.helper:()V"]);
}

#[test]
fn test_child_override_keeps_base() {
    let program: Program = Program::new(vec![
        ClassDef::new("com.example.Base").with_member(MemberDef::method("run", "()V")),
        ClassDef::new("com.example.Child")
            .with_superclass("com.example.Base")
            .with_member(MemberDef::method("run", "()V")),
    ]);

    let outcome = Shrinker::new(&keep("Child", &["run"])).run(&program).unwrap();

    assert_eq!(member_names(&outcome.program, "com.example.Base"), vec!["run"]);
    assert_eq!(member_names(&outcome.program, "com.example.Child"), vec!["run"]);
    assert_eq!(outcome.report.empty_classes_retained, 0);
}

#[test]
fn test_private_methods_are_not_overrides() {
    let program: Program = Program::new(vec![
        ClassDef::new("a.Base")
            .with_member(MemberDef::method("run", "()V").with_visibility(Visibility::Private)),
        ClassDef::new("a.Child")
            .with_superclass("a.Base")
            .with_member(MemberDef::method("run", "()V")),
    ]);

    let outcome = Shrinker::new(&keep("Child", &["run"])).run(&program).unwrap();

    // Base survives as the superclass, but its private run does not
    assert!(member_names(&outcome.program, "a.Base").is_empty());
    assert_eq!(outcome.report.empty_classes_retained, 1);
}

#[test]
fn test_interface_implementations_kept() {
    let program: Program = Program::new(vec![
        ClassDef::new("a.Listener").with_member(MemberDef::method("onEvent", "(I)V")),
        ClassDef::new("a.Impl")
            .with_interface("a.Listener")
            .with_member(MemberDef::method("onEvent", "(I)V")),
        ClassDef::new("a.Bus").with_member(
            MemberDef::method("dispatch", "()V")
                .with_reference(SymbolRef::member("a.Listener", "onEvent", "(I)V")),
        ),
    ]);

    let outcome = Shrinker::new(&keep("Bus", &["dispatch"])).run(&program).unwrap();
    assert_eq!(member_names(&outcome.program, "a.Impl"), vec!["onEvent"]);
}

#[test]
fn test_owner_of_inherited_member_reference_retained() {
    let program: Program = Program::new(vec![
        ClassDef::new("a.Base").with_member(MemberDef::field("count", "I")),
        ClassDef::new("a.Child").with_superclass("a.Base"),
        ClassDef::new("a.Main").with_member(
            MemberDef::method("main", "()V")
                .with_reference(SymbolRef::member("a.Child", "count", "I")),
        ),
    ]);

    let outcome = Shrinker::new(&keep("Main", &["main"])).run(&program).unwrap();

    let names: Vec<_> = outcome.program.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a.Base", "a.Child", "a.Main"]);
    assert_eq!(member_names(&outcome.program, "a.Base"), vec!["count"]);
    assert!(member_names(&outcome.program, "a.Child").is_empty());
}

#[test]
fn test_library_method_override_kept() {
    let program: Program = Program::new(vec![
        ClassDef::new("a.Task")
            .with_superclass("java.lang.Object")
            .with_interface("java.lang.Runnable")
            .with_member(MemberDef::method("run", "()V"))
            .with_member(MemberDef::method("unused", "()V")),
        ClassDef::new("a.Main").with_member(
            MemberDef::method("main", "()V")
                .with_reference(SymbolRef::class("a.Task"))
                .with_reference(SymbolRef::member("java.lang.Runnable", "run", "()V")),
        ),
    ]);

    let outcome = Shrinker::new(&keep("Main", &["main"])).run(&program).unwrap();
    assert_eq!(member_names(&outcome.program, "a.Task"), vec!["run"]);
}

#[test]
fn test_inherited_interface_implementation_kept() {
    let program: Program = Program::new(vec![
        ClassDef::new("a.I").with_member(MemberDef::method("run", "()V")),
        ClassDef::new("a.Base").with_member(MemberDef::method("run", "()V")),
        ClassDef::new("a.Task").with_superclass("a.Base").with_interface("a.I"),
        ClassDef::new("a.Main").with_member(
            MemberDef::method("main", "()V")
                .with_reference(SymbolRef::class("a.Task"))
                .with_reference(SymbolRef::member("a.I", "run", "()V")),
        ),
    ]);

    let outcome = Shrinker::new(&keep("Main", &["main"])).run(&program).unwrap();
    assert_eq!(member_names(&outcome.program, "a.Base"), vec!["run"]);
    assert_eq!(member_names(&outcome.program, "a.I"), vec!["run"]);
    assert_eq!(outcome.report.total_removed(), 0);
}

#[test]
fn test_annotation_rule_keeps_marked_symbols() {
    let program = load_fixture("app.json");
    let config = Config {
        keep_annotations: vec!["Keep".to_string()],
        ..Config::default()
    };

    let outcome = Shrinker::new(&config).run(&program).unwrap();

    let names: Vec<_> = outcome.program.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["com.example.Unused"]);
    assert!(member_names(&outcome.program, "com.example.Unused").is_empty());
}

#[test]
fn test_entry_point_overloads() {
    let program: Program = Program::new(vec![ClassDef::new("a.App")
        .with_member(MemberDef::method("main", "([Ljava/lang/String;)V"))
        .with_member(MemberDef::method("main", "()V"))
        .with_member(MemberDef::method("mainLoop", "()V"))]);
    let config = Config {
        entry_points: vec!["a.App.main".to_string()],
        ..Config::default()
    };

    let outcome = Shrinker::new(&config).run(&program).unwrap();
    assert_eq!(member_names(&outcome.program, "a.App"), vec!["main", "main"]);
}

// ============================================================================
// Fixture pipeline
// ============================================================================

#[test]
fn test_fixture_shrink() {
    let program = load_fixture("app.json");
    let outcome = Shrinker::new(&keep("FooTest", &["testBar"])).run(&program).unwrap();
    let shrunk = &outcome.program;

    assert_eq!(member_names(shrunk, "com.example.FooTest"), vec!["testBar"]);
    assert_eq!(member_names(shrunk, "com.example.Service"), vec!["<clinit>", "start"]);
    assert_eq!(member_names(shrunk, "com.example.Task"), vec!["run"]);
    assert_eq!(member_names(shrunk, "com.example.PrintTask"), vec!["run"]);
    // Reached only through Service's static initializer
    assert_eq!(member_names(shrunk, "com.example.Registry"), vec!["register"]);

    assert!(shrunk.find_class("com.example.Marker").is_none());
    assert!(shrunk.find_class("com.example.Unused").is_none());

    let report = &outcome.report;
    assert_eq!(report.classes_removed, 2);
    assert_eq!(report.classes_retained, 5);
    assert_eq!(report.fields_removed, 1);
    assert_eq!(report.annotations_stripped, 1);
    assert!(report.rule_faults.is_empty());
    assert_eq!(
        report.removed,
        vec![
            "com.example.FooTest.counter:I",
            "com.example.FooTest.helper:()V",
            "com.example.Marker",
            "com.example.Registry.unused:()V",
            "com.example.Unused",
            "com.example.Unused.work:()V",
        ]
    );
}

#[test]
fn test_fixture_payloads_and_order_preserved() {
    let program = load_fixture("app.json");
    let outcome = Shrinker::new(&keep("FooTest", &["testBar"])).run(&program).unwrap();

    let foo = outcome.program.find_class("com.example.FooTest").unwrap();
    assert_eq!(foo.members[0].payload, Some(json!({ "code": [42, 183, 177] })));

    let service = outcome.program.find_class("com.example.Service").unwrap();
    assert_eq!(service.payload, Some(json!({ "source": "Service.java" })));
    assert!(service.annotations.is_empty());

    let original_order: Vec<_> = program
        .classes
        .iter()
        .map(|c| c.name.as_str())
        .filter(|n| outcome.program.find_class(n).is_some())
        .collect();
    let shrunk_order: Vec<_> = outcome.program.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(original_order, shrunk_order);
}

#[test]
fn test_shrunk_output_is_closed() {
    let program = load_fixture("app.json");
    let once = Shrinker::new(&keep("FooTest", &["testBar"])).run(&program).unwrap();

    // Every reference in the output resolves, and shrinking again changes nothing
    let twice = Shrinker::new(&keep("FooTest", &["testBar"])).run(&once.program).unwrap();
    assert_eq!(once.program, twice.program);
    assert_eq!(twice.report.total_removed(), 0);
}

#[test]
fn test_parallel_matches_sequential_on_fixture() {
    let program = load_fixture("app.json");
    let sequential = Shrinker::new(&keep("FooTest", &["testBar"])).run(&program).unwrap();

    let mut config = keep("FooTest", &["testBar"]);
    config.analysis.parallel = true;
    let parallel = Shrinker::new(&config).run(&program).unwrap();

    assert_eq!(sequential.program, parallel.program);
    assert_eq!(sequential.report, parallel.report);
}

// ============================================================================
// Fatal errors
// ============================================================================

#[test]
fn test_unresolved_member_fails_graph_stage() {
    let program = load_fixture("broken.json");
    let err = Shrinker::new(&keep("Main", &["main"])).run(&program).unwrap_err();

    assert_eq!(err.stage(), Stage::Graph);
    assert_eq!(
        err,
        ShrinkError::UnresolvedMember {
            from: "com.example.Main.main:([Ljava/lang/String;)V".to_string(),
            target: "com.example.Helper.missing:()V".to_string(),
        }
    );
}

#[test]
fn test_duplicate_class_fails() {
    let program: Program = Program::new(vec![ClassDef::new("a.A"), ClassDef::new("a.A")]);
    let err = Shrinker::new(&Config::default()).run(&program).unwrap_err();
    assert!(matches!(err, ShrinkError::DuplicateSymbol { .. }));
}

#[test]
fn test_external_references_are_boundaries() {
    let program: Program = Program::new(vec![ClassDef::new("a.View")
        .with_superclass("android.view.View")
        .with_member(
            MemberDef::method("draw", "()V")
                // Inherited from the platform class, so not an error
                .with_reference(SymbolRef::member("a.View", "invalidate", "()V"))
                .with_reference(SymbolRef::class("android.graphics.Canvas")),
        )]);

    let outcome = Shrinker::new(&keep("View", &["draw"])).run(&program).unwrap();
    assert_eq!(member_names(&outcome.program, "a.View"), vec!["draw"]);
    assert!(outcome.report.reached >= 5);
}
