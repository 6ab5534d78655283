//! Weaver lifecycle: registration, sealing, reset and profiles.


use weft_advice::prelude::*;
use weft_core::prelude::*;
use weft_weaver::prelude::*;

use test_utils::*;

fn logged_methods() -> PointcutExpr {
    on::methods().with_annotation(logged())
}

fn traced_class() -> ClassDef {
    ClassDef::new("Svc").method(echo("run").annotate(&logged()))
}

/// Runs `Svc.run` once and returns what the advice logged.
fn run_once(weaver: &Weaver, log: &Log) -> Vec<String> {
    log.clear();
    let class = weaver.define(traced_class()).unwrap();
    class.construct(&[]).unwrap().invoke("run", &[]).unwrap();
    log.entries()
}

fn tracer(log: &Log, name: &str, priority: i32) -> Aspect {
    AspectDef::new(name)
        .priority(priority)
        .advice(log_before(log, name).on(logged_methods()))
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEALING
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that every registration operation is refused once a class was
/// defined.
#[test]
fn sealed_weaver_rejects_registration() {
    let log = Log::new();
    let weaver = Weaver::new();
    weaver.enable(tracer(&log, "A", 0)).unwrap();
    weaver.define(traced_class()).unwrap();

    assert!(matches!(
        weaver.enable(tracer(&log, "B", 0)).unwrap_err(),
        WeavingError::Sealed { .. }
    ));
    assert!(matches!(
        weaver.disable(["A"]).unwrap_err(),
        WeavingError::Sealed { .. }
    ));
    assert!(matches!(
        weaver
            .merge(AspectProfile::new().add(tracer(&log, "C", 0)))
            .unwrap_err(),
        WeavingError::Sealed { .. }
    ));
    assert!(weaver.is_enabled("A"));
}

/// Verifies that sealing explicitly behaves like a first definition.
#[test]
fn explicit_seal() {
    let weaver = Weaver::new();
    weaver.seal();
    weaver.seal();
    assert_eq!(weaver.state(), BuildState::Sealed);
    assert!(weaver.enable(tracer(&Log::new(), "A", 0)).is_err());
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESET & CONSUMPTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that after a reset, aspects targeting what compiled symbols
/// already consumed are refused while unrelated aspects are accepted.
#[test]
fn reset_keeps_consumed_annotations() {
    let log = Log::new();
    let weaver = Weaver::new();
    weaver.enable(tracer(&log, "A", 0)).unwrap();
    weaver.define(traced_class()).unwrap();

    weaver.reset();
    assert_eq!(weaver.state(), BuildState::Open);
    assert!(weaver.aspects().is_empty());

    let err = weaver.enable(tracer(&log, "A", 0)).unwrap_err();
    assert!(matches!(err, WeavingError::AnnotationConsumed { .. }));

    let err = weaver
        .enable(aspect("Everything", log_before(&log, "all").on(on::methods())))
        .unwrap_err();
    assert!(matches!(
        err,
        WeavingError::KindConsumed {
            kind: SymbolKind::Method,
            ..
        }
    ));

    weaver
        .enable(aspect(
            "Fresh",
            log_before(&log, "fresh").on(on::properties().with_annotation(audited())),
        ))
        .unwrap();
    assert!(weaver.is_enabled("Fresh"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENABLE / DISABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that enabling X, disabling it and enabling an equivalent X'
/// yields the same pipeline as never disabling X.
#[test]
fn disable_then_enable_equivalent_is_transparent() {
    let log = Log::new();

    let untouched = Weaver::new();
    untouched
        .enable(vec![tracer(&log, "A", 1), tracer(&log, "X", 5)])
        .unwrap();
    let expected = run_once(&untouched, &log);

    let churned = Weaver::new();
    churned
        .enable(vec![tracer(&log, "A", 1), tracer(&log, "X", 5)])
        .unwrap();
    churned.disable(["X"]).unwrap();
    churned.enable(tracer(&log, "X", 5)).unwrap();
    let actual = run_once(&churned, &log);

    assert_eq!(expected, ["X", "A"]);
    assert_eq!(actual, expected);
}

/// Verifies that disabled aspects no longer weave new classes.
#[test]
fn disabled_aspects_do_not_weave() {
    let log = Log::new();
    let weaver = Weaver::new();
    weaver.enable(tracer(&log, "A", 0)).unwrap();
    weaver.disable(["A"]).unwrap();
    assert!(run_once(&weaver, &log).is_empty());
}

/// Verifies that re-enabling an aspect under a new id registers its advice
/// without duplicating entries already registered.
#[test]
fn aliased_aspect_shares_advice() {
    let log = Log::new();
    let weaver = Weaver::new();
    let original = tracer(&log, "A", 0);
    weaver.enable(original.clone()).unwrap();
    weaver.enable(original.with_id("A2")).unwrap();

    assert!(weaver.is_enabled("A2"));
    assert_eq!(run_once(&weaver, &log), ["A"]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROFILES
// ═══════════════════════════════════════════════════════════════════════════════

struct Observability {
    log: Log,
}

impl AspectGroup for Observability {
    fn build(self) -> AspectProfile {
        AspectProfile::new()
            .add(tracer(&self.log, "Metrics", 0))
            .add(tracer(&self.log, "Logging", 0))
    }
}

/// Verifies that a customized profile merges in its final order and that
/// already enabled aspects are skipped.
#[test]
fn profile_merges_in_order() {
    let log = Log::new();
    let weaver = Weaver::new();
    weaver.enable(tracer(&log, "Logging", 0)).unwrap();

    let profile = Observability { log: log.clone() }
        .build()
        .add_before("Metrics", tracer(&log, "Timing", 0))
        .disable("Metrics");
    assert_eq!(profile.ids(), ["Timing", "Logging"]);

    weaver.merge(profile).unwrap();
    let ids: Vec<String> = weaver.aspects().iter().map(|a| a.id().to_string()).collect();
    assert_eq!(ids, ["Logging", "Timing"]);
    assert_eq!(run_once(&weaver, &log), ["Logging", "Timing"]);
}

/// Verifies that configuration loads from JSON with defaults for missing
/// keys.
#[test]
fn config_from_json() {
    let config = WeaverConfig::from_json(r#"{ "trace_advice": true }"#).unwrap();
    assert!(config.trace_advice());
    assert_eq!(config.max_compile_passes(), WeaverConfig::default().max_compile_passes());

    let weaver = Weaver::with_config(config);
    assert!(weaver.config().trace_advice());
}
