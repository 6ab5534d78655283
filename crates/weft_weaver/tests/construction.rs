//! Constructor pipelines and class inheritance.


use weft_advice::prelude::*;
use weft_core::prelude::*;
use weft_weaver::prelude::*;

use test_utils::*;

fn entities() -> PointcutExpr {
    on::classes().with_annotation(entity())
}

/// `User` class whose constructor records itself and stores its first
/// argument as `name`.
fn user(log: &Log) -> ClassDef {
    let log = log.clone();
    ClassDef::new("User")
        .annotate(&entity())
        .constructor(move |this, args| {
            log.push("ctor");
            this.set_field("name", args.first().cloned().unwrap_or_default());
            Ok(())
        })
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLACEHOLDER INSTANCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that around advice that never proceeds skips every constructor
/// side effect while the caller still gets an instance of the class.
#[test]
fn around_without_proceed_skips_the_constructor() {
    let log = Log::new();
    let weaver = Weaver::new();
    weaver
        .enable(aspect(
            "Veto",
            Advice::around("veto", |_, _, _| Ok(Value::Undefined)).on(entities()),
        ))
        .unwrap();

    let class = weaver.define(user(&log)).unwrap();
    let instance = class.construct(&[Value::from("ada")]).unwrap();

    assert!(log.entries().is_empty());
    assert!(instance.instance_of(&class));
    assert!(instance.is_ready());
    assert!(!instance.has_field("name"));
}

/// Verifies that a skipped constructor still releases the placeholder, so
/// after advice reads a ready instance that has none of the constructor's
/// fields.
#[test]
fn skipped_constructor_still_releases_the_instance() {
    let log = Log::new();
    let seen = log.clone();
    let weaver = Weaver::new();
    weaver
        .enable(
            AspectDef::new("Veto")
                .advice(Advice::around("veto", |_, _, _| Ok(Value::Undefined)).on(entities()))
                .advice(
                    Advice::after_return("inspect", move |ctx, value| {
                        let instance = ctx.instance()?;
                        seen.push(format!("ready {} name {}", instance.is_ready(), instance.has_field("name")));
                        Ok(value)
                    })
                    .on(entities()),
                )
                .build(),
        )
        .unwrap();

    let class = weaver.define(user(&log)).unwrap();
    let instance = class.construct(&[Value::from("ada")]).unwrap();

    assert_eq!(log.entries(), ["ready true name false"]);
    assert!(instance.is_ready());
}

/// Verifies that before advice cannot read the instance, while after advice
/// sees the constructed one.
#[test]
fn instance_is_readable_only_after_construction() {
    let log = Log::new();
    let (before_log, after_log) = (log.clone(), log.clone());
    let weaver = Weaver::new();
    weaver
        .enable(
            AspectDef::new("Inspect")
                .advice(
                    Advice::before("early", move |ctx| {
                        match ctx.instance() {
                            Err(WeavingError::UninitializedInstance { class }) => {
                                before_log.push(format!("uninitialized {class}"));
                            }
                            other => before_log.push(format!("unexpected {other:?}")),
                        }
                        Ok(Value::Undefined)
                    })
                    .on(entities()),
                )
                .advice(
                    Advice::after("late", move |ctx| {
                        let instance = ctx.instance()?;
                        after_log.push(format!("name {}", instance.field("name")));
                        Ok(Value::Undefined)
                    })
                    .on(entities()),
                )
                .build(),
        )
        .unwrap();

    let class = weaver.define(user(&log)).unwrap();
    let instance = class.construct(&[Value::from("ada")]).unwrap();

    assert_eq!(instance.field("name"), Value::from("ada"));
    assert_eq!(log.entries(), ["uninitialized User", "ctor", "name ada"]);
}

/// Verifies that reading the instance in around advice is refused before
/// proceeding and allowed afterwards.
#[test]
fn around_reads_the_instance_after_proceeding() {
    let log = Log::new();
    let seen = log.clone();
    let weaver = Weaver::new();
    weaver
        .enable(aspect(
            "Wrap",
            Advice::around("wrap", move |ctx, jp, args| {
                seen.push(format!("before ready: {}", ctx.instance().is_ok()));
                let value = jp.proceed(args)?;
                seen.push(format!("after ready: {}", ctx.instance().is_ok()));
                Ok(value)
            })
            .on(entities()),
        ))
        .unwrap();

    let class = weaver.define(user(&log)).unwrap();
    let instance = class.construct(&[Value::from("ada")]).unwrap();

    assert!(instance.instance_of(&class));
    assert_eq!(
        log.entries(),
        ["before ready: false", "ctor", "after ready: true"]
    );
}

/// Verifies that around advice may hand back a different object.
#[test]
fn around_may_substitute_the_instance() {
    let log = Log::new();
    let weaver = Weaver::new();
    let substitute = ObjectRef::detached("substitute");
    let handed_out = substitute.clone();
    weaver
        .enable(aspect(
            "Pool",
            Advice::around("pooled", move |_, _, _| Ok(Value::Object(handed_out.clone()))).on(entities()),
        ))
        .unwrap();

    let class = weaver.define(user(&log)).unwrap();
    let instance = class.construct(&[]).unwrap();
    assert_eq!(instance, substitute);
}

/// Verifies that a constructor pipeline producing a non-object is a
/// structural error.
#[test]
fn non_object_results_are_rejected() {
    let log = Log::new();
    let weaver = Weaver::new();
    weaver
        .enable(aspect(
            "Broken",
            Advice::around("number", |_, _, _| Ok(Value::Int(3))).on(entities()),
        ))
        .unwrap();

    let class = weaver.define(user(&log)).unwrap();
    let err = class.construct(&[]).unwrap_err();
    assert!(matches!(
        err,
        Fault::Weaving(WeavingError::InvalidInstance { found: "int", .. })
    ));
}

/// Verifies that after-throw advice can recover from a failing constructor.
#[test]
fn failing_constructor_reaches_after_throw() {
    let weaver = Weaver::new();
    weaver
        .enable(aspect(
            "Fallback",
            Advice::after_throw("fallback", |_, _| Ok(Value::Undefined)).on(entities()),
        ))
        .unwrap();

    let class = weaver
        .define(
            ClassDef::new("Fragile")
                .annotate(&entity())
                .constructor(|_, _| Err(Fault::msg("no"))),
        )
        .unwrap();

    let instance = class.construct(&[]).unwrap();
    assert!(instance.instance_of(&class));
    assert!(instance.is_ready());
}

/// Verifies that an unwoven class constructs without a placeholder.
#[test]
fn unwoven_class_constructs_directly() {
    let log = Log::new();
    let weaver = Weaver::new();
    let class = weaver.define(user(&log)).unwrap();
    let instance = class.construct(&[Value::from("bob")]).unwrap();

    assert_eq!(instance.field("name"), Value::from("bob"));
    assert_eq!(log.entries(), ["ctor"]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// INHERITANCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that a subclass constructor runs the parent's constructor first
/// and that its instances are instances of the parent.
#[test]
fn subclass_runs_parent_constructor_first() {
    let log = Log::new();
    let child_log = log.clone();
    let weaver = Weaver::new();
    let parent = weaver.define(user(&log)).unwrap();
    let admin = weaver
        .define(
            ClassDef::new("Admin")
                .extends(&parent)
                .constructor(move |this, _| {
                    child_log.push("admin ctor");
                    this.set_field("role", "admin");
                    Ok(())
                }),
        )
        .unwrap();

    let instance = admin.construct(&[Value::from("root")]).unwrap();
    assert_eq!(log.entries(), ["ctor", "admin ctor"]);
    assert!(instance.instance_of(&admin));
    assert!(instance.instance_of(&parent));
    assert_eq!(instance.field("name"), Value::from("root"));
    assert_eq!(instance.field("role"), Value::from("admin"));
}

/// Verifies that class annotations are inherited, so advice on the parent's
/// annotation also weaves the subclass.
#[test]
fn inherited_class_annotations_select_advice() {
    let log = Log::new();
    let weaver = Weaver::new();
    weaver
        .enable(aspect("Trace", log_before(&log, "entity").on(entities())))
        .unwrap();

    let parent = weaver.define(user(&Log::new())).unwrap();
    let admin = weaver
        .define(ClassDef::new("Admin").extends(&parent))
        .unwrap();

    assert!(admin.annotations().iter().any(|a| a.is(&entity())));
    admin.construct(&[]).unwrap();
    assert_eq!(log.entries(), ["entity"]);
}

/// Verifies that an overriding method inherits the annotations of the
/// method it overrides, across several levels.
#[test]
fn overriding_methods_inherit_annotations() {
    let log = Log::new();
    let weaver = Weaver::new();
    weaver
        .enable(aspect(
            "Trace",
            log_before(&log, "logged").on(on::methods().with_annotation(logged())),
        ))
        .unwrap();

    let base = weaver
        .define(ClassDef::new("Base").method(echo("save").annotate(&logged())))
        .unwrap();
    let middle = weaver
        .define(ClassDef::new("Middle").extends(&base).method(echo("save")))
        .unwrap();
    let leaf = weaver
        .define(ClassDef::new("Leaf").extends(&middle).method(echo("save")))
        .unwrap();

    leaf.construct(&[]).unwrap().invoke("save", &[]).unwrap();
    assert_eq!(log.entries(), ["logged"]);
}

/// Verifies that inherited methods dispatch through the parent's woven
/// definition.
#[test]
fn inherited_methods_keep_their_weaving() {
    let log = Log::new();
    let weaver = Weaver::new();
    weaver
        .enable(aspect(
            "Trace",
            log_before(&log, "logged").on(on::methods().with_annotation(logged())),
        ))
        .unwrap();

    let base = weaver
        .define(ClassDef::new("Base").method(echo("save").annotate(&logged())))
        .unwrap();
    let child = weaver.define(ClassDef::new("Child").extends(&base)).unwrap();

    let value = child
        .construct(&[])
        .unwrap()
        .invoke("save", &[Value::Int(4)])
        .unwrap();
    assert_eq!(value, Value::Int(4));
    assert_eq!(log.entries(), ["logged"]);
}
