//! The aspects of the audit service.

use weft_advice::advice::Advice;
use weft_advice::aspect::{Aspect, AspectDef};
use weft_advice::context::BeforeContext;
use weft_advice::pointcut::{PointcutExpr, on};
use weft_core::annotation::AnnotationRef;
use weft_core::compiled::CompiledSymbol;
use weft_core::error::{Fault, Thrown};
use weft_core::object::MethodDef;
use weft_core::value::Value;
use weft_weaver::profile::{AspectGroup, AspectProfile};

use crate::annotations::{audited, entity, logged, not_blank, positive};
use crate::trail::{AuditEvent, AuditTrail};

/// Raised by the validation aspect before the body runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// `@Positive` parameter received zero, a negative number or no number.
    #[error("{param} must be positive, got {found}")]
    NotPositive {
        /// Parameter name.
        param: String,
        /// Rendered argument.
        found: String,
    },
    /// `@NotBlank` parameter received an empty or non-string value.
    #[error("{param} must not be blank")]
    Blank {
        /// Parameter name.
        param: String,
    },
}

/// The three aspects of the service, sharing one [`AuditTrail`].
///
/// ```
/// use example::{AuditAspects, AuditTrail};
/// use weft_weaver::profile::AspectGroup;
///
/// let profile = AuditAspects::new(AuditTrail::new()).build();
/// assert_eq!(profile.ids(), ["Validation", "Logging", "Audit"]);
/// ```
#[derive(Debug, Clone)]
pub struct AuditAspects {
    trail: AuditTrail,
}

impl AuditAspects {
    /// Creates the group writing to `trail`.
    #[must_use]
    pub fn new(trail: AuditTrail) -> Self {
        Self { trail }
    }

    /// Rejects bad arguments before any other advice runs.
    #[must_use]
    pub fn validation(&self) -> Aspect {
        AspectDef::new("Validation")
            .priority(100)
            .advice(
                Advice::before("positive", check(&self.trail, |param, value| {
                    let positive = match value {
                        Value::Int(n) => *n > 0,
                        Value::Float(x) => *x > 0.0,
                        _ => false,
                    };
                    (!positive).then(|| ValidationError::NotPositive {
                        param: param.to_owned(),
                        found: value.to_string(),
                    })
                }))
                .on(parameters_with(positive())),
            )
            .advice(
                Advice::before("not_blank", check(&self.trail, |param, value| {
                    let blank = value.as_str().is_none_or(|s| s.trim().is_empty());
                    blank.then(|| ValidationError::Blank {
                        param: param.to_owned(),
                    })
                }))
                .on(parameters_with(not_blank())),
            )
            .build()
    }

    /// Logs logged calls, their failures and entity construction.
    #[must_use]
    pub fn logging(&self) -> Aspect {
        let returned = self.trail.clone();
        let failed = self.trail.clone();
        let created = self.trail.clone();
        AspectDef::new("Logging")
            .priority(10)
            .advice(
                Advice::around("log_call", move |ctx, jp, args| {
                    let symbol = ctx.target().id().to_string();
                    let span = tracing::info_span!("call", %symbol);
                    let _entered = span.enter();
                    tracing::info!(args = ?args, "calling");
                    let value = jp.proceed(args)?;
                    tracing::info!(%value, "returned");
                    returned.record(symbol, AuditEvent::Returned, value.to_string());
                    Ok(value)
                })
                .on(on::methods().with_annotation(logged())),
            )
            .advice(
                Advice::after_throw("log_failure", move |ctx, error| {
                    let symbol = ctx.target().id().to_string();
                    tracing::warn!(%symbol, %error, "call failed");
                    failed.record(symbol, AuditEvent::Failed, error.to_string());
                    Err(error.into())
                })
                .on(on::methods().with_annotation(logged())),
            )
            .advice(
                Advice::after("log_created", move |ctx| {
                    if ctx.error().is_none() {
                        let instance = ctx.instance()?;
                        tracing::info!(class = ctx.target().name(), id = instance.id(), "created");
                        created.record(
                            ctx.target().id().to_string(),
                            AuditEvent::Created,
                            instance.field("owner").to_string(),
                        );
                    }
                    Ok(Value::Undefined)
                })
                .on(on::classes().with_annotation(entity())),
            )
            .build()
    }

    /// Records writes to audited properties and gives entities a `describe`
    /// method.
    #[must_use]
    pub fn audit(&self) -> Aspect {
        let changed = self.trail.clone();
        AspectDef::new("Audit")
            .advice(
                Advice::after_return("record_change", move |ctx, value| {
                    changed.record(
                        ctx.target().id().to_string(),
                        AuditEvent::Changed,
                        ctx.arg(0).to_string(),
                    );
                    Ok(value)
                })
                .on(on::properties().with_annotation(audited()).setters()),
            )
            .advice(
                Advice::compile("describe", |ctx| {
                    let Some(class) = ctx.definition().as_class() else {
                        return Ok(None);
                    };
                    if class.methods().iter().any(|m| m.name() == "describe") {
                        return Ok(None);
                    }
                    let extended = class.clone().method(MethodDef::new("describe", |this, _| {
                        let fields: serde_json::Map<String, serde_json::Value> = this
                            .fields()
                            .into_iter()
                            .map(|(name, value)| (name, serde_json::Value::String(value.to_string())))
                            .collect();
                        Ok(Value::from(serde_json::Value::Object(fields).to_string()))
                    }));
                    Ok(Some(CompiledSymbol::Class(extended)))
                })
                .on(on::classes().with_annotation(entity())),
            )
            .build()
    }
}

impl AspectGroup for AuditAspects {
    fn build(self) -> AspectProfile {
        AspectProfile::new()
            .add(self.validation())
            .add(self.logging())
            .add(self.audit())
    }
}

fn parameters_with(annotation: AnnotationRef) -> PointcutExpr {
    on::parameters().with_annotation(annotation)
}

/// Before advice body that runs `rule` on every matched parameter and throws
/// the first violation.
fn check<R>(
    trail: &AuditTrail,
    rule: R,
) -> impl Fn(&BeforeContext<'_>) -> Result<Value, Fault> + Send + Sync + 'static
where
    R: Fn(&str, &Value) -> Option<ValidationError> + Send + Sync + 'static,
{
    let trail = trail.clone();
    move |ctx| {
        for param in ctx.parameters() {
            if let Some(error) = rule(param.name(), &ctx.arg(param.index())) {
                let symbol = ctx.target().id().to_string();
                tracing::warn!(%symbol, %error, "argument rejected");
                trail.record(symbol, AuditEvent::Rejected, error.to_string());
                return Err(Thrown::new(error).into());
            }
        }
        Ok(Value::Undefined)
    }
}
