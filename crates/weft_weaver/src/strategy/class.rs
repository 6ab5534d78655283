//! Class strategy: the constructor pipeline.
//!
//! A woven constructor hands advice a placeholder instance. The innermost join
//! point constructs a fresh object, runs the compiled constructor chain on it
//! and merges its fields onto the placeholder, which is then what the caller
//! receives. Around advice that never proceeds still yields the placeholder,
//! so `instance_of` holds whatever the advice did.

use std::sync::{Arc, Weak};

use weft_advice::context::ExecutionContext;
use weft_core::error::{Fault, WeavingError};
use weft_core::object::{Class, ClassDef, ClassRef, ConstructFn, ObjectRef};
use weft_core::symbol::{ClassId, SymbolId, Target};
use weft_core::value::Value;

use super::{WeaveContext, WeavingStrategy, effective};
use crate::around::resume;
use crate::pipeline::Pipeline;

/// Weaves the class symbol of one class.
pub(crate) struct ClassStrategy {
    id: ClassId,
    parent: Option<ClassRef>,
}

impl ClassStrategy {
    pub(crate) fn new(id: ClassId, parent: Option<ClassRef>) -> Self {
        Self { id, parent }
    }
}

impl WeavingStrategy for ClassStrategy {
    type Definition = ClassDef;
    type Member = ClassRef;

    fn describe(&self, definition: &ClassDef) -> Target {
        Target::new(
            SymbolId::class(self.id.clone()),
            definition.name(),
            effective(
                definition.annotations(),
                self.parent.as_ref().map(|p| p.annotations()),
            ),
        )
    }

    fn link(&self, cx: &WeaveContext<'_>, class: &ClassRef, target: Target) -> Result<(), WeavingError> {
        let pipeline = cx.pipeline(&target);
        let symbol = class.symbol();
        let weak = Arc::downgrade(class);
        let name = class.name().to_owned();

        let construct: Arc<ConstructFn> = if pipeline.is_empty() {
            Arc::new(move |args: &[Value]| -> Result<ObjectRef, Fault> {
                let class = upgrade(&weak, &name)?;
                let this = ObjectRef::new(&class);
                class.initialize(&this, args)?;
                Ok(this)
            })
        } else {
            let target = Arc::new(target);
            Arc::new(move |args: &[Value]| -> Result<ObjectRef, Fault> {
                let class = upgrade(&weak, &name)?;
                construct_woven(&class, &target, &pipeline, args)
            })
        };
        class.constructor_slot().install(&symbol, construct)
    }
}

fn upgrade(weak: &Weak<Class>, name: &str) -> Result<ClassRef, Fault> {
    weak.upgrade().ok_or_else(|| {
        Fault::from(WeavingError::Unlinked {
            symbol: name.to_owned(),
        })
    })
}

/// Runs the constructor pipeline of `class`.
///
/// The placeholder is marked ready once the pipeline settles, whether or not
/// the constructor body ran. An around advice that never proceeds therefore
/// yields a ready instance with no fields set, and after advice can read it.
fn construct_woven(
    class: &ClassRef,
    target: &Arc<Target>,
    pipeline: &Pipeline,
    args: &[Value],
) -> Result<ObjectRef, Fault> {
    let placeholder = ObjectRef::pending(class);
    let mut ctx = ExecutionContext::new(Arc::clone(target), Some(placeholder.clone()), args.to_vec());

    let body = resume(|args| {
        let fresh = ObjectRef::new(class);
        class.initialize(&fresh, &args)?;
        placeholder.absorb(&fresh);
        placeholder.mark_ready();
        Ok(Value::Object(placeholder.clone()))
    });
    let result = pipeline.run_with(&mut ctx, body, |value| {
        // Released even when the body was skipped.
        placeholder.mark_ready();
        instance(target, &placeholder, value)
            .map(Value::Object)
            .map_err(Fault::from)
    });
    placeholder.mark_ready();

    instance(target, &placeholder, result?).map_err(Fault::from)
}

/// Maps what the pipeline produced to the constructed instance.
fn instance(target: &Target, placeholder: &ObjectRef, value: Value) -> Result<ObjectRef, WeavingError> {
    match value {
        Value::Object(object) => Ok(object),
        Value::Undefined => Ok(placeholder.clone()),
        other => {
            tracing::warn!(target_symbol = %target, found = other.type_name(), "constructor produced a non-object");
            Err(WeavingError::InvalidInstance {
                symbol: target.to_string(),
                found: other.type_name(),
            })
        }
    }
}
