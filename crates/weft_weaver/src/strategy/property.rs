//! Property strategy.
//!
//! One compiled accessor pair, two independent pipelines: reads are selected
//! with a getter scope and writes with a setter scope, so advice limited with
//! `getters()` or `setters()` only runs on its side.

use std::sync::Arc;

use weft_advice::context::ExecutionContext;
use weft_core::annotation::Annotation;
use weft_core::error::{Fault, WeavingError};
use weft_core::object::{GetterFn, ObjectRef, Property, PropertyDef, SetterFn};
use weft_core::symbol::{Accessor, ClassId, SymbolId, Target};
use weft_core::value::Value;

use super::{WeaveContext, WeavingStrategy, effective};
use crate::around::resume;

/// Weaves one property of a class.
pub(crate) struct PropertyStrategy {
    class: ClassId,
    inherited: Option<Vec<Annotation>>,
}

impl PropertyStrategy {
    pub(crate) fn new(class: ClassId, inherited: Option<Vec<Annotation>>) -> Self {
        Self { class, inherited }
    }
}

impl WeavingStrategy for PropertyStrategy {
    type Definition = PropertyDef;
    type Member = Property;

    fn describe(&self, definition: &PropertyDef) -> Target {
        Target::new(
            SymbolId::property(self.class.clone(), definition.name()),
            definition.name(),
            effective(definition.annotations(), self.inherited.as_deref()),
        )
    }

    fn link(&self, cx: &WeaveContext<'_>, property: &Property, target: Target) -> Result<(), WeavingError> {
        let read = Arc::new(target.clone().with_accessor(Accessor::Get));
        let write = Arc::new(target.with_accessor(Accessor::Set));
        let get_pipeline = cx.pipeline(&read);
        let set_pipeline = cx.pipeline(&write);
        let getter = Arc::clone(property.definition().getter());
        let setter = Arc::clone(property.definition().setter());

        let linked_get: Arc<GetterFn> = if get_pipeline.is_empty() {
            getter
        } else {
            Arc::new(move |this: &ObjectRef| -> Result<Value, Fault> {
                let mut ctx = ExecutionContext::new(Arc::clone(&read), Some(this.clone()), Vec::new());
                get_pipeline.run(&mut ctx, resume(|_| getter(this)))
            })
        };
        let linked_set: Arc<SetterFn> = if set_pipeline.is_empty() {
            setter
        } else {
            Arc::new(move |this: &ObjectRef, value: Value| -> Result<(), Fault> {
                let mut ctx = ExecutionContext::new(Arc::clone(&write), Some(this.clone()), vec![value]);
                set_pipeline.run(
                    &mut ctx,
                    resume(|args| {
                        setter(this, args.into_iter().next().unwrap_or_default())?;
                        Ok(Value::Undefined)
                    }),
                )?;
                Ok(())
            })
        };

        property.getter_slot().install(property.symbol(), linked_get)?;
        property.setter_slot().install(property.symbol(), linked_set)
    }
}
