//! Method strategy, parameters included.

use std::sync::Arc;

use weft_advice::context::ExecutionContext;
use weft_core::annotation::Annotation;
use weft_core::error::{Fault, WeavingError};
use weft_core::object::{Method, MethodDef, MethodFn, ObjectRef};
use weft_core::symbol::{ClassId, ParamTarget, SymbolId, Target};
use weft_core::value::Value;

use super::{WeaveContext, WeavingStrategy, effective};
use crate::around::resume;

/// Weaves one method of a class.
///
/// `inherited` holds the annotations of the same-named method of the parent
/// class, if any.
pub(crate) struct MethodStrategy {
    class: ClassId,
    inherited: Option<Vec<Annotation>>,
}

impl MethodStrategy {
    pub(crate) fn new(class: ClassId, inherited: Option<Vec<Annotation>>) -> Self {
        Self { class, inherited }
    }
}

impl WeavingStrategy for MethodStrategy {
    type Definition = MethodDef;
    type Member = Method;

    fn describe(&self, definition: &MethodDef) -> Target {
        let parameters = definition
            .params()
            .iter()
            .enumerate()
            .map(|(index, param)| ParamTarget::new(index, param.name(), param.annotations().to_vec()))
            .collect();
        Target::new(
            SymbolId::method(self.class.clone(), definition.name(), definition.is_static()),
            definition.name(),
            effective(definition.annotations(), self.inherited.as_deref()),
        )
        .with_static(definition.is_static())
        .with_parameters(parameters)
    }

    fn link(&self, cx: &WeaveContext<'_>, method: &Method, target: Target) -> Result<(), WeavingError> {
        let pipeline = cx.pipeline(&target);
        let body = Arc::clone(method.definition().body());
        if pipeline.is_empty() {
            return method.slot().install(method.symbol(), body);
        }

        let target = Arc::new(target);
        let woven: Arc<MethodFn> = Arc::new(move |this: &ObjectRef, args: &[Value]| -> Result<Value, Fault> {
            let mut ctx = ExecutionContext::new(Arc::clone(&target), Some(this.clone()), args.to_vec());
            pipeline.run(&mut ctx, resume(|args| body(this, &args)))
        });
        method.slot().install(method.symbol(), woven)
    }
}
