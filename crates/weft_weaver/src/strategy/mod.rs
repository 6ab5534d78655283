//! Weaving strategies, one per symbol kind.
//!
//! A strategy knows how to describe a definition of its kind as a
//! [`Target`], how to compile it through the fixed point, and how to link the
//! compiled definition into the slots of an installed member.
//!
//! | Strategy | Definition | Linked into |
//! |----------|------------|-------------|
//! | [`ClassStrategy`] | [`ClassDef`](weft_core::object::ClassDef) | the class constructor slot |
//! | [`MethodStrategy`] | [`MethodDef`](weft_core::object::MethodDef) | the method body slot |
//! | [`PropertyStrategy`] | [`PropertyDef`](weft_core::object::PropertyDef) | the getter and setter slots, one pipeline each |
//!
//! Parameters have no strategy of their own: parameter advice is selected
//! together with the owning method.

mod class;
mod method;
mod property;

use std::sync::Arc;

pub(crate) use class::ClassStrategy;
pub(crate) use method::MethodStrategy;
pub(crate) use property::PropertyStrategy;
use weft_advice::registry::AdviceRegistry;
use weft_advice::selection::Scope;
use weft_core::annotation::Annotation;
use weft_core::error::WeavingError;
use weft_core::symbol::{SymbolKind, Target};

use crate::compile::{Compilable, Compiler};
use crate::config::WeaverConfig;
use crate::pipeline::Pipeline;

/// Scopes a target is selected with.
///
/// Method targets with parameters add a parameter scope holding the union of
/// their parameters' annotations. Accessor targets narrow their scope to the
/// accessor.
pub(crate) fn scopes(target: &Target) -> Vec<Scope> {
    let own = Scope::of(target.kind(), target.annotations());
    let mut scopes = vec![match target.accessor() {
        Some(accessor) => own.with_accessor(accessor),
        None => own,
    }];
    if target.kind() == SymbolKind::Method && !target.parameters().is_empty() {
        scopes.push(Scope::new(
            SymbolKind::Parameter,
            target
                .parameters()
                .iter()
                .flat_map(|p| p.annotations().iter().map(|a| a.reference().clone())),
        ));
    }
    scopes
}

/// Weaver state borrowed while one class is being defined.
pub(crate) struct WeaveContext<'w> {
    registry: &'w AdviceRegistry,
    config: &'w WeaverConfig,
    compiler: Compiler<'w>,
}

impl<'w> WeaveContext<'w> {
    pub(crate) fn new(registry: &'w AdviceRegistry, config: &'w WeaverConfig, compiler: Compiler<'w>) -> Self {
        Self {
            registry,
            config,
            compiler,
        }
    }

    /// Resolves the runtime advice of `target`.
    pub(crate) fn pipeline(&self, target: &Target) -> Arc<Pipeline> {
        let pipeline = Pipeline::resolve(self.registry, &scopes(target), self.config.trace_advice());
        tracing::trace!(target_symbol = %target, advice = pipeline.len(), "pipeline resolved");
        Arc::new(pipeline)
    }
}

/// Compiles and links one symbol kind.
pub(crate) trait WeavingStrategy {
    /// Definition compiled by the strategy.
    type Definition: Compilable;
    /// Installed member the compiled definition is linked into.
    type Member: ?Sized;

    /// Describes `definition`, with inherited annotations merged in.
    fn describe(&self, definition: &Self::Definition) -> Target;

    /// Runs the compile fixed point on `definition`.
    fn compile(
        &self,
        cx: &WeaveContext<'_>,
        definition: Self::Definition,
    ) -> Result<(Self::Definition, Target), WeavingError> {
        cx.compiler.compile(definition, |d| self.describe(d))
    }

    /// Installs the linked definition of `member`.
    fn link(&self, cx: &WeaveContext<'_>, member: &Self::Member, target: Target) -> Result<(), WeavingError>;
}

/// Annotations of `own` followed by the `inherited` ones it does not repeat.
pub(crate) fn effective(own: &[Annotation], inherited: Option<&[Annotation]>) -> Vec<Annotation> {
    weft_core::annotation::merge_inherited(own, inherited.unwrap_or_default())
}
