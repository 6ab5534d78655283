//! Compile-phase fixed point.
//!
//! Compile advice runs once per `(advice, symbol)` pair. Each advice may hand
//! back a replacement definition, which becomes the base for the following
//! advice. Because a replacement can add annotations, the compile selection is
//! resolved again after every pass; the loop ends when a pass finds no advice
//! left to apply.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;
use weft_advice::advice::AdviceHandler;
use weft_advice::aspect::AdviceId;
use weft_advice::context::CompileContext;
use weft_advice::entry::AdviceEntry;
use weft_advice::phase::Phase;
use weft_advice::registry::AdviceRegistry;
use weft_core::annotation::Annotation;
use weft_core::compiled::CompiledSymbol;
use weft_core::error::{AdviceError, AdviceErrorKind, Fault, ReplacementError, WeavingError};
use weft_core::object::{ClassDef, MethodDef, PropertyDef};
use weft_core::symbol::{SymbolId, SymbolKind, Target};

use crate::config::WeaverConfig;
use crate::strategy::scopes;

// ─────────────────────────────────────────────────────────────────────────────
// Compilable
// ─────────────────────────────────────────────────────────────────────────────

/// Definitions that go through the compile fixed point.
pub(crate) trait Compilable: Clone + Sized {
    /// Wraps the definition.
    fn into_symbol(self) -> CompiledSymbol;

    /// Unwraps a definition of the same kind.
    fn from_symbol(symbol: CompiledSymbol) -> Option<Self>;
}

impl Compilable for ClassDef {
    fn into_symbol(self) -> CompiledSymbol {
        CompiledSymbol::Class(self)
    }

    fn from_symbol(symbol: CompiledSymbol) -> Option<Self> {
        match symbol {
            CompiledSymbol::Class(def) => Some(def),
            _ => None,
        }
    }
}

impl Compilable for MethodDef {
    fn into_symbol(self) -> CompiledSymbol {
        CompiledSymbol::Method(self)
    }

    fn from_symbol(symbol: CompiledSymbol) -> Option<Self> {
        match symbol {
            CompiledSymbol::Method(def) => Some(def),
            _ => None,
        }
    }
}

impl Compilable for PropertyDef {
    fn into_symbol(self) -> CompiledSymbol {
        CompiledSymbol::Property(self)
    }

    fn from_symbol(symbol: CompiledSymbol) -> Option<Self> {
        match symbol {
            CompiledSymbol::Property(def) => Some(def),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CompileCache
// ─────────────────────────────────────────────────────────────────────────────

/// Compiled definitions and applied-advice marks of one weaver.
#[derive(Default)]
pub(crate) struct CompileCache {
    compiled: HashMap<SymbolId, CompiledSymbol>,
    applied: HashSet<(AdviceId, SymbolId)>,
}

impl CompileCache {
    pub(crate) fn get(&self, symbol: &SymbolId) -> Option<&CompiledSymbol> {
        self.compiled.get(symbol)
    }

    pub(crate) fn len(&self) -> usize {
        self.compiled.len()
    }

    fn is_applied(&self, advice: &AdviceId, symbol: &SymbolId) -> bool {
        self.applied.contains(&(advice.clone(), symbol.clone()))
    }

    fn mark_applied(&mut self, advice: &AdviceId, symbol: &SymbolId) -> bool {
        self.applied.insert((advice.clone(), symbol.clone()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Compiler
// ─────────────────────────────────────────────────────────────────────────────

/// Runs the compile fixed point against a registry.
///
/// The cache lock is only taken between advice calls.
pub(crate) struct Compiler<'w> {
    registry: &'w AdviceRegistry,
    cache: &'w Mutex<CompileCache>,
    config: &'w WeaverConfig,
}

impl<'w> Compiler<'w> {
    pub(crate) fn new(
        registry: &'w AdviceRegistry,
        cache: &'w Mutex<CompileCache>,
        config: &'w WeaverConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            config,
        }
    }

    /// Compiles `base`, described by `describe`.
    ///
    /// Returns the final definition with the target describing it. A symbol
    /// compiled before is answered from the cache.
    pub(crate) fn compile<T, D>(&self, base: T, describe: D) -> Result<(T, Target), WeavingError>
    where
        T: Compilable,
        D: Fn(&T) -> Target,
    {
        let mut target = describe(&base);
        let symbol = target.id().clone();

        let cached = self.cache.lock().get(&symbol).cloned();
        if let Some(definition) = cached.and_then(T::from_symbol) {
            let target = describe(&definition);
            return Ok((definition, target));
        }

        let mut current = base;
        let mut pass = 0;
        loop {
            let selection = self.registry.select(Phase::Compile, &scopes(&target));
            let pending: Vec<Arc<AdviceEntry>> = {
                let cache = self.cache.lock();
                selection
                    .iter()
                    .filter(|entry| !cache.is_applied(entry.id(), &symbol))
                    .cloned()
                    .collect()
            };
            if pending.is_empty() {
                break;
            }
            if pass == self.config.max_compile_passes() {
                tracing::warn!(target_symbol = %target, passes = pass, "compile fixed point did not converge");
                return Err(WeavingError::CompileDidNotConverge {
                    symbol: target.to_string(),
                    passes: pass,
                });
            }
            pass += 1;
            tracing::trace!(target_symbol = %target, pass, pending = pending.len(), "compile pass");

            for entry in &pending {
                if !self.cache.lock().mark_applied(entry.id(), &symbol) {
                    continue;
                }
                if let Some(replacement) = self.apply(entry, &target, &current)? {
                    current = replacement;
                    target = describe(&current);
                }
            }
        }

        self.finish(&target, current.clone().into_symbol());
        Ok((current, target))
    }

    /// Runs one compile advice.
    fn apply<T: Compilable>(
        &self,
        entry: &AdviceEntry,
        target: &Target,
        current: &T,
    ) -> Result<Option<T>, WeavingError> {
        let AdviceHandler::Compile(handler) = entry.handler() else {
            return Ok(None);
        };
        let definition = current.clone().into_symbol();
        if self.config.trace_advice() {
            tracing::trace!(advice = %entry, phase = %Phase::Compile, target_symbol = %target, "invoking advice");
        }
        let outcome = {
            let ctx = CompileContext::new(target, &definition, entry);
            handler(&ctx)
        };
        match outcome {
            Ok(None) => Ok(None),
            Ok(Some(replacement)) => {
                let expected = definition.kind();
                let found = replacement.kind();
                definition
                    .check_replacement(&replacement)
                    .and_then(|()| {
                        T::from_symbol(replacement)
                            .ok_or(ReplacementError::KindChanged { expected, found })
                    })
                    .map(Some)
                    .map_err(|reason| {
                        let error = AdviceError {
                            kind: AdviceErrorKind::InvalidReplacement { reason },
                            advice: entry.name().to_owned(),
                            aspect: entry.aspect().id().to_string(),
                            symbol: target.to_string(),
                        };
                        tracing::warn!(%error, "compile replacement refused");
                        WeavingError::from(error)
                    })
            }
            Err(Fault::Thrown(error)) => {
                tracing::warn!(advice = %entry, target_symbol = %target, %error, "compile advice raised");
                Err(WeavingError::CompileAborted {
                    symbol: target.to_string(),
                    error,
                })
            }
            Err(Fault::Weaving(error)) => Err(error),
        }
    }

    /// Caches the result and marks what it consumed.
    fn finish(&self, target: &Target, definition: CompiledSymbol) {
        self.cache.lock().compiled.insert(target.id().clone(), definition);
        self.registry.mark_consumed(
            target.kind(),
            target.annotations().iter().map(Annotation::reference),
        );
        if !target.parameters().is_empty() {
            self.registry.mark_consumed(
                SymbolKind::Parameter,
                target
                    .parameters()
                    .iter()
                    .flat_map(|p| p.annotations().iter().map(Annotation::reference)),
            );
        }
    }
}
