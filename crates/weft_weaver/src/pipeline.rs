//! Runtime dispatch pipeline.
//!
//! Every call of a woven symbol runs:
//!
//! 1. **before**: in order; each advice must answer `Undefined`.
//! 2. **around**: the onion chain around the compiled body.
//! 3. **after-return** on success: each advice receives the current result
//!    and answers the result to keep.
//! 4. **after-throw** on an application error from step 2: the first advice
//!    answering `Ok` swallows the error and its value becomes the result;
//!    `Err(Fault::Thrown)` passes a (possibly different) error on.
//! 5. **after**: always, whatever happened above.
//!
//! Structural errors ([`Fault::Weaving`]) skip step 4 but still reach step 5.
//! An error raised by after advice replaces the outcome of the call.

use weft_advice::advice::AdviceHandler;
use weft_advice::context::ExecutionContext;
use weft_advice::entry::AdviceEntry;
use weft_advice::phase::Phase;
use weft_advice::registry::AdviceRegistry;
use weft_advice::selection::{AdviceSelection, Scope};
use weft_core::error::{AdviceError, AdviceErrorKind, Fault, Thrown};
use weft_core::value::Value;

use crate::around::{Resume, compose};

/// The advice selected for one symbol, resolved once at link time.
#[derive(Debug, Default)]
pub(crate) struct Pipeline {
    before: AdviceSelection,
    around: AdviceSelection,
    after_return: AdviceSelection,
    after_throw: AdviceSelection,
    after: AdviceSelection,
    trace: bool,
}

impl Pipeline {
    /// Selects every runtime phase for a symbol described by `scopes`.
    pub(crate) fn resolve(registry: &AdviceRegistry, scopes: &[Scope], trace: bool) -> Self {
        Self {
            before: registry.select(Phase::Before, scopes),
            around: registry.select(Phase::Around, scopes),
            after_return: registry.select(Phase::AfterReturn, scopes),
            after_throw: registry.select(Phase::AfterThrow, scopes),
            after: registry.select(Phase::After, scopes),
            trace,
        }
    }

    /// Number of selected entries over all phases.
    pub(crate) fn len(&self) -> usize {
        self.before.len()
            + self.around.len()
            + self.after_return.len()
            + self.after_throw.len()
            + self.after.len()
    }

    /// Whether no advice applies at runtime.
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the pipeline with `body` as the innermost join point.
    pub(crate) fn run(&self, ctx: &mut ExecutionContext, body: Resume<'_>) -> Result<Value, Fault> {
        self.run_with(ctx, body, Ok)
    }

    /// Like [`run`](Self::run), passing the result of the around chain
    /// through `settle` before the after phases see it.
    pub(crate) fn run_with<S>(
        &self,
        ctx: &mut ExecutionContext,
        body: Resume<'_>,
        settle: S,
    ) -> Result<Value, Fault>
    where
        S: FnOnce(Value) -> Result<Value, Fault>,
    {
        let outcome = self.dispatch(ctx, body, settle);
        let finally = self.run_after(ctx);
        finally.and(outcome)
    }

    fn dispatch<S>(&self, ctx: &mut ExecutionContext, body: Resume<'_>, settle: S) -> Result<Value, Fault>
    where
        S: FnOnce(Value) -> Result<Value, Fault>,
    {
        if let Err(fault) = self.run_before(ctx) {
            if let Fault::Thrown(error) = &fault {
                ctx.set_error(error.clone());
            }
            return Err(fault);
        }

        let args = ctx.args().to_vec();
        let result = compose(self.around.entries(), ctx, self.trace, body)(args).and_then(settle);

        match result {
            Ok(value) => match self.run_after_return(ctx, value) {
                Ok(value) => {
                    ctx.set_value(value.clone());
                    Ok(value)
                }
                Err(fault) => {
                    if let Fault::Thrown(error) = &fault {
                        ctx.set_error(error.clone());
                    }
                    Err(fault)
                }
            },
            Err(Fault::Thrown(error)) => {
                ctx.set_error(error.clone());
                match self.run_after_throw(ctx, error) {
                    Ok(value) => {
                        ctx.set_value(value.clone());
                        Ok(value)
                    }
                    Err(Fault::Thrown(error)) => {
                        ctx.set_error(error.clone());
                        Err(Fault::Thrown(error))
                    }
                    Err(fault) => Err(fault),
                }
            }
            Err(fault) => Err(fault),
        }
    }

    fn run_before(&self, ctx: &ExecutionContext) -> Result<(), Fault> {
        for entry in &self.before {
            let AdviceHandler::Before(handler) = entry.handler() else {
                continue;
            };
            self.trace(entry, ctx);
            let value = handler(&ctx.before(entry))?;
            expect_undefined(entry, ctx, value)?;
        }
        Ok(())
    }

    fn run_after_return(&self, ctx: &ExecutionContext, mut value: Value) -> Result<Value, Fault> {
        for entry in &self.after_return {
            let AdviceHandler::AfterReturn(handler) = entry.handler() else {
                continue;
            };
            self.trace(entry, ctx);
            value = handler(&ctx.after_return(entry), value)?;
        }
        Ok(value)
    }

    fn run_after_throw(&self, ctx: &ExecutionContext, mut error: Thrown) -> Result<Value, Fault> {
        for entry in &self.after_throw {
            let AdviceHandler::AfterThrow(handler) = entry.handler() else {
                continue;
            };
            self.trace(entry, ctx);
            match handler(&ctx.after_throw(entry), error) {
                Ok(value) => return Ok(value),
                Err(Fault::Thrown(next)) => error = next,
                Err(fault) => return Err(fault),
            }
        }
        Err(Fault::Thrown(error))
    }

    fn run_after(&self, ctx: &ExecutionContext) -> Result<(), Fault> {
        for entry in &self.after {
            let AdviceHandler::After(handler) = entry.handler() else {
                continue;
            };
            self.trace(entry, ctx);
            let value = handler(&ctx.after(entry))?;
            expect_undefined(entry, ctx, value)?;
        }
        Ok(())
    }

    fn trace(&self, entry: &AdviceEntry, ctx: &ExecutionContext) {
        if self.trace {
            tracing::trace!(advice = %entry, phase = %entry.phase(), target_symbol = %ctx.target(), "invoking advice");
        }
    }
}

fn expect_undefined(entry: &AdviceEntry, ctx: &ExecutionContext, value: Value) -> Result<(), Fault> {
    if value.is_undefined() {
        return Ok(());
    }
    let error = AdviceError {
        kind: AdviceErrorKind::UnexpectedReturn {
            phase: entry.phase().as_str(),
            value: format!("{value:?}"),
        },
        advice: entry.name().to_owned(),
        aspect: entry.aspect().id().to_string(),
        symbol: ctx.target().to_string(),
    };
    tracing::warn!(%error, "advice returned a value");
    Err(error.into())
}
