//! Onion composition of around advice.
//!
//! The chain is built from the last entry (innermost) to the first
//! (outermost). Every link gets a fresh join point resuming the link below
//! it; the innermost join point resumes the original body.

use std::sync::Arc;

use weft_advice::advice::AdviceHandler;
use weft_advice::context::ExecutionContext;
use weft_advice::entry::AdviceEntry;
use weft_advice::joinpoint::JoinPointFactory;
use weft_core::error::Fault;
use weft_core::value::Value;

/// One layer of the chain: takes the arguments, answers the result.
pub(crate) type Resume<'a> = Box<dyn FnOnce(Vec<Value>) -> Result<Value, Fault> + 'a>;

/// Boxes a closure as a [`Resume`].
pub(crate) fn resume<'a, F>(f: F) -> Resume<'a>
where
    F: FnOnce(Vec<Value>) -> Result<Value, Fault> + 'a,
{
    Box::new(f)
}

/// Wraps `body` in the around advice of `entries`, outermost first.
///
/// With no entries, `body` is returned unchanged.
pub(crate) fn compose<'a>(
    entries: &'a [Arc<AdviceEntry>],
    ctx: &'a ExecutionContext,
    trace: bool,
    body: Resume<'a>,
) -> Resume<'a> {
    entries.iter().rev().fold(body, |inner, entry| {
        resume(move |args| {
            let AdviceHandler::Around(handler) = entry.handler() else {
                return inner(args);
            };
            if trace {
                tracing::trace!(advice = %entry, phase = %entry.phase(), target_symbol = %ctx.target(), "invoking advice");
            }
            let join_point = JoinPointFactory::create(entry, ctx, inner);
            handler(&ctx.around(entry), &join_point, args)
        })
    })
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use weft_advice::advice::Advice;
    use weft_advice::aspect::AspectDef;
    use weft_advice::phase::Phase;
    use weft_advice::pointcut::on;
    use weft_advice::registry::AdviceRegistry;
    use weft_advice::selection::Scope;
    use weft_core::symbol::{ClassId, SymbolId, SymbolKind, Target};

    use super::*;

    fn context() -> ExecutionContext {
        let target = Target::new(SymbolId::method(ClassId::new("Svc"), "run", false), "run", Vec::new());
        ExecutionContext::new(Arc::new(target), None, vec![Value::Int(1)])
    }

    fn select(registry: &AdviceRegistry) -> Vec<Arc<AdviceEntry>> {
        registry
            .select(Phase::Around, &[Scope::new(SymbolKind::Method, [])])
            .entries()
            .to_vec()
    }

    #[test]
    fn outer_advice_wraps_inner_advice() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = AdviceRegistry::new();
        for (name, priority) in [("outer", 2), ("inner", 1)] {
            let log = Arc::clone(&log);
            registry
                .register(
                    &AspectDef::new(name)
                        .priority(priority)
                        .advice(
                            Advice::around("wrap", move |_, jp, args| {
                                log.lock().push(format!("{name}:enter"));
                                let value = jp.proceed(args);
                                log.lock().push(format!("{name}:exit"));
                                value
                            })
                            .on(on::methods()),
                        )
                        .build(),
                )
                .unwrap();
        }

        let ctx = context();
        let entries = select(&registry);
        let body_log = Arc::clone(&log);
        let chain = compose(
            &entries,
            &ctx,
            false,
            resume(move |args| {
                body_log.lock().push("body".to_owned());
                Ok(args.into_iter().next().unwrap_or_default())
            }),
        );
        assert_eq!(chain(vec![Value::Int(7)]).unwrap(), Value::Int(7));
        assert_eq!(
            *log.lock(),
            ["outer:enter", "inner:enter", "body", "inner:exit", "outer:exit"]
        );
    }

    #[test]
    fn skipping_proceed_short_circuits() {
        let registry = AdviceRegistry::new();
        registry
            .register(
                &AspectDef::new("Cache")
                    .advice(Advice::around("hit", |_, _, _| Ok(Value::from("cached"))).on(on::methods()))
                    .build(),
            )
            .unwrap();

        let ctx = context();
        let entries = select(&registry);
        let chain = compose(&entries, &ctx, true, resume(|_| Err(Fault::msg("must not run"))));
        assert_eq!(chain(Vec::new()).unwrap(), Value::from("cached"));
    }

    #[test]
    fn empty_chain_is_the_body() {
        let ctx = context();
        let chain = compose(&[], &ctx, false, resume(|args| Ok(Value::Int(args.len() as i64))));
        assert_eq!(chain(vec![Value::Null; 3]).unwrap(), Value::Int(3));
    }
}
