//! Advice declarations.
//!
//! An [`Advice`] is a named handler for one [`Phase`], attached to one or
//! more pointcut expressions and optionally carrying an explicit [`Order`].
//!
//! ```
//! use weft_advice::advice::{Advice, Order};
//! use weft_advice::pointcut::on;
//! use weft_core::annotation::AnnotationRef;
//! use weft_core::value::Value;
//!
//! let log = AnnotationRef::new("demo", "Log");
//! let advice = Advice::before("announce", |ctx| {
//!     tracing::info!(target = %ctx.target(), "calling");
//!     Ok(Value::Undefined)
//! })
//! .on(on::methods().with_annotation(log))
//! .order(Order::Highest);
//! assert_eq!(advice.name(), "announce");
//! ```

use core::cmp::Ordering;
use core::fmt;
use std::sync::Arc;

use weft_core::compiled::CompiledSymbol;
use weft_core::error::{Fault, Thrown};
use weft_core::value::Value;

use crate::context::{
    AfterContext, AfterReturnContext, AfterThrowContext, AroundContext, BeforeContext,
    CompileContext,
};
use crate::joinpoint::JoinPoint;
use crate::phase::Phase;
use crate::pointcut::{Pointcut, PointcutExpr, merge_into};

// ─────────────────────────────────────────────────────────────────────────────
// Order
// ─────────────────────────────────────────────────────────────────────────────

/// Explicit precedence of an advice.
///
/// `Highest` runs first, then numeric values in ascending order, then
/// `Lowest`. Advice without an explicit order sorts as `Lowest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    /// Runs before every other advice.
    Highest,
    /// Runs in ascending numeric order.
    Value(i32),
    /// Runs after every other advice.
    Lowest,
}

impl Order {
    fn rank(self) -> (u8, i32) {
        match self {
            Order::Highest => (0, 0),
            Order::Value(v) => (1, v),
            Order::Lowest => (2, 0),
        }
    }
}

impl Ord for Order {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Order {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i32> for Order {
    fn from(value: i32) -> Self {
        Order::Value(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Compile handler: `None` keeps the definition, `Some` replaces it.
pub type CompileFn =
    dyn Fn(&CompileContext<'_>) -> Result<Option<CompiledSymbol>, Fault> + Send + Sync;

/// Before handler: must answer [`Value::Undefined`].
pub type BeforeFn = dyn Fn(&BeforeContext<'_>) -> Result<Value, Fault> + Send + Sync;

/// Around handler: receives the join point and the incoming arguments.
pub type AroundFn =
    dyn Fn(&AroundContext<'_>, &JoinPoint<'_>, Vec<Value>) -> Result<Value, Fault> + Send + Sync;

/// After-return handler: receives the current result and answers the result
/// to keep.
pub type AfterReturnFn =
    dyn Fn(&AfterReturnContext<'_>, Value) -> Result<Value, Fault> + Send + Sync;

/// After-throw handler: `Ok` swallows the error, `Err` rethrows.
pub type AfterThrowFn =
    dyn Fn(&AfterThrowContext<'_>, Thrown) -> Result<Value, Fault> + Send + Sync;

/// After handler: must answer [`Value::Undefined`].
pub type AfterFn = dyn Fn(&AfterContext<'_>) -> Result<Value, Fault> + Send + Sync;

/// A phase-tagged advice handler.
#[derive(Clone)]
pub enum AdviceHandler {
    /// Compile phase.
    Compile(Arc<CompileFn>),
    /// Before phase.
    Before(Arc<BeforeFn>),
    /// Around phase.
    Around(Arc<AroundFn>),
    /// After-return phase.
    AfterReturn(Arc<AfterReturnFn>),
    /// After-throw phase.
    AfterThrow(Arc<AfterThrowFn>),
    /// After phase.
    After(Arc<AfterFn>),
}

impl AdviceHandler {
    /// Phase the handler runs in.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            AdviceHandler::Compile(_) => Phase::Compile,
            AdviceHandler::Before(_) => Phase::Before,
            AdviceHandler::Around(_) => Phase::Around,
            AdviceHandler::AfterReturn(_) => Phase::AfterReturn,
            AdviceHandler::AfterThrow(_) => Phase::AfterThrow,
            AdviceHandler::After(_) => Phase::After,
        }
    }
}

impl fmt::Debug for AdviceHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AdviceHandler::{}", self.phase())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Advice
// ─────────────────────────────────────────────────────────────────────────────

/// A named handler bound to pointcut expressions.
#[derive(Clone, Debug)]
pub struct Advice {
    name: Arc<str>,
    handler: AdviceHandler,
    expressions: Vec<PointcutExpr>,
    order: Option<Order>,
}

impl Advice {
    fn with_handler(name: impl Into<Arc<str>>, handler: AdviceHandler) -> Self {
        Self {
            name: name.into(),
            handler,
            expressions: Vec::new(),
            order: None,
        }
    }

    /// Declares a compile advice.
    #[must_use]
    pub fn compile<F>(name: impl Into<Arc<str>>, handler: F) -> Self
    where
        F: Fn(&CompileContext<'_>) -> Result<Option<CompiledSymbol>, Fault> + Send + Sync + 'static,
    {
        Self::with_handler(name, AdviceHandler::Compile(Arc::new(handler)))
    }

    /// Declares a before advice.
    #[must_use]
    pub fn before<F>(name: impl Into<Arc<str>>, handler: F) -> Self
    where
        F: Fn(&BeforeContext<'_>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self::with_handler(name, AdviceHandler::Before(Arc::new(handler)))
    }

    /// Declares an around advice.
    #[must_use]
    pub fn around<F>(name: impl Into<Arc<str>>, handler: F) -> Self
    where
        F: Fn(&AroundContext<'_>, &JoinPoint<'_>, Vec<Value>) -> Result<Value, Fault>
            + Send
            + Sync
            + 'static,
    {
        Self::with_handler(name, AdviceHandler::Around(Arc::new(handler)))
    }

    /// Declares an after-return advice.
    #[must_use]
    pub fn after_return<F>(name: impl Into<Arc<str>>, handler: F) -> Self
    where
        F: Fn(&AfterReturnContext<'_>, Value) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self::with_handler(name, AdviceHandler::AfterReturn(Arc::new(handler)))
    }

    /// Declares an after-throw advice.
    #[must_use]
    pub fn after_throw<F>(name: impl Into<Arc<str>>, handler: F) -> Self
    where
        F: Fn(&AfterThrowContext<'_>, Thrown) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self::with_handler(name, AdviceHandler::AfterThrow(Arc::new(handler)))
    }

    /// Declares an after advice.
    #[must_use]
    pub fn after<F>(name: impl Into<Arc<str>>, handler: F) -> Self
    where
        F: Fn(&AfterContext<'_>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self::with_handler(name, AdviceHandler::After(Arc::new(handler)))
    }

    /// Attaches the advice to an additional pointcut expression.
    #[must_use]
    pub fn on(mut self, expression: PointcutExpr) -> Self {
        self.expressions.push(expression);
        self
    }

    /// Sets the explicit precedence.
    #[must_use]
    pub fn order(mut self, order: impl Into<Order>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Advice name, unique within its aspect.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> &Arc<str> {
        &self.name
    }

    /// Phase the advice runs in.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.handler.phase()
    }

    /// The handler.
    #[must_use]
    pub fn handler(&self) -> &AdviceHandler {
        &self.handler
    }

    /// Attached pointcut expressions.
    #[must_use]
    pub fn expressions(&self) -> &[PointcutExpr] {
        &self.expressions
    }

    /// Explicit precedence, if any.
    #[must_use]
    pub fn precedence(&self) -> Option<Order> {
        self.order
    }

    /// Expands the expressions into pointcuts, merging assignable ones.
    #[must_use]
    pub fn pointcuts(&self) -> Vec<Pointcut> {
        let mut pointcuts = Vec::new();
        for expression in &self.expressions {
            for pointcut in expression.pointcuts(self.phase()) {
                merge_into(&mut pointcuts, pointcut);
            }
        }
        pointcuts
    }
}

#[cfg(test)]
mod tests {
    use weft_core::annotation::AnnotationRef;
    use weft_core::symbol::SymbolKind;

    use super::*;
    use crate::pointcut::on;

    #[test]
    fn order_ranks_highest_values_lowest() {
        let mut orders = vec![
            Order::Lowest,
            Order::Value(5),
            Order::Highest,
            Order::Value(-3),
        ];
        orders.sort();
        assert_eq!(
            orders,
            [Order::Highest, Order::Value(-3), Order::Value(5), Order::Lowest]
        );
    }

    #[test]
    fn pointcuts_merge_across_expressions() {
        let a = AnnotationRef::new("t", "A");
        let b = AnnotationRef::new("t", "B");
        let advice = Advice::after("audit", |_| Ok(Value::Undefined))
            .on(on::methods().with_annotation(a))
            .on(on::any().with_annotation(b));

        let pointcuts = advice.pointcuts();
        assert_eq!(pointcuts.len(), SymbolKind::ALL.len());
        let method = pointcuts
            .iter()
            .find(|p| p.kind() == SymbolKind::Method)
            .unwrap();
        assert_eq!(method.annotations().len(), 2);
        assert!(pointcuts.iter().all(|p| p.phase() == Phase::After));
    }
}
