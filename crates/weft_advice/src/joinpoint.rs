//! Single-use join points.
//!
//! A [`JoinPoint`] resumes the original behavior at its layer of the around
//! chain. The first [`proceed`](JoinPoint::proceed) runs the layer below;
//! any later call fails with `joinPoint already proceeded`.

use core::cell::Cell;
use core::fmt;

use weft_core::error::{AdviceError, AdviceErrorKind, Fault};
use weft_core::object::ObjectRef;
use weft_core::symbol::Target;
use weft_core::value::Value;

use crate::context::ExecutionContext;
use crate::entry::AdviceEntry;

type Resume<'a> = Box<dyn FnOnce(Vec<Value>) -> Result<Value, Fault> + 'a>;

/// A callable that resumes the next layer at most once.
pub struct JoinPoint<'a> {
    resume: Cell<Option<Resume<'a>>>,
    instance: Option<ObjectRef>,
    target: &'a Target,
    entry: &'a AdviceEntry,
}

impl<'a> JoinPoint<'a> {
    /// Runs the next layer with `args`.
    ///
    /// # Errors
    ///
    /// Fails with [`AdviceErrorKind::AlreadyProceeded`] on every call after
    /// the first; otherwise returns what the next layer returns.
    pub fn proceed(&self, args: Vec<Value>) -> Result<Value, Fault> {
        match self.resume.take() {
            Some(resume) => resume(args),
            None => {
                tracing::warn!(target_symbol = %self.target, advice = %self.entry, "join point invoked twice");
                Err(AdviceError {
                    kind: AdviceErrorKind::AlreadyProceeded,
                    advice: self.entry.name().to_owned(),
                    aspect: self.entry.aspect().id().to_string(),
                    symbol: self.target.to_string(),
                }
                .into())
            }
        }
    }

    /// Whether [`proceed`](Self::proceed) was already called.
    #[must_use]
    pub fn has_proceeded(&self) -> bool {
        let resume = self.resume.take();
        let proceeded = resume.is_none();
        self.resume.set(resume);
        proceeded
    }

    /// Receiver the join point is bound to.
    #[must_use]
    pub fn instance(&self) -> Option<&ObjectRef> {
        self.instance.as_ref()
    }

    /// The symbol being invoked.
    #[must_use]
    pub fn target(&self) -> &'a Target {
        self.target
    }
}

impl fmt::Debug for JoinPoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinPoint")
            .field("target", &self.target.id())
            .field("advice", &self.entry.id())
            .field("proceeded", &self.has_proceeded())
            .finish()
    }
}

/// Mints join points.
pub struct JoinPointFactory;

impl JoinPointFactory {
    /// Creates a join point for `entry` bound to the receiver of `ctx`.
    ///
    /// `resume` runs the next layer: inner around advice, or the original
    /// body for the innermost link.
    pub fn create<'a, F>(entry: &'a AdviceEntry, ctx: &'a ExecutionContext, resume: F) -> JoinPoint<'a>
    where
        F: FnOnce(Vec<Value>) -> Result<Value, Fault> + 'a,
    {
        JoinPoint {
            resume: Cell::new(Some(Box::new(resume))),
            instance: ctx.raw_instance().cloned(),
            target: ctx.target(),
            entry,
        }
    }
}
