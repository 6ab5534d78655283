//! Error taxonomy shared by bodies, advice and the weaver.
//!
//! - [`Thrown`] is an application error. Only this kind reaches after-throw
//!   advice.
//! - [`WeavingError`] is structural and fatal. It bypasses after-throw advice
//!   and is never swallowed.
//! - [`Fault`] is the error type of every body and advice call and carries
//!   either of the two.

use core::error::Error;
use core::fmt;
use std::sync::Arc;

use crate::symbol::SymbolKind;

// ─────────────────────────────────────────────────────────────────────────────
// Thrown
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

/// An application error raised by a body or by advice.
///
/// Cheap to clone; the underlying error is shared.
#[derive(Clone)]
pub struct Thrown(Arc<dyn Error + Send + Sync>);

impl Thrown {
    /// Wraps an arbitrary error.
    pub fn new<E: Error + Send + Sync + 'static>(error: E) -> Self {
        Self(Arc::new(error))
    }

    /// Creates an error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Borrows the underlying error as `E`, if it is one.
    #[must_use]
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Whether `self` and `other` share the same underlying error.
    #[must_use]
    pub fn ptr_eq(&self, other: &Thrown) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Thrown").field(&self.0).finish()
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for Thrown {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AdviceError
// ─────────────────────────────────────────────────────────────────────────────

/// What went wrong while running a piece of advice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdviceErrorKind {
    /// A join point was invoked a second time.
    #[error("joinPoint already proceeded")]
    AlreadyProceeded,
    /// A non-returning phase returned a value.
    #[error("{phase} advice must not return a value (got {value})")]
    UnexpectedReturn {
        /// Phase name.
        phase: &'static str,
        /// Rendered value that was returned.
        value: String,
    },
    /// Compile advice returned an unusable replacement.
    #[error("invalid compile replacement: {reason}")]
    InvalidReplacement {
        /// Why the replacement was refused.
        reason: ReplacementError,
    },
}

/// Why a compile-time replacement cannot stand in for the original definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplacementError {
    /// The replacement is a different kind of symbol.
    #[error("expected a {expected} definition, got a {found}")]
    KindChanged {
        /// Kind of the original definition.
        expected: SymbolKind,
        /// Kind of the replacement.
        found: SymbolKind,
    },
    /// The replacement carries a different name.
    #[error("cannot rename '{from}' to '{to}'")]
    Renamed {
        /// Original name.
        from: String,
        /// Name of the replacement.
        to: String,
    },
    /// A class replacement extends a different parent.
    #[error("cannot change the parent class")]
    ParentChanged,
    /// A method replacement flips between static and instance.
    #[error("cannot change whether the method is static")]
    StaticChanged,
    /// A method replacement takes a different number of parameters.
    #[error("expected {expected} parameters, got {found}")]
    ArityChanged {
        /// Parameter count of the original.
        expected: usize,
        /// Parameter count of the replacement.
        found: usize,
    },
}

/// A structural error attributed to one advice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (advice '{advice}' of aspect '{aspect}' on {symbol})")]
pub struct AdviceError {
    /// Failure kind.
    pub kind: AdviceErrorKind,
    /// Name of the advice.
    pub advice: String,
    /// Id of the aspect that owns the advice.
    pub aspect: String,
    /// Rendered symbol the advice was applied to.
    pub symbol: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// WeavingError
// ─────────────────────────────────────────────────────────────────────────────

/// Structural errors raised while registering, compiling or dispatching.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WeavingError {
    /// An advice broke a weaving rule.
    #[error(transparent)]
    Advice(#[from] AdviceError),
    /// An aspect with this id is already enabled.
    #[error("aspect '{0}' is already enabled")]
    DuplicateAspect(String),
    /// An aspect was enabled after one of its annotations drove a compilation.
    #[error("aspect '{aspect}' targets {annotation}, which compiled symbols already consumed")]
    AnnotationConsumed {
        /// Aspect being enabled.
        aspect: String,
        /// Consumed annotation token.
        annotation: String,
    },
    /// An unrestricted pointcut arrived after symbols of its kind were compiled.
    #[error("aspect '{aspect}' targets every {kind}, but {kind} symbols were already compiled")]
    KindConsumed {
        /// Aspect being enabled.
        aspect: String,
        /// Consumed symbol kind.
        kind: SymbolKind,
    },
    /// The operation is only valid before the first compilation.
    #[error("cannot {operation}: the weaver is sealed")]
    Sealed {
        /// Rejected operation.
        operation: &'static str,
    },
    /// A different definition is already installed for the symbol.
    #[error("{symbol} is not configurable")]
    NotConfigurable {
        /// Rendered symbol.
        symbol: String,
    },
    /// The symbol has no installed definition.
    #[error("{symbol} is not linked")]
    Unlinked {
        /// Rendered symbol.
        symbol: String,
    },
    /// A class instance was read before its constructor ran.
    #[error("instance of {class} is not initialized yet")]
    UninitializedInstance {
        /// Class name.
        class: String,
    },
    /// A member lookup failed.
    #[error("{class} has no member '{member}'")]
    UnknownMember {
        /// Class name.
        class: String,
        /// Requested member.
        member: String,
    },
    /// The compile fixed point kept growing.
    #[error("compilation of {symbol} did not converge after {passes} passes")]
    CompileDidNotConverge {
        /// Rendered symbol.
        symbol: String,
        /// Pass limit that was hit.
        passes: usize,
    },
    /// Compile advice raised an application error.
    #[error("compilation of {symbol} aborted: {error}")]
    CompileAborted {
        /// Rendered symbol.
        symbol: String,
        /// The raised error.
        error: Thrown,
    },
    /// A constructor pipeline produced something other than an object.
    #[error("{symbol} must produce an object, got {found}")]
    InvalidInstance {
        /// Rendered symbol.
        symbol: String,
        /// Type name of what was produced.
        found: &'static str,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Fault
// ─────────────────────────────────────────────────────────────────────────────

/// Error type of bodies and advice.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Fault {
    /// Application error, interceptable by after-throw advice.
    #[error(transparent)]
    Thrown(#[from] Thrown),
    /// Structural error, never intercepted.
    #[error(transparent)]
    Weaving(#[from] WeavingError),
}

impl Fault {
    /// Shorthand for an application error carrying a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Fault::Thrown(Thrown::msg(message))
    }

    /// Returns the application error, if this is one.
    #[must_use]
    pub fn as_thrown(&self) -> Option<&Thrown> {
        match self {
            Fault::Thrown(thrown) => Some(thrown),
            Fault::Weaving(_) => None,
        }
    }

    /// Returns the structural error, if this is one.
    #[must_use]
    pub fn as_weaving(&self) -> Option<&WeavingError> {
        match self {
            Fault::Weaving(error) => Some(error),
            Fault::Thrown(_) => None,
        }
    }

    /// Returns the advice error, if this is one.
    #[must_use]
    pub fn as_advice(&self) -> Option<&AdviceError> {
        match self {
            Fault::Weaving(WeavingError::Advice(error)) => Some(error),
            _ => None,
        }
    }
}

impl From<AdviceError> for Fault {
    fn from(error: AdviceError) -> Self {
        Fault::Weaving(WeavingError::Advice(error))
    }
}
