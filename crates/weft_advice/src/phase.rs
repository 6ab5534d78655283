//! Advice phases.

use core::fmt;

/// The moment at which an advice runs.
///
/// Dispatch order is `Before`, `Around`, then `AfterReturn` or `AfterThrow`,
/// then `After`. `Compile` runs once per symbol while it is woven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Rewrites the symbol's definition while it is woven.
    Compile,
    /// Runs before the symbol; must not return a value.
    Before,
    /// Wraps the symbol; decides whether and how to proceed.
    Around,
    /// Runs after a successful call; may override the result.
    AfterReturn,
    /// Runs after an application error; may swallow or rethrow it.
    AfterThrow,
    /// Runs after every call; must not return a value.
    After,
}

impl Phase {
    /// Every phase, in dispatch order.
    pub const ALL: [Phase; 6] = [
        Phase::Compile,
        Phase::Before,
        Phase::Around,
        Phase::AfterReturn,
        Phase::AfterThrow,
        Phase::After,
    ];

    /// Name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Compile => "compile",
            Phase::Before => "before",
            Phase::Around => "around",
            Phase::AfterReturn => "afterReturn",
            Phase::AfterThrow => "afterThrow",
            Phase::After => "after",
        }
    }

    /// Whether advice of this phase may produce a value.
    #[must_use]
    pub const fn is_returning(self) -> bool {
        !matches!(self, Phase::Before | Phase::After)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
