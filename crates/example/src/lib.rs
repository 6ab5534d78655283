//! Example audit service woven with weft.
//!
//! An `Account` class declared with annotations only. Everything that is not
//! bookkeeping comes from three aspects:
//!
//! | Aspect | Priority | Targets |
//! |--------|----------|---------|
//! | `Validation` | 100 | `@Positive` and `@NotBlank` parameters |
//! | `Logging` | 10 | `@Logged` methods, `@Entity` classes |
//! | `Audit` | 0 | `@Audited` properties, `@Entity` classes (compile) |
//!
//! Each aspect writes to a shared [`AuditTrail`] so the effect of the weaving
//! can be inspected after a run.

pub mod annotations;
pub mod aspects;
pub mod config;
pub mod domain;
pub mod session;
pub mod trail;

pub use aspects::{AuditAspects, ValidationError};
pub use config::{AuditConfig, AuditConfigError};
pub use domain::{BalanceOverflow, InsufficientFunds, account_class, insufficient_funds};
pub use trail::{AuditEvent, AuditRecord, AuditTrail};
