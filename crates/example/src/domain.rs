//! The `Account` class.
//!
//! The class carries no logging or validation code of its own; it only
//! declares annotations. Woven by [`AuditAspects`](crate::AuditAspects) it
//! validates amounts, logs calls and records owner changes.

use weft_core::error::{Fault, Thrown};
use weft_core::object::{ClassDef, MethodDef, ObjectRef, ParamDef, PropertyDef};
use weft_core::value::Value;

use crate::annotations::{audited, entity, logged, not_blank, positive};

/// Raised by `withdraw` when the balance does not cover the amount.
#[derive(Debug, thiserror::Error)]
#[error("insufficient funds: balance {balance}, requested {requested}")]
pub struct InsufficientFunds {
    /// Balance at the time of the call.
    pub balance: i64,
    /// Requested amount.
    pub requested: i64,
}

/// Raised when a call would push the balance out of range.
#[derive(Debug, thiserror::Error)]
#[error("balance overflow: balance {balance}, change {change}")]
pub struct BalanceOverflow {
    /// Balance at the time of the call.
    pub balance: i64,
    /// Signed change the call tried to apply.
    pub change: i64,
}

fn balance_of(this: &ObjectRef) -> i64 {
    this.field("balance").as_int().unwrap_or_default()
}

/// Declares `Account(owner, opening_balance)`.
///
/// | Member | Annotations |
/// |--------|-------------|
/// | class | `@Entity` |
/// | `deposit(@Positive amount)` | `@Logged` |
/// | `withdraw(@Positive amount)` | `@Logged` |
/// | `rename(@NotBlank owner)` | `@Logged` |
/// | `owner` | `@Audited` |
/// | `balance` | read-only |
#[must_use]
pub fn account_class() -> ClassDef {
    ClassDef::new("Account")
        .annotate(&entity())
        .constructor(|this, args| {
            this.set_field("owner", args.first().cloned().unwrap_or_default());
            this.set_field("balance", args.get(1).and_then(Value::as_int).unwrap_or_default());
            Ok(())
        })
        .method(
            MethodDef::new("deposit", |this, args| {
                let amount = args.first().and_then(Value::as_int).unwrap_or_default();
                let current = balance_of(this);
                let balance = current.checked_add(amount).ok_or_else(|| {
                    Fault::from(Thrown::new(BalanceOverflow {
                        balance: current,
                        change: amount,
                    }))
                })?;
                this.set_field("balance", balance);
                Ok(Value::Int(balance))
            })
            .annotate(&logged())
            .param(ParamDef::new("amount").annotate(&positive())),
        )
        .method(
            MethodDef::new("withdraw", |this, args| {
                let requested = args.first().and_then(Value::as_int).unwrap_or_default();
                let balance = balance_of(this);
                if requested > balance {
                    return Err(Thrown::new(InsufficientFunds { balance, requested }).into());
                }
                let remaining = balance.checked_sub(requested).ok_or_else(|| {
                    Fault::from(Thrown::new(BalanceOverflow {
                        balance,
                        change: requested.saturating_neg(),
                    }))
                })?;
                this.set_field("balance", remaining);
                Ok(Value::Int(remaining))
            })
            .annotate(&logged())
            .param(ParamDef::new("amount").annotate(&positive())),
        )
        .method(
            MethodDef::new("rename", |this, args| {
                this.set("owner", args.first().cloned().unwrap_or_default())?;
                Ok(Value::Undefined)
            })
            .annotate(&logged())
            .param(ParamDef::new("owner").annotate(&not_blank())),
        )
        .property(PropertyDef::field("owner").annotate(&audited()))
        .property(PropertyDef::readonly("balance", |this| Ok(this.field("balance"))))
}

/// Application error carried by `fault`, if it is an [`InsufficientFunds`].
#[must_use]
pub fn insufficient_funds(fault: &Fault) -> Option<&InsufficientFunds> {
    fault.as_thrown()?.downcast_ref()
}

#[cfg(test)]
mod tests {
    use weft_weaver::weaver::Weaver;

    use super::*;

    /// Verifies that the class works without any aspect enabled.
    #[test]
    fn unwoven_account_keeps_its_bookkeeping() {
        let weaver = Weaver::new();
        let class = weaver.define(account_class()).unwrap();
        let account = class.construct(&[Value::from("ada"), Value::Int(10)]).unwrap();

        assert_eq!(account.invoke("deposit", &[Value::Int(5)]).unwrap(), Value::Int(15));
        let err = account.invoke("withdraw", &[Value::Int(20)]).unwrap_err();
        let funds = insufficient_funds(&err).unwrap();
        assert_eq!((funds.balance, funds.requested), (15, 20));
        assert_eq!(account.get("balance").unwrap(), Value::Int(15));
    }

    /// Verifies that a deposit past the range is refused and leaves the
    /// balance untouched.
    #[test]
    fn out_of_range_deposit_is_refused() {
        let weaver = Weaver::new();
        let class = weaver.define(account_class()).unwrap();
        let account = class.construct(&[Value::from("ada"), Value::Int(i64::MAX)]).unwrap();

        let err = account.invoke("deposit", &[Value::Int(1)]).unwrap_err();
        let overflow = err.as_thrown().unwrap().downcast_ref::<BalanceOverflow>().unwrap();
        assert_eq!((overflow.balance, overflow.change), (i64::MAX, 1));
        assert_eq!(account.get("balance").unwrap(), Value::Int(i64::MAX));
    }
}
