//! The scripted session the `audit` binary runs.

use weft_core::error::Fault;
use weft_core::value::Value;
use weft_weaver::profile::AspectGroup;
use weft_weaver::weaver::Weaver;

use crate::aspects::AuditAspects;
use crate::config::AuditConfig;
use crate::domain::account_class;
use crate::trail::AuditTrail;

/// Opens an account from `config` and runs a fixed list of calls against it,
/// recording into `trail`.
///
/// Application errors raised by the calls are expected and only logged.
///
/// # Errors
///
/// Returns the first structural error, or an application error raised by the
/// construction or the final rename.
pub fn run(config: &AuditConfig, trail: &AuditTrail) -> Result<(), Fault> {
    let weaver = Weaver::with_config(config.weaver);
    weaver.merge(AuditAspects::new(trail.clone()).build())?;

    let class = weaver.define(account_class())?;
    let account = class.construct(&[
        Value::from(config.owner.as_str()),
        Value::Int(config.opening_balance),
    ])?;

    let calls: [(&str, Value); 5] = [
        ("deposit", Value::Int(50)),
        ("deposit", Value::Int(-5)),
        ("withdraw", Value::Int(config.opening_balance.saturating_mul(10))),
        ("withdraw", Value::Int(30)),
        ("rename", Value::from("  ")),
    ];
    for (method, arg) in calls {
        match account.invoke(method, &[arg]) {
            Ok(value) => tracing::debug!(method, %value, "call succeeded"),
            Err(Fault::Thrown(error)) => tracing::debug!(method, %error, "call refused"),
            Err(fault) => return Err(fault),
        }
    }
    account.invoke("rename", &[Value::from("grace")])?;

    tracing::info!(
        balance = %account.get("balance")?,
        owner = %account.get("owner")?,
        state = %account.invoke("describe", &[])?,
        "session finished"
    );
    Ok(())
}
