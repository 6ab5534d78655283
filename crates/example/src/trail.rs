//! Shared record of what the aspects observed.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// Kind of an [`AuditRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    /// An entity was constructed.
    Created,
    /// A logged method returned.
    Returned,
    /// A logged method failed.
    Failed,
    /// A parameter was rejected before the call.
    Rejected,
    /// An audited property was written.
    Changed,
}

/// One observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    /// `Class.member` the record is about.
    pub symbol: String,
    /// What happened.
    pub event: AuditEvent,
    /// Human-readable detail.
    pub detail: String,
}

/// Append-only, cloneable audit trail.
#[derive(Debug, Clone, Default)]
pub struct AuditTrail(Arc<Mutex<Vec<AuditRecord>>>);

impl AuditTrail {
    /// Creates an empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn record(&self, symbol: impl Into<String>, event: AuditEvent, detail: impl Into<String>) {
        self.0.lock().push(AuditRecord {
            symbol: symbol.into(),
            event,
            detail: detail.into(),
        });
    }

    /// Snapshot of every record so far.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.0.lock().clone()
    }

    /// Records of one kind.
    #[must_use]
    pub fn of(&self, event: AuditEvent) -> Vec<AuditRecord> {
        self.0
            .lock()
            .iter()
            .filter(|record| record.event == event)
            .cloned()
            .collect()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Serializes the trail as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which only happens for broken writers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&*self.0.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_filter_by_event() {
        let trail = AuditTrail::new();
        trail.record("Account.deposit", AuditEvent::Returned, "50");
        trail.record("Account.withdraw", AuditEvent::Failed, "insufficient funds");

        assert_eq!(trail.len(), 2);
        let failed = trail.of(AuditEvent::Failed);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].symbol, "Account.withdraw");
    }

    #[test]
    fn json_uses_snake_case_events() {
        let trail = AuditTrail::new();
        trail.record("Account", AuditEvent::Created, "ada");
        let json = trail.to_json().unwrap();
        assert!(json.contains(r#""event": "created""#));
    }
}
