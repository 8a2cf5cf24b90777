//! # Cart Audit Log
//!
//! Every mutation a cashier makes to the cart while building a sale (not
//! just the final lines) can be attached to the sale for later review.
//!
//! ```text
//! Cart session                               Persisted on the sale
//! ────────────                               ─────────────────────
//! + Queso 1.000   ─► {ADD,    Queso, 1.000}  ┐
//! + Pan   2.000   ─► {ADD,    Pan,   2.000}  ├─► sales.audit_log (JSON text)
//! - Queso 1.000   ─► {REMOVE, Queso, 1.000}  ┘
//! ```
//!
//! The log has no effect on totals or stock. It is stored as the client
//! sent it and parsed leniently on the way out: a malformed or legacy blob
//! reads as an empty log, so it can never break a reconciliation or a
//! history view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::quantity::Quantity;

/// Kind of cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Add,
    Remove,
}

/// One cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub product_id: String,
    pub product_name: String,
    pub quantity: Quantity,
    pub action: AuditAction,
    pub timestamp: DateTime<Utc>,
}

/// Parses a stored audit log strictly.
pub fn try_parse_audit_log(raw: &str) -> Result<Vec<AuditEvent>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Parses a stored audit log, treating anything unreadable as no events.
///
/// ## Example
/// ```rust
/// use caja_core::audit::parse_audit_log;
///
/// assert!(parse_audit_log(None).is_empty());
/// assert!(parse_audit_log(Some("not json")).is_empty());
/// ```
pub fn parse_audit_log(raw: Option<&str>) -> Vec<AuditEvent> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    match try_parse_audit_log(raw) {
        Ok(events) => events,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable sale audit log");
            Vec::new()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = r#"[
        {"productId":"p-1","productName":"Queso","quantity":"1.000","action":"ADD","timestamp":"2024-05-01T12:00:00Z"},
        {"productId":"p-1","productName":"Queso","quantity":0.5,"action":"REMOVE","timestamp":"2024-05-01T12:00:05Z"}
    ]"#;

    #[test]
    fn test_parses_events_in_order() {
        let events = parse_audit_log(Some(LOG));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, AuditAction::Add);
        assert_eq!(events[1].action, AuditAction::Remove);
        assert_eq!(events[1].quantity, Quantity::from_milli(500));
        assert!(events[0].timestamp < events[1].timestamp);
    }

    #[test]
    fn test_malformed_log_reads_as_empty() {
        assert!(parse_audit_log(Some("{\"legacy\": true}")).is_empty());
        assert!(parse_audit_log(Some("")).is_empty());
        assert!(try_parse_audit_log("[{\"action\":\"SHAKE\"}]").is_err());
    }

    #[test]
    fn test_out_of_range_quantity_reads_as_empty() {
        let raw = r#"[{"productId":"p-1","productName":"Queso","quantity":"79228162514264337593543950335","action":"ADD","timestamp":"2024-05-01T12:00:00Z"}]"#;
        assert!(parse_audit_log(Some(raw)).is_empty());
    }

    #[test]
    fn test_serializes_camel_case() {
        let events = parse_audit_log(Some(LOG));
        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["productName"], "Queso");
        assert_eq!(json["action"], "ADD");
    }
}
