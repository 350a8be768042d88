//! Structured audit logging for hardware-mutating operations.
//!
//! Every operation that creates, modifies, or deletes forwarding state emits
//! an [`AuditRecord`]: a UTC-timestamped, JSON-serializable record carrying
//! the component, action, outcome, and object identity. Records are routed
//! through the `audit` log target so operators can split them from the
//! regular diagnostic stream and feed them to log analysis tooling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Audit event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    /// Resource creation events
    ResourceCreate,
    /// Resource modification events
    ResourceModify,
    /// Resource deletion events
    ResourceDelete,
    /// Hardware SDK operations
    HwOperation,
    /// Warm restart events
    WarmRestart,
    /// Error and failure events
    ErrorCondition,
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditCategory::ResourceCreate => write!(f, "RESOURCE_CREATE"),
            AuditCategory::ResourceModify => write!(f, "RESOURCE_MODIFY"),
            AuditCategory::ResourceDelete => write!(f, "RESOURCE_DELETE"),
            AuditCategory::HwOperation => write!(f, "HW_OPERATION"),
            AuditCategory::WarmRestart => write!(f, "WARM_RESTART"),
            AuditCategory::ErrorCondition => write!(f, "ERROR_CONDITION"),
        }
    }
}

/// Outcome of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    /// Action completed successfully
    Success,
    /// Action failed
    Failure,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Failure => write!(f, "failure"),
        }
    }
}

/// One audit record, built with the builder methods and emitted via
/// [`crate::audit_log!`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// UTC timestamp at record creation.
    pub timestamp: DateTime<Utc>,
    /// Event category.
    pub category: AuditCategory,
    /// Component that performed the action (e.g. "L3HostTable").
    pub component: String,
    /// The action performed (e.g. "acquire_multi_path").
    pub action: String,
    /// Success or failure.
    pub outcome: AuditOutcome,
    /// Identifier of the affected object, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    /// Type of the affected object, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    /// Error message for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Free-form structured details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AuditRecord {
    /// Creates a record with a success outcome.
    pub fn new(category: AuditCategory, component: &str, action: &str) -> Self {
        AuditRecord {
            timestamp: Utc::now(),
            category,
            component: component.to_string(),
            action: action.to_string(),
            outcome: AuditOutcome::Success,
            object_id: None,
            object_type: None,
            error: None,
            details: None,
        }
    }

    pub fn with_outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_object_id(mut self, id: impl ToString) -> Self {
        self.object_id = Some(id.to_string());
        self
    }

    pub fn with_object_type(mut self, ty: impl ToString) -> Self {
        self.object_type = Some(ty.to_string());
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serializes the record to a JSON line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                "{{\"error\":\"audit serialization failed: {}\",\"action\":\"{}\"}}",
                e, self.action
            )
        })
    }
}

/// Emits an [`AuditRecord`] on the `audit` log target.
#[macro_export]
macro_rules! audit_log {
    ($record:expr) => {
        ::log::info!(target: "audit", "{}", $record.to_json());
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = AuditRecord::new(AuditCategory::ResourceCreate, "L3HostTable", "acquire")
            .with_object_id("vrf0:10.0.0.1@intf5")
            .with_object_type("next_hop")
            .with_details(serde_json::json!({ "ref_count": 1 }));

        assert_eq!(record.outcome, AuditOutcome::Success);
        let json = record.to_json();
        assert!(json.contains("RESOURCE_CREATE"));
        assert!(json.contains("next_hop"));
        assert!(json.contains("ref_count"));
    }

    #[test]
    fn test_failure_record_carries_error() {
        let record = AuditRecord::new(AuditCategory::ResourceDelete, "L3HostTable", "release")
            .with_outcome(AuditOutcome::Failure)
            .with_error("hardware fault on unit 0");

        let json = record.to_json();
        assert!(json.contains("failure"));
        assert!(json.contains("hardware fault"));
    }

    #[test]
    fn test_json_round_trip() {
        let record = AuditRecord::new(AuditCategory::WarmRestart, "WarmBootCache", "populate");
        let parsed: AuditRecord = serde_json::from_str(&record.to_json()).unwrap();
        assert_eq!(parsed.category, AuditCategory::WarmRestart);
        assert_eq!(parsed.component, "WarmBootCache");
    }
}
