//! Error types for the L3 programming layer.

use swhal_sdk::HardwareFault;
use swhal_types::ParseError;
use thiserror::Error;

/// Errors surfaced by the L3 programming layer.
///
/// Two classes share this enum but have very different lifetimes:
///
/// - [`L3Error::HardwareFault`] wraps a failed hardware programming call.
///   Nothing below the top-level command loop catches it; recovering in
///   place would leave hardware and software disagreeing about forwarding
///   state, which is worse than restarting.
/// - The remaining variants are caller mistakes or lookup misses. They are
///   ordinary recoverable errors; callers may log and skip the affected
///   entity without aborting a whole batch of updates.
#[derive(Debug, Clone, Error)]
pub enum L3Error {
    #[error(transparent)]
    HardwareFault(#[from] HardwareFault),

    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl L3Error {
    /// Creates a lookup-miss error carrying the rendered key.
    pub fn not_found(what: &'static str, key: impl ToString) -> Self {
        L3Error::NotFound {
            what,
            key: key.to_string(),
        }
    }

    /// Returns true if this error is the fatal hardware class.
    pub fn is_hardware_fault(&self) -> bool {
        matches!(self, L3Error::HardwareFault(_))
    }
}

impl From<ParseError> for L3Error {
    fn from(err: ParseError) -> Self {
        L3Error::InvalidConfig(err.to_string())
    }
}

/// Result type for L3 operations.
pub type L3Result<T> = Result<T, L3Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use swhal_sdk::SdkStatus;

    #[test]
    fn test_not_found_renders_key() {
        let err = L3Error::not_found("next hop", "vrf0:10.0.0.1@intf5");
        assert_eq!(err.to_string(), "next hop not found: vrf0:10.0.0.1@intf5");
        assert!(!err.is_hardware_fault());
    }

    #[test]
    fn test_hardware_fault_is_fatal_class() {
        let fault = HardwareFault {
            unit: 0,
            op: "l3_egress_create",
            key: "10.0.0.1".to_string(),
            status: SdkStatus::Full,
        };
        let err = L3Error::from(fault);
        assert!(err.is_hardware_fault());
    }

    #[test]
    fn test_parse_error_is_invalid_config() {
        let err = L3Error::from(ParseError::EmptyLabelStack);
        assert!(matches!(err, L3Error::InvalidConfig(_)));
    }
}
