//! SDK status codes and the hardware fault error.
//!
//! Status codes follow the vendor convention of zero for success and small
//! negative numbers for failures. A failed programming call means the
//! hardware and software views of forwarding state can no longer be trusted
//! to agree, so everything except the benign "not found" on removes is
//! surfaced as a [`HardwareFault`] that callers let propagate to the
//! top-level command loop.

use std::fmt;
use thiserror::Error;

/// Raw SDK status codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkStatus {
    None = 0,
    Internal = -1,
    Memory = -2,
    Unit = -3,
    Param = -4,
    Empty = -5,
    Full = -6,
    NotFound = -7,
    Exists = -8,
    Timeout = -9,
    Busy = -10,
    Fail = -11,
    Disabled = -12,
    BadId = -13,
    Resource = -14,
    Config = -15,
    Unavail = -16,
    Init = -17,
    Port = -18,
}

impl SdkStatus {
    /// Creates a status from a raw i32 value.
    pub fn from_raw(status: i32) -> Self {
        match status {
            0 => SdkStatus::None,
            -1 => SdkStatus::Internal,
            -2 => SdkStatus::Memory,
            -3 => SdkStatus::Unit,
            -4 => SdkStatus::Param,
            -5 => SdkStatus::Empty,
            -6 => SdkStatus::Full,
            -7 => SdkStatus::NotFound,
            -8 => SdkStatus::Exists,
            -9 => SdkStatus::Timeout,
            -10 => SdkStatus::Busy,
            -12 => SdkStatus::Disabled,
            -13 => SdkStatus::BadId,
            -14 => SdkStatus::Resource,
            -15 => SdkStatus::Config,
            -16 => SdkStatus::Unavail,
            -17 => SdkStatus::Init,
            -18 => SdkStatus::Port,
            _ => SdkStatus::Fail,
        }
    }

    /// Returns true if the status indicates success.
    pub fn is_success(&self) -> bool {
        *self == SdkStatus::None
    }

    /// Returns true if the status is the benign "entry not found" code.
    pub fn is_not_found(&self) -> bool {
        *self == SdkStatus::NotFound
    }
}

impl fmt::Display for SdkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SdkStatus::None => "E_NONE",
            SdkStatus::Internal => "E_INTERNAL",
            SdkStatus::Memory => "E_MEMORY",
            SdkStatus::Unit => "E_UNIT",
            SdkStatus::Param => "E_PARAM",
            SdkStatus::Empty => "E_EMPTY",
            SdkStatus::Full => "E_FULL",
            SdkStatus::NotFound => "E_NOT_FOUND",
            SdkStatus::Exists => "E_EXISTS",
            SdkStatus::Timeout => "E_TIMEOUT",
            SdkStatus::Busy => "E_BUSY",
            SdkStatus::Fail => "E_FAIL",
            SdkStatus::Disabled => "E_DISABLED",
            SdkStatus::BadId => "E_BADID",
            SdkStatus::Resource => "E_RESOURCE",
            SdkStatus::Config => "E_CONFIG",
            SdkStatus::Unavail => "E_UNAVAIL",
            SdkStatus::Init => "E_INIT",
            SdkStatus::Port => "E_PORT",
        };
        write!(f, "{}", s)
    }
}

/// Result type for raw SDK calls.
pub type SdkResult<T> = Result<T, SdkStatus>;

/// A failed hardware programming call.
///
/// This is the fatal error class: nothing in the L3 subsystem catches it.
/// It carries the hardware unit, the failed operation, and the
/// string-rendered key of the entity involved so the top-level loop can log
/// a usable diagnostic before aborting.
#[derive(Debug, Clone, Error)]
#[error("hardware fault on unit {unit}: {op} failed for {key}: {status}")]
pub struct HardwareFault {
    pub unit: i32,
    pub op: &'static str,
    pub key: String,
    pub status: SdkStatus,
}

/// Converts an SDK call result, turning any failure into a fault.
pub fn check<T>(
    unit: i32,
    op: &'static str,
    key: impl fmt::Display,
    result: SdkResult<T>,
) -> Result<T, HardwareFault> {
    result.map_err(|status| HardwareFault {
        unit,
        op,
        key: key.to_string(),
        status,
    })
}

/// Converts an SDK remove/delete result.
///
/// `NotFound` maps to `Ok(false)`: a racing remove already satisfied the
/// postcondition. Success maps to `Ok(true)`.
pub fn check_remove(
    unit: i32,
    op: &'static str,
    key: impl fmt::Display,
    result: SdkResult<()>,
) -> Result<bool, HardwareFault> {
    match result {
        Ok(()) => Ok(true),
        Err(status) if status.is_not_found() => Ok(false),
        Err(status) => Err(HardwareFault {
            unit,
            op,
            key: key.to_string(),
            status,
        }),
    }
}
