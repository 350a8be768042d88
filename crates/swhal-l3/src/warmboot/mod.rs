//! Warm-boot state dump and reconciliation.
//!
//! A warm boot restarts the process without touching the forwarding state
//! already programmed in hardware. The rule that makes it safe: at startup,
//! read back what the previous run left behind, and let every programming
//! path decide "already correct, leave alone" before it writes anything.

mod cache;
mod state;

pub use cache::WarmBootCache;
pub use state::{EcmpHostState, EcmpMemberState, HostState, WarmBootState};
