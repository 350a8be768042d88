//! Next-hop identity and reference-counted composition.

mod multipath;
#[allow(clippy::module_inception)]
mod nexthop;
mod types;

pub use multipath::MultiPathNextHop;
pub use nexthop::NextHop;
pub use types::{HostKey, NextHopSpec, RouteNextHopSet};
