// ============================================================================
// pmemctl Library
// ============================================================================

pub mod core;
pub mod ctl;
pub mod policy;
pub mod pool;
pub mod probe;

// Re-export main types for convenience
pub use crate::core::{CtlError, CtlValue, CtlValueKind, PoolKind, Result};
pub use crate::ctl::{CtlRegistry, Scope, ScopeMut, ctl_get, ctl_set};
pub use crate::policy::PolicyStore;
pub use crate::pool::{POOL_HDR_SIZE, Pool};
#[cfg(unix)]
pub use crate::probe::MincoreQuery;
pub use crate::probe::{
    ResidencyQuery, count_resident_pages, page_count, page_size,
};

// ============================================================================
// Runtime control for memory-mapped pools
// ============================================================================

// Every pool kind exposes a dotted-path ctl namespace:
//
//   prefault.at_open    (int, 0/1) -- prefault the mapping on open
//   prefault.at_create  (int, 0/1) -- prefault the mapping on create
//
// A ctl call with Scope::Global targets the kind's process-wide
// defaults, which each pool snapshots at the moment it is created or
// opened. Scope::Pool targets one handle's own store.
