pub mod node;
pub mod path;
pub mod registry;

pub use node::{CtlLeaf, CtlNode, CtlNodeKind, PrefaultFlag, PrefaultLeaf};
pub use path::CtlPath;
pub use registry::CtlRegistry;

use crate::core::{CtlError, CtlValue, CtlValueKind, PoolKind, Result};
use crate::pool::Pool;

/// Read scope of a ctl query: a kind's global defaults, or one pool.
///
/// Spelled out as two cases rather than a nullable handle, so the
/// global branch must name its kind.
pub enum Scope<'a> {
    Global(PoolKind),
    Pool(&'a Pool),
}

/// Write scope of a ctl mutation.
pub enum ScopeMut<'a> {
    Global(PoolKind),
    Pool(&'a mut Pool),
}

/// Query a ctl leaf, returning its value as an integer.
///
/// `prefault.at_open` and `prefault.at_create` report 0 (disabled) or
/// 1 (enabled).
pub fn ctl_get(scope: Scope<'_>, path: &str) -> Result<i32> {
    let value = match scope {
        Scope::Global(kind) => CtlRegistry::for_kind(kind).default_get(path)?,
        Scope::Pool(pool) => {
            CtlRegistry::for_kind(pool.kind()).get(pool.policy(), path)?
        }
    };

    match value {
        CtlValue::Int(v) => Ok(v),
        other => Err(CtlError::TypeMismatch {
            expected: CtlValueKind::Int,
            actual: other.kind(),
        }),
    }
}

/// Mutate a ctl leaf with an integer value.
///
/// The prefault leaves accept exactly 0 or 1. A failed call leaves the
/// selected store exactly as it was.
pub fn ctl_set(scope: ScopeMut<'_>, path: &str, value: i32) -> Result<()> {
    let value = CtlValue::Int(value);
    match scope {
        ScopeMut::Global(kind) => {
            CtlRegistry::for_kind(kind).default_set(path, value)
        }
        ScopeMut::Pool(pool) => {
            let kind = pool.kind();
            CtlRegistry::for_kind(kind).set(pool.policy_mut(), path, value)
        }
    }
}
