use crate::core::{CtlError, CtlValue, CtlValueKind, Result};
use crate::policy::PolicyStore;

/// Typed get/set handlers bound to a leaf at registry construction.
///
/// Values cross the leaf boundary as [`CtlValue`]; the pool-or-global
/// scope is resolved before dispatch, so a leaf only ever sees the one
/// [`PolicyStore`] it must read or mutate.
pub trait CtlLeaf: Send + Sync {
    /// Value kind this leaf accepts and produces.
    fn value_kind(&self) -> CtlValueKind;

    /// Read the current value. Never fails on absence: every leaf has
    /// a defined default.
    fn get(&self, store: &PolicyStore) -> Result<CtlValue>;

    /// Validate and store a new value. Either the value is fully
    /// stored or the store is left untouched.
    fn set(&self, store: &mut PolicyStore, value: CtlValue) -> Result<()>;
}

/// A node in the ctl tree: a namespace with children, or a leaf.
pub struct CtlNode {
    name: &'static str,
    kind: CtlNodeKind,
}

pub enum CtlNodeKind {
    Namespace(Vec<CtlNode>),
    Leaf(Box<dyn CtlLeaf>),
}

impl CtlNode {
    pub fn namespace(name: &'static str, children: Vec<CtlNode>) -> Self {
        Self {
            name,
            kind: CtlNodeKind::Namespace(children),
        }
    }

    pub fn leaf(name: &'static str, handlers: Box<dyn CtlLeaf>) -> Self {
        Self {
            name,
            kind: CtlNodeKind::Leaf(handlers),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &CtlNodeKind {
        &self.kind
    }

    /// Exact-match child lookup; `None` on a leaf or a missing name.
    pub fn child(&self, name: &str) -> Option<&CtlNode> {
        match &self.kind {
            CtlNodeKind::Namespace(children) => {
                children.iter().find(|c| c.name == name)
            }
            CtlNodeKind::Leaf(_) => None,
        }
    }
}

/// Which prefault flag a [`PrefaultLeaf`] is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefaultFlag {
    AtOpen,
    AtCreate,
}

/// Boolean prefault leaf, surfaced to callers as an integer 0/1.
///
/// Strict validation: only 0 and 1 are accepted, any other integer is
/// `InvalidValue` and leaves the store unchanged.
pub struct PrefaultLeaf {
    flag: PrefaultFlag,
}

impl PrefaultLeaf {
    pub fn new(flag: PrefaultFlag) -> Self {
        Self { flag }
    }
}

impl CtlLeaf for PrefaultLeaf {
    fn value_kind(&self) -> CtlValueKind {
        CtlValueKind::Int
    }

    fn get(&self, store: &PolicyStore) -> Result<CtlValue> {
        let enabled = match self.flag {
            PrefaultFlag::AtOpen => store.at_open,
            PrefaultFlag::AtCreate => store.at_create,
        };
        Ok(CtlValue::Int(enabled as i32))
    }

    fn set(&self, store: &mut PolicyStore, value: CtlValue) -> Result<()> {
        let raw = match value {
            CtlValue::Int(raw) => raw,
            other => {
                return Err(CtlError::TypeMismatch {
                    expected: CtlValueKind::Int,
                    actual: other.kind(),
                });
            }
        };

        let enabled = match raw {
            0 => false,
            1 => true,
            other => return Err(CtlError::InvalidValue(other)),
        };

        match self.flag {
            PrefaultFlag::AtOpen => store.at_open = enabled,
            PrefaultFlag::AtCreate => store.at_create = enabled,
        }
        Ok(())
    }
}
