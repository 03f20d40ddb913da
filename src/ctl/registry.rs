use std::sync::RwLock;

use lazy_static::lazy_static;
use log::{debug, trace};

use super::node::{CtlLeaf, CtlNode, CtlNodeKind, PrefaultFlag, PrefaultLeaf};
use super::path::CtlPath;
use crate::core::{CtlError, CtlValue, PoolKind, Result};
use crate::policy::PolicyStore;

lazy_static! {
    static ref OBJ_REGISTRY: CtlRegistry = CtlRegistry::new(PoolKind::Obj);
    static ref BLK_REGISTRY: CtlRegistry = CtlRegistry::new(PoolKind::Blk);
    static ref LOG_REGISTRY: CtlRegistry = CtlRegistry::new(PoolKind::Log);
}

/// Per-kind ctl tree plus the kind's global-default policy store.
///
/// The tree topology is fixed at construction; only the policy stores
/// the leaves dispatch into are mutable. One registry exists per
/// [`PoolKind`] for the lifetime of the process.
pub struct CtlRegistry {
    kind: PoolKind,
    root: CtlNode,
    defaults: RwLock<PolicyStore>,
}

impl CtlRegistry {
    fn new(kind: PoolKind) -> Self {
        let root = CtlNode::namespace(
            "",
            vec![CtlNode::namespace(
                "prefault",
                vec![
                    CtlNode::leaf(
                        "at_open",
                        Box::new(PrefaultLeaf::new(PrefaultFlag::AtOpen)),
                    ),
                    CtlNode::leaf(
                        "at_create",
                        Box::new(PrefaultLeaf::new(PrefaultFlag::AtCreate)),
                    ),
                ],
            )],
        );

        Self {
            kind,
            root,
            defaults: RwLock::new(PolicyStore::new()),
        }
    }

    /// The process-wide registry for a pool kind.
    pub fn for_kind(kind: PoolKind) -> &'static CtlRegistry {
        match kind {
            PoolKind::Obj => &OBJ_REGISTRY,
            PoolKind::Blk => &BLK_REGISTRY,
            PoolKind::Log => &LOG_REGISTRY,
        }
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    /// Walk the tree along the path's tokens down to a leaf.
    ///
    /// A token with no matching child (including tokens left over
    /// below a leaf) is `UnknownPath`; running out of tokens on a
    /// namespace is `IncompletePath`.
    pub fn resolve(&self, path: &CtlPath) -> Result<&dyn CtlLeaf> {
        trace!("resolve {}.{}", self.kind, path.raw());

        let mut node = &self.root;
        for token in path.tokens() {
            node = node
                .child(token)
                .ok_or_else(|| CtlError::UnknownPath(path.raw().to_string()))?;
        }

        match node.kind() {
            CtlNodeKind::Leaf(leaf) => Ok(leaf.as_ref()),
            CtlNodeKind::Namespace(_) => {
                Err(CtlError::IncompletePath(path.raw().to_string()))
            }
        }
    }

    /// Read a leaf value out of a specific policy store.
    pub fn get(&self, store: &PolicyStore, path: &str) -> Result<CtlValue> {
        let path = CtlPath::parse(path)?;
        self.resolve(&path)?.get(store)
    }

    /// Write a leaf value into a specific policy store.
    pub fn set(
        &self,
        store: &mut PolicyStore,
        path: &str,
        value: CtlValue,
    ) -> Result<()> {
        let path = CtlPath::parse(path)?;
        let leaf = self.resolve(&path)?;
        leaf.set(store, value.clone())?;
        debug!("ctl {}.{} = {:?}", self.kind, path.raw(), value);
        Ok(())
    }

    /// Read a leaf value from this kind's global defaults.
    pub fn default_get(&self, path: &str) -> Result<CtlValue> {
        let store = self.defaults.read()?;
        self.get(&store, path)
    }

    /// Write a leaf value into this kind's global defaults.
    ///
    /// Visible to every pool of this kind created or opened afterwards;
    /// already-live handles keep their own snapshot.
    pub fn default_set(&self, path: &str, value: CtlValue) -> Result<()> {
        let mut store = self.defaults.write()?;
        self.set(&mut store, path, value)
    }

    /// Copy of the current global defaults, taken by the pool engine at
    /// the instant a pool is created or opened.
    pub fn snapshot_defaults(&self) -> Result<PolicyStore> {
        Ok(*self.defaults.read()?)
    }
}
