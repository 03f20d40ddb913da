/// Mutable policy state behind the ctl leaves.
///
/// One instance per scope: each pool kind owns a global-default store
/// (consulted when a ctl call carries no pool handle), and every live
/// pool handle owns its own copy, snapshotted from the global default
/// at the moment the pool was created or opened. Mutating one store
/// never affects another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolicyStore {
    /// Prefault the whole mapping when an existing pool is opened.
    pub at_open: bool,
    /// Prefault the whole mapping when a new pool is created.
    pub at_create: bool,
}

impl PolicyStore {
    /// Both flags start disabled.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_disabled() {
        let store = PolicyStore::new();
        assert!(!store.at_open);
        assert!(!store.at_create);
    }

    #[test]
    fn test_copies_are_independent() {
        let mut global = PolicyStore::new();
        global.at_create = true;

        let mut snapshot = global;
        assert!(snapshot.at_create);

        snapshot.at_create = false;
        assert!(global.at_create);
    }
}
