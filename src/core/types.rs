/// Pool flavor, mirroring the three classic pool libraries.
///
/// Each kind carries its own ctl registry and its own global-default
/// policy store; handles of different kinds never share state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Object pool
    Obj,
    /// Block pool
    Blk,
    /// Log pool
    Log,
}

impl PoolKind {
    pub const ALL: [PoolKind; 3] = [PoolKind::Obj, PoolKind::Blk, PoolKind::Log];

    pub fn as_str(&self) -> &'static str {
        match self {
            PoolKind::Obj => "obj",
            PoolKind::Blk => "blk",
            PoolKind::Log => "log",
        }
    }
}

impl std::fmt::Display for PoolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed value moving through a ctl leaf.
///
/// The prefault leaves are integer-valued (0/1); `Str` exists so that
/// future string-valued leaves fit the same dispatch and so a caller
/// handing the wrong kind to a leaf gets `TypeMismatch` instead of a
/// silent coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtlValue {
    Int(i32),
    Str(String),
}

impl CtlValue {
    pub fn kind(&self) -> CtlValueKind {
        match self {
            CtlValue::Int(_) => CtlValueKind::Int,
            CtlValue::Str(_) => CtlValueKind::Str,
        }
    }
}

/// Discriminant of [`CtlValue`], used in error reporting and leaf typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtlValueKind {
    Int,
    Str,
}
