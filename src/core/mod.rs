pub mod error;
pub mod types;

pub use error::{CtlError, Result};
pub use types::{CtlValue, CtlValueKind, PoolKind};
