pub mod catalog;
pub mod overwrite;

pub use catalog::PermissionFlag;
pub use overwrite::{FlagState, OverwriteSettings};
