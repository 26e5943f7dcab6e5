pub mod permission_manager;

pub use permission_manager::{
    create_shared_permission_manager, BulkReport, PairOutcome, PermissionManager,
    SharedPermissionManager,
};
