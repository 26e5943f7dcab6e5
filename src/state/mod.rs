pub mod backend;
pub mod document;
pub mod permission_store;

pub use backend::{JsonFileBackend, MemoryBackend, StoreBackend};
pub use document::{ChannelSnapshots, StoreDocument};
pub use permission_store::{create_shared_permission_store, PermissionStore, SharedPermissionStore};
