pub mod api;
pub mod resolver;
pub mod view;

pub use api::{GuildApi, SerenityGuildApi};
pub use resolver::{ensure_within_hierarchy, resolve_channels, resolve_role, resolve_roles};
pub use view::{ChannelInfo, GuildView, RoleInfo};
