pub mod builder;
pub mod group;
pub mod group_map;
pub mod host;

pub use builder::InventoryBuilder;
pub use group::{expand_groups, Group};
pub use group_map::GroupMap;
pub use host::Host;
