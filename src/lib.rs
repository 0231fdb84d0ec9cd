pub mod cli;
pub mod config;
pub mod error;
pub mod filters;
pub mod inventory;
pub mod modules;
pub mod openstack;
pub mod process;
pub mod schema;
pub mod terraform;

pub use inventory::group::expand_groups;
pub use inventory::group_map::GroupMap;
