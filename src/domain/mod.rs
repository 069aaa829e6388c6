//! Domain values - repository snapshots and version numbers, independent of git access

pub mod facts;
pub mod version;

pub use facts::RepositoryFacts;
pub use version::{ComputedVersion, Version};
