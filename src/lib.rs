pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod git;
pub mod process;
pub mod ui;

pub use domain::{ComputedVersion, RepositoryFacts, Version};
pub use engine::VersionEngine;
pub use error::{AutoVersionError, Result};
