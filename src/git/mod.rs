//! Repository access behind the [`GitTool`] trait
//!
//! The version engine only needs a [`RepositoryFacts`] snapshot and one
//! ancestry query, so that is all the trait exposes. Implementations:
//!
//! - [`Git2Tool`]: reads the repository in-process through `git2`
//! - [`CliGitTool`]: shells out to the `git` binary through [`crate::process`]
//! - [`MockGitTool`]: fixed answers for tests
//!
//! # Counting rules
//!
//! All counts follow `git rev-list --count` semantics. First-parent counts
//! walk from HEAD along first-parent links only; `commits_since(sha)`
//! excludes `sha` and everything reachable from it, and includes HEAD.

pub mod cli;
pub mod mock;
pub mod repository;

pub use cli::{CliGitTool, DEFAULT_GIT_TIMEOUT};
pub use mock::MockGitTool;
pub use repository::Git2Tool;

use crate::domain::RepositoryFacts;
use crate::error::Result;

/// Source of repository facts for version computation
///
/// ## Thread Safety
///
/// All implementors must be `Send + Sync` so an engine can be shared across
/// threads.
pub trait GitTool: Send + Sync {
    /// Snapshot of the current working tree's HEAD
    ///
    /// # Returns
    /// * `Ok(RepositoryFacts)` - Branch, HEAD id and commit counts
    /// * `Err` - Not a repository, unborn HEAD, or the query failed
    fn facts(&self) -> Result<RepositoryFacts>;

    /// Number of first-parent commits from HEAD back to, but not including,
    /// `ancestor_sha`
    ///
    /// `ancestor_sha` may be abbreviated. When HEAD is `ancestor_sha` the
    /// result is 0.
    fn commits_since(&self, ancestor_sha: &str) -> Result<u64>;
}
