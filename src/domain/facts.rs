use serde::{Deserialize, Serialize};

/// Snapshot of repository state taken once per version computation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryFacts {
    /// Full id of the HEAD commit
    pub current_sha: String,
    /// Commits reachable from any reference
    pub total_commit_count: u64,
    /// Short branch name, `HEAD` when detached
    pub current_branch: String,
    /// Commits reachable from HEAD
    pub commits_on_current_branch: u64,
    /// Commits on HEAD's first-parent chain
    pub commits_on_current_branch_since_first_parent: u64,
}

impl RepositoryFacts {
    /// Abbreviated HEAD id for display
    pub fn short_sha(&self) -> &str {
        if self.current_sha.len() > 7 {
            &self.current_sha[..7]
        } else {
            self.current_sha.as_str()
        }
    }
}
