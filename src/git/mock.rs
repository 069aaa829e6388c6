use crate::domain::RepositoryFacts;
use crate::error::{AutoVersionError, Result};
use crate::git::GitTool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock repository for testing without actual git operations
pub struct MockGitTool {
    facts: RepositoryFacts,
    ancestors: HashMap<String, u64>,
    fact_queries: AtomicUsize,
}

impl MockGitTool {
    /// Create a mock that reports `facts`
    pub fn new(facts: RepositoryFacts) -> Self {
        MockGitTool {
            facts,
            ancestors: HashMap::new(),
            fact_queries: AtomicUsize::new(0),
        }
    }

    /// Mock positioned on `branch` with `first_parent_commits` on its chain
    pub fn on_branch(branch: impl Into<String>, first_parent_commits: u64) -> Self {
        Self::new(RepositoryFacts {
            current_sha: "0000000000000000000000000000000000000000".to_string(),
            total_commit_count: first_parent_commits,
            current_branch: branch.into(),
            commits_on_current_branch: first_parent_commits,
            commits_on_current_branch_since_first_parent: first_parent_commits,
        })
    }

    /// Answer `commits_since(sha)` with `count`
    pub fn with_ancestor(mut self, sha: impl Into<String>, count: u64) -> Self {
        self.ancestors.insert(sha.into(), count);
        self
    }

    /// How many times `facts` has been called
    pub fn fact_queries(&self) -> usize {
        self.fact_queries.load(Ordering::SeqCst)
    }
}

impl GitTool for MockGitTool {
    fn facts(&self) -> Result<RepositoryFacts> {
        self.fact_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.facts.clone())
    }

    fn commits_since(&self, ancestor_sha: &str) -> Result<u64> {
        self.ancestors.get(ancestor_sha).copied().ok_or_else(|| {
            AutoVersionError::Git(git2::Error::from_str(&format!(
                "revspec '{}' not found",
                ancestor_sha
            )))
        })
    }
}
