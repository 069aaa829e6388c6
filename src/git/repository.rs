use crate::domain::RepositoryFacts;
use crate::error::{AutoVersionError, Result};
use crate::git::GitTool;
use git2::{Repository, Revwalk};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-process repository reader backed by `git2`
pub struct Git2Tool {
    repo: Mutex<Repository>,
    root: PathBuf,
}

impl Git2Tool {
    /// Open the repository containing `path`, searching parent directories
    ///
    /// # Returns
    /// * `Ok(Git2Tool)` - Repository with a working tree
    /// * `Err` - If no repository is found or it is bare
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path)?;
        Self::from_git2(repo)
    }

    /// Wrap an already opened repository
    pub fn from_git2(repo: Repository) -> Result<Self> {
        let root = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| AutoVersionError::config("bare repositories have no working tree"))?;

        Ok(Git2Tool {
            repo: Mutex::new(repo),
            root,
        })
    }

    /// Working tree root, where the config file is looked up
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn repo(&self) -> MutexGuard<'_, Repository> {
        self.repo.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn count(walk: Revwalk<'_>) -> Result<u64> {
    let mut total = 0;
    for oid in walk {
        oid?;
        total += 1;
    }
    Ok(total)
}

impl GitTool for Git2Tool {
    fn facts(&self) -> Result<RepositoryFacts> {
        let repo = self.repo();

        let head = repo.head()?;
        let current_sha = head.peel_to_commit()?.id().to_string();
        let current_branch = if repo.head_detached()? {
            "HEAD".to_string()
        } else {
            head.shorthand().unwrap_or("HEAD").to_string()
        };

        let mut all = repo.revwalk()?;
        all.push_glob("*")?;
        all.push_head()?;
        let total_commit_count = count(all)?;

        let mut reachable = repo.revwalk()?;
        reachable.push_head()?;
        let commits_on_current_branch = count(reachable)?;

        let mut first_parent = repo.revwalk()?;
        first_parent.push_head()?;
        first_parent.simplify_first_parent()?;
        let commits_on_current_branch_since_first_parent = count(first_parent)?;

        Ok(RepositoryFacts {
            current_sha,
            total_commit_count,
            current_branch,
            commits_on_current_branch,
            commits_on_current_branch_since_first_parent,
        })
    }

    fn commits_since(&self, ancestor_sha: &str) -> Result<u64> {
        let repo = self.repo();
        let ancestor = repo.revparse_single(ancestor_sha)?.peel_to_commit()?.id();

        let mut walk = repo.revwalk()?;
        walk.push_head()?;
        walk.simplify_first_parent()?;
        walk.hide(ancestor)?;
        count(walk)
    }
}
