#![allow(dead_code)]

use git2::{Commit, Oid, Repository, RepositoryInitOptions, Signature};
use std::process::Command;
use tempfile::TempDir;

/// Scratch repository with a merged feature branch:
///
/// ```text
/// c1 - c2 - c3 ---- merge   (main, HEAD)
///        \         /
///         f1 - f2           (feature)
/// ```
pub struct ScratchRepo {
    pub repo: Repository,
    pub dir: TempDir,
    pub c1: Oid,
    pub c2: Oid,
    pub c3: Oid,
    pub f2: Oid,
    pub merge: Oid,
}

fn signature() -> Signature<'static> {
    Signature::now("Build Bot", "bot@example.com").unwrap()
}

fn commit_on(repo: &Repository, update_ref: &str, message: &str, parents: &[Oid]) -> Oid {
    let sig = signature();
    let tree_id = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parents: Vec<Commit> = parents
        .iter()
        .map(|oid| repo.find_commit(*oid).unwrap())
        .collect();
    let parent_refs: Vec<&Commit> = parents.iter().collect();
    repo.commit(Some(update_ref), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

pub fn init_repo() -> (TempDir, Repository) {
    let dir = TempDir::new().unwrap();
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(dir.path(), &opts).unwrap();
    (dir, repo)
}

impl ScratchRepo {
    pub fn new() -> Self {
        let (dir, repo) = init_repo();

        let c1 = commit_on(&repo, "HEAD", "c1", &[]);
        let c2 = commit_on(&repo, "HEAD", "c2", &[c1]);

        {
            let base = repo.find_commit(c2).unwrap();
            repo.branch("feature", &base, false).unwrap();
        }
        let f1 = commit_on(&repo, "refs/heads/feature", "f1", &[c2]);
        let f2 = commit_on(&repo, "refs/heads/feature", "f2", &[f1]);

        let c3 = commit_on(&repo, "HEAD", "c3", &[c2]);
        let merge = commit_on(&repo, "HEAD", "merge feature", &[c3, f2]);

        ScratchRepo {
            repo,
            dir,
            c1,
            c2,
            c3,
            f2,
            merge,
        }
    }

    /// Append a first-parent commit to the current branch
    pub fn commit(&self, message: &str) -> Oid {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap().id();
        commit_on(&self.repo, "HEAD", message, &[head])
    }

    /// Point HEAD at another local branch
    pub fn checkout_branch(&self, name: &str) {
        self.repo
            .set_head(&format!("refs/heads/{}", name))
            .unwrap();
    }

    pub fn write_config(&self, json: &str) {
        std::fs::write(self.dir.path().join(".gitautoversion.json"), json).unwrap();
    }
}

/// Whether a usable `git` binary is on PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}
