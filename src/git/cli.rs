use crate::domain::RepositoryFacts;
use crate::error::{AutoVersionError, Result};
use crate::git::GitTool;
use crate::process::{
    git_log_level, redact_credentials, LogLevel, OutputStream, RunOptions, ToolRunner,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default bound on a single git query
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Repository reader that runs the `git` binary for every query
#[derive(Debug, Clone)]
pub struct CliGitTool {
    runner: ToolRunner,
    repo_dir: PathBuf,
    timeout: Duration,
}

impl CliGitTool {
    /// Query the repository at `repo_dir` with `git` from `PATH`
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self::with_runner(ToolRunner::new("git"), repo_dir)
    }

    pub fn with_runner(runner: ToolRunner, repo_dir: impl Into<PathBuf>) -> Self {
        CliGitTool {
            runner,
            repo_dir: repo_dir.into(),
            timeout: DEFAULT_GIT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Working tree root as reported by `git rev-parse --show-toplevel`
    pub fn toplevel(&self) -> Result<PathBuf> {
        self.query(&["rev-parse", "--show-toplevel"])
            .map(PathBuf::from)
    }

    fn options(&self) -> RunOptions {
        // Plain query answers are noise at info level; git diagnostics are not.
        RunOptions::new()
            .with_timeout(self.timeout)
            .with_classifier(|line| match git_log_level(line) {
                LogLevel::Normal => LogLevel::Trace,
                level => level,
            })
            .with_filter(redact_credentials)
    }

    /// Run one git command and return its first stdout line
    fn query(&self, args: &[&str]) -> Result<String> {
        let mut handle = self
            .runner
            .start(args, Some(&self.repo_dir), &self.options())?;
        let status = handle.wait_for_exit()?;
        let lines = handle.into_output();

        if !status.success() {
            let stderr: Vec<&str> = lines
                .iter()
                .filter(|l| l.stream == OutputStream::Error)
                .map(|l| l.text.as_str())
                .collect();
            return Err(AutoVersionError::process(format!(
                "git {} failed with {}: {}",
                args.join(" "),
                status,
                stderr.join("\n")
            )));
        }

        lines
            .into_iter()
            .find(|l| l.stream == OutputStream::Standard)
            .map(|l| l.text.trim().to_string())
            .ok_or_else(|| {
                AutoVersionError::process(format!("git {} printed nothing", args.join(" ")))
            })
    }

    fn query_count(&self, args: &[&str]) -> Result<u64> {
        let text = self.query(args)?;
        text.parse::<u64>().map_err(|_| {
            AutoVersionError::process(format!(
                "git {} printed '{}', expected a count",
                args.join(" "),
                text
            ))
        })
    }
}

impl GitTool for CliGitTool {
    fn facts(&self) -> Result<RepositoryFacts> {
        Ok(RepositoryFacts {
            current_sha: self.query(&["rev-parse", "HEAD"])?,
            total_commit_count: self.query_count(&["rev-list", "--count", "--all"])?,
            current_branch: self.query(&["rev-parse", "--abbrev-ref", "HEAD"])?,
            commits_on_current_branch: self.query_count(&["rev-list", "--count", "HEAD"])?,
            commits_on_current_branch_since_first_parent: self.query_count(&[
                "rev-list",
                "--count",
                "--first-parent",
                "HEAD",
            ])?,
        })
    }

    fn commits_since(&self, ancestor_sha: &str) -> Result<u64> {
        let range = format!("{}..HEAD", ancestor_sha);
        self.query_count(&["rev-list", "--count", "--first-parent", &range])
    }
}
