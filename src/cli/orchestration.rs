//! Command-line workflow
//!
//! Turns parsed arguments into an engine and a computed version. Kept apart
//! from `main.rs` so the workflow can be called programmatically without
//! depending on clap's argument structs.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::resolve_config_path;
use crate::domain::ComputedVersion;
use crate::engine::VersionEngine;
use crate::error::{AutoVersionError, Result};
use crate::git::{CliGitTool, Git2Tool, GitTool, DEFAULT_GIT_TIMEOUT};
use crate::process::ToolRunner;

/// How repository facts are read
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// In-process through libgit2
    Libgit2,
    /// By running the git binary
    Cli,
}

/// Arguments for the version workflow
///
/// Mirrors the CLI Args but in a format suitable for orchestration logic.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoVersionArgs {
    /// Directory inside the repository
    pub repo: PathBuf,

    /// Explicit config file, overriding the lookup chain
    pub config_path: Option<PathBuf>,

    pub build_counter: u64,

    /// Build timestamp; the current time when absent
    pub timestamp: Option<DateTime<Utc>>,

    /// Fixed major/minor for legacy numbering
    pub legacy: Option<(u64, u64)>,

    pub backend: Backend,

    /// git executable used by the CLI backend
    pub git_path: PathBuf,

    /// Bound on each git invocation of the CLI backend
    pub git_timeout: Duration,

    /// Recorded instead of the detected host name
    pub machine_id: Option<String>,
}

impl Default for AutoVersionArgs {
    fn default() -> Self {
        AutoVersionArgs {
            repo: PathBuf::from("."),
            config_path: None,
            build_counter: 0,
            timestamp: None,
            legacy: None,
            backend: Backend::Libgit2,
            git_path: PathBuf::from("git"),
            git_timeout: DEFAULT_GIT_TIMEOUT,
            machine_id: None,
        }
    }
}

/// Computes the version described by `args`
///
/// # Returns
/// * `Ok(ComputedVersion)` - The computed version with its repository facts
/// * `Err` - Not a repository, malformed override, or git failure
pub fn compute_version(args: &AutoVersionArgs) -> Result<ComputedVersion> {
    match args.backend {
        Backend::Libgit2 => {
            let engine = VersionEngine::discover(&args.repo, args.config_path.as_deref())?;
            run_engine(engine, args)
        }
        Backend::Cli => {
            let runner = ToolRunner::new(&args.git_path);
            let git = CliGitTool::with_runner(runner, &args.repo).with_timeout(args.git_timeout);
            let root = git.toplevel()?;
            let config_path = resolve_config_path(args.config_path.as_deref(), &root);
            run_engine(VersionEngine::new(git, config_path), args)
        }
    }
}

fn run_engine<G: GitTool>(engine: VersionEngine<G>, args: &AutoVersionArgs) -> Result<ComputedVersion> {
    let engine = match &args.machine_id {
        Some(id) => engine.with_machine_id(id.clone()),
        None => engine,
    };
    log::debug!("Using config {}", engine.config_path().display());

    match (args.legacy, args.timestamp) {
        (Some((major, minor)), timestamp) => engine.compute_legacy(
            major,
            minor,
            args.build_counter,
            timestamp.unwrap_or_else(Utc::now),
        ),
        (None, None) if args.build_counter == 0 => engine.compute_default(),
        (None, timestamp) => {
            engine.compute(args.build_counter, timestamp.unwrap_or_else(Utc::now))
        }
    }
}

/// Parses a `MAJOR.MINOR` pair for legacy numbering
pub fn parse_major_minor(text: &str) -> Result<(u64, u64)> {
    let invalid = || {
        AutoVersionError::version(format!(
            "Invalid legacy version: '{}' - expected MAJOR.MINOR",
            text
        ))
    };

    let (major, minor) = text.trim().split_once('.').ok_or_else(invalid)?;
    let major = major.parse::<u64>().map_err(|_| invalid())?;
    let minor = minor.parse::<u64>().map_err(|_| invalid())?;
    Ok((major, minor))
}
