//! Version computation from repository facts and branch overrides.
//!
//! Branches listed in the config are pinned to `major.minor` from their
//! override, with the patch advancing once per first-parent commit after the
//! override's `parentSha`. Every other branch versions as
//! `0.0.<first-parent commit count>`.
//!
//! A [`VersionEngine`] computes at most once. The first successful call fixes
//! the result for the lifetime of the engine and later calls return it
//! unchanged, whatever arguments they pass.

use crate::config::{load_config, resolve_config_path, Config};
use crate::domain::{ComputedVersion, RepositoryFacts, Version};
use crate::error::{AutoVersionError, Result};
use crate::git::{Git2Tool, GitTool};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

/// Computes and memoizes the build version for one repository
pub struct VersionEngine<G: GitTool> {
    git: G,
    config_path: PathBuf,
    machine_id: String,
    cache: OnceCell<ComputedVersion>,
}

impl VersionEngine<Git2Tool> {
    /// Engine for the repository containing `start`, reading git through libgit2.
    ///
    /// The config is resolved with [`resolve_config_path`] against the
    /// repository's working tree root.
    pub fn discover(start: &Path, custom_config: Option<&Path>) -> Result<Self> {
        let git = Git2Tool::discover(start)?;
        let config_path = resolve_config_path(custom_config, git.root());
        Ok(VersionEngine::new(git, config_path))
    }
}

impl<G: GitTool> VersionEngine<G> {
    pub fn new(git: G, config_path: impl Into<PathBuf>) -> Self {
        VersionEngine {
            git,
            config_path: config_path.into(),
            machine_id: host_machine_id(),
            cache: OnceCell::new(),
        }
    }

    /// Replace the detected host name recorded in computed versions
    pub fn with_machine_id(mut self, machine_id: impl Into<String>) -> Self {
        self.machine_id = machine_id.into();
        self
    }

    pub fn git(&self) -> &G {
        &self.git
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    /// The memoized result, if a computation has already succeeded
    pub fn cached(&self) -> Option<&ComputedVersion> {
        self.cache.get()
    }

    /// Version with build counter 0, stamped with the current UTC time
    pub fn compute_default(&self) -> Result<ComputedVersion> {
        self.memoize(|| self.calculate(0, Utc::now()))
    }

    /// Version for a CI build with its own counter and timestamp
    pub fn compute(&self, build_counter: u64, timestamp: DateTime<Utc>) -> Result<ComputedVersion> {
        self.memoize(|| self.calculate(build_counter, timestamp))
    }

    /// Fixed `major.minor.build_counter`, ignoring branch overrides.
    ///
    /// Repository facts are still read and attached to the result.
    pub fn compute_legacy(
        &self,
        major: u64,
        minor: u64,
        build_counter: u64,
        timestamp: DateTime<Utc>,
    ) -> Result<ComputedVersion> {
        self.memoize(|| {
            let facts = self.git.facts()?;
            let base = self.base_version(build_counter, timestamp, facts);
            Ok(base.with_version(Version::new(major, minor, build_counter)))
        })
    }

    fn memoize<F>(&self, calculate: F) -> Result<ComputedVersion>
    where
        F: FnOnce() -> Result<ComputedVersion>,
    {
        if let Some(version) = self.cache.get() {
            log::trace!("Reusing computed version {}", version);
            return Ok(version.clone());
        }
        self.cache.get_or_try_init(calculate).cloned()
    }

    fn calculate(&self, build_counter: u64, timestamp: DateTime<Utc>) -> Result<ComputedVersion> {
        let config = load_config(&self.config_path);
        let facts = self.git.facts()?;
        let base = self.base_version(build_counter, timestamp, facts);
        calculate_version(base, &config, &self.git)
    }

    fn base_version(
        &self,
        build_counter: u64,
        timestamp: DateTime<Utc>,
        facts: RepositoryFacts,
    ) -> ComputedVersion {
        ComputedVersion {
            major: 0,
            minor: 0,
            patch: 0,
            special: String::new(),
            build_counter,
            timestamp,
            machine_id: self.machine_id.clone(),
            facts,
        }
    }
}

/// Applies branch resolution to a base version.
///
/// # Arguments
/// * `base` - `0.0.0` carrying build inputs and the repository facts
/// * `config` - Branch overrides
/// * `git` - Answers the ancestor query for overridden branches
///
/// # Returns
/// * `Ok(ComputedVersion)` - `base` with the resolved triple
/// * `Err` - The override's version string is malformed, or the ancestor
///   query failed
pub fn calculate_version<G>(
    base: ComputedVersion,
    config: &Config,
    git: &G,
) -> Result<ComputedVersion>
where
    G: GitTool + ?Sized,
{
    let branch = base.facts.current_branch.as_str();

    match config.branch(branch) {
        Some(entry) => {
            let pinned = Version::parse(&entry.version)?;
            let since = git.commits_since(&entry.parent_sha)?;
            // The first commit after parentSha lands exactly on the pinned patch.
            let patch = match since {
                0 => pinned.patch.saturating_sub(1),
                n => pinned.patch.checked_add(n - 1).ok_or_else(|| {
                    AutoVersionError::version(format!(
                        "Patch overflows for '{}' with {} commit(s) since {}",
                        entry.version, since, entry.parent_sha
                    ))
                })?,
            };

            log::info!(
                "Branch '{}' pinned to {} ({} commit(s) since {})",
                branch,
                entry.version,
                since,
                entry.parent_sha
            );
            Ok(base.with_version(Version::new(pinned.major, pinned.minor, patch)))
        }
        None => {
            let patch = base.facts.commits_on_current_branch_since_first_parent;
            log::info!(
                "Branch '{}' has no override, {} first-parent commit(s)",
                branch,
                patch
            );
            let version = Version::new(base.major, base.minor, patch);
            Ok(base.with_version(version))
        }
    }
}

/// Host name of this machine, or `unknown`
pub fn host_machine_id() -> String {
    sysinfo::System::host_name()
        .or_else(|| std::env::var("HOSTNAME").ok())
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
