use crate::domain::RepositoryFacts;
use crate::error::{AutoVersionError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic version triple as written in branch overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse version from an override string (e.g., "2.3.10" or "v2.3.10")
    ///
    /// Pre-release and build metadata are accepted by the grammar but dropped;
    /// only the numeric triple takes part in version computation.
    pub fn parse(text: &str) -> Result<Self> {
        let clean = text.trim().trim_start_matches('v').trim_start_matches('V');

        let parsed = semver::Version::parse(clean).map_err(|e| {
            AutoVersionError::version(format!(
                "Invalid version format: '{}' - expected X.Y.Z ({})",
                text, e
            ))
        })?;

        Ok(Version::new(parsed.major, parsed.minor, parsed.patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// The version produced for one build.
///
/// Carries the repository snapshot it was derived from so callers can log
/// or serialize the inputs alongside the number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Free-form build qualifier, rendered as a pre-release suffix when set
    pub special: String,
    pub build_counter: u64,
    pub timestamp: DateTime<Utc>,
    pub machine_id: String,
    pub facts: RepositoryFacts,
}

impl ComputedVersion {
    /// The bare `major.minor.patch` triple
    pub fn version(&self) -> Version {
        Version::new(self.major, self.minor, self.patch)
    }

    /// Same build inputs with a different numeric triple
    pub fn with_version(&self, version: Version) -> Self {
        ComputedVersion {
            major: version.major,
            minor: version.minor,
            patch: version.patch,
            ..self.clone()
        }
    }
}

impl fmt::Display for ComputedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.special.is_empty() {
            write!(f, "-{}", self.special)?;
        }
        if self.build_counter > 0 {
            write!(f, "+{}", self.build_counter)?;
        }
        Ok(())
    }
}
