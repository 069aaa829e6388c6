use crate::error::{AutoVersionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up at the repository root.
pub const CONFIG_FILE: &str = ".gitautoversion.json";

/// Branch override configuration for git-autoversion.
///
/// Maps a branch name (case-sensitive) to the version it is pinned to.
/// Branches absent from the map are numbered purely from their commit count.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default, alias = "Branches")]
    pub branches: HashMap<String, BranchOverride>,
}

/// Pins a branch to `major.minor` and an ancestor commit.
///
/// The patch number advances with every first-parent commit made after
/// `parent_sha`; the first such commit maps exactly to the patch in `version`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BranchOverride {
    #[serde(alias = "Version")]
    pub version: String,

    #[serde(rename = "parentSha", alias = "ParentSha", alias = "parent_sha")]
    pub parent_sha: String,
}

impl Config {
    /// Look up the override for a branch
    pub fn branch(&self, name: &str) -> Option<&BranchOverride> {
        self.branches.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

/// On-disk format of a config file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Parses config text in the given format.
///
/// # Returns
/// * `Ok(Config)` - Parsed configuration
/// * `Err` - If the text does not match the expected shape
pub fn parse_config(contents: &str, format: ConfigFormat) -> Result<Config> {
    match format {
        ConfigFormat::Json => serde_json::from_str(contents)
            .map_err(|e| AutoVersionError::config(format!("invalid JSON: {}", e))),
        ConfigFormat::Toml => toml::from_str(contents)
            .map_err(|e| AutoVersionError::config(format!("invalid TOML: {}", e))),
    }
}

/// Chooses which config file to read.
///
/// Resolution order:
/// 1. Custom path provided as parameter
/// 2. `.gitautoversion.json` at the repository root
/// 3. `.gitautoversion.json` in the user config directory
///
/// When none of them exists the repository-root path is returned so the
/// absence is reported against the expected location.
pub fn resolve_config_path(custom: Option<&Path>, repo_root: &Path) -> PathBuf {
    if let Some(path) = custom {
        return path.to_path_buf();
    }

    let root_path = repo_root.join(CONFIG_FILE);
    if root_path.exists() {
        return root_path;
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user_path = config_dir.join(CONFIG_FILE);
        if user_path.exists() {
            return user_path;
        }
    }

    root_path
}

/// Loads configuration from file or returns an empty one.
///
/// Never fails: a missing file is logged at trace level, an unreadable or
/// malformed file at error level, and both yield `Config::default()`.
pub fn load_config(path: &Path) -> Config {
    if !path.exists() {
        log::trace!("Config is not present: {}", path.display());
        return Config::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            log::error!("Config is not readable: {} ({})", path.display(), e);
            return Config::default();
        }
    };

    match parse_config(&contents, ConfigFormat::from_path(path)) {
        Ok(config) => {
            log::debug!(
                "Loaded {} branch override(s) from {}",
                config.branches.len(),
                path.display()
            );
            config
        }
        Err(e) => {
            log::error!("Config is not valid: {} ({})", path.display(), e);
            Config::default()
        }
    }
}
