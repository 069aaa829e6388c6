//! Ready-made classifiers and filters for git output.

use crate::process::LogLevel;
use once_cell::sync::Lazy;
use regex::Regex;

static URL_CREDENTIALS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*://)[^/\s:@]+:[^/\s@]+@")
        .expect("credential pattern is valid")
});

/// Severity of a git stdout line, keyed on git's own message prefixes
pub fn git_log_level(line: &str) -> LogLevel {
    let trimmed = line.trim_start();
    if trimmed.starts_with("fatal:") || trimmed.starts_with("error:") {
        LogLevel::Error
    } else if trimmed.starts_with("warning:") || trimmed.starts_with("hint:") {
        LogLevel::Warning
    } else {
        LogLevel::Normal
    }
}

/// Mask `user:password@` in URLs before a line reaches the log
pub fn redact_credentials(line: &str) -> String {
    URL_CREDENTIALS
        .replace_all(line, "${scheme}***@")
        .into_owned()
}
