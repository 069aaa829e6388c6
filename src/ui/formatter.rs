//! Pure formatting functions for UI output.
//!
//! Status lines go to stderr so stdout carries only the version itself.

use console::style;

use crate::domain::ComputedVersion;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    eprintln!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    eprintln!("{} {}", style("→").yellow(), message);
}

/// Multi-line description of a computed version and its inputs.
///
/// # Arguments
/// * `version` - The computed version to describe
pub fn format_version_report(version: &ComputedVersion) -> String {
    let facts = &version.facts;
    let mut lines = vec![
        format!("Version:       {}", version),
        format!(
            "Branch:        {} @ {}",
            facts.current_branch,
            facts.short_sha()
        ),
        format!(
            "Commits:       {} on branch, {} first-parent, {} total",
            facts.commits_on_current_branch,
            facts.commits_on_current_branch_since_first_parent,
            facts.total_commit_count
        ),
        format!("Build counter: {}", version.build_counter),
        format!("Timestamp:     {}", version.timestamp.to_rfc3339()),
        format!("Machine:       {}", version.machine_id),
    ];
    if !version.special.is_empty() {
        lines.insert(1, format!("Special:       {}", version.special));
    }
    lines.join("\n")
}

/// Display the version report with a bold heading.
pub fn display_version_report(version: &ComputedVersion) {
    println!("{}", style("Computed version").bold());
    for line in format_version_report(version).lines() {
        println!("  {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RepositoryFacts;
    use chrono::{TimeZone, Utc};

    fn sample() -> ComputedVersion {
        ComputedVersion {
            major: 2,
            minor: 3,
            patch: 11,
            special: String::new(),
            build_counter: 40,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            machine_id: "ci-7".to_string(),
            facts: RepositoryFacts {
                current_sha: "9fceb02d0ae598e95dc970b74767f19372d61af8".to_string(),
                total_commit_count: 310,
                current_branch: "release/2.3".to_string(),
                commits_on_current_branch: 300,
                commits_on_current_branch_since_first_parent: 120,
            },
        }
    }

    #[test]
    fn test_report_contains_inputs() {
        let report = format_version_report(&sample());
        assert!(report.contains("2.3.11+40"));
        assert!(report.contains("release/2.3 @ 9fceb02"));
        assert!(report.contains("300 on branch, 120 first-parent, 310 total"));
        assert!(report.contains("2024-01-02T03:04:05+00:00"));
        assert!(report.contains("ci-7"));
        assert!(!report.contains("Special"));
    }

    #[test]
    fn test_report_lists_special_when_set() {
        let mut version = sample();
        version.special = "rc1".to_string();
        let report = format_version_report(&version);
        assert!(report.contains("Special:       rc1"));
    }

    #[test]
    fn test_display_error() {
        // Visual verification test - output is printed to stderr
        display_error("test error");
    }
}
