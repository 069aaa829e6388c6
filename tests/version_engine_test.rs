mod common;

use chrono::{TimeZone, Utc};
use common::ScratchRepo;
use git_autoversion::config::CONFIG_FILE;
use git_autoversion::git::{Git2Tool, GitTool, MockGitTool};
use git_autoversion::{AutoVersionError, VersionEngine};
use std::sync::Arc;
use std::thread;

fn pin_main(scratch: &ScratchRepo, version: &str) {
    scratch.write_config(&format!(
        r#"{{"branches": {{"main": {{"version": "{}", "parentSha": "{}"}}}}}}"#,
        version, scratch.c2
    ));
}

#[test]
fn test_unpinned_branch_counts_first_parent_commits() {
    let scratch = ScratchRepo::new();
    let engine = VersionEngine::discover(scratch.dir.path(), None).unwrap();

    let version = engine.compute_default().unwrap();
    assert_eq!(version.to_string(), "0.0.4");
    assert_eq!(version.build_counter, 0);
    assert_eq!(version.facts.current_branch, "main");
}

#[test]
fn test_pinned_branch_uses_override() {
    let scratch = ScratchRepo::new();
    pin_main(&scratch, "2.5.0");

    let engine = VersionEngine::discover(scratch.dir.path(), None).unwrap();
    assert_eq!(engine.config_path().file_name().unwrap(), CONFIG_FILE);

    // merge and c3 follow c2 on the first-parent chain
    let version = engine.compute_default().unwrap();
    assert_eq!(version.version().to_string(), "2.5.1");
}

#[test]
fn test_first_commit_after_parent_lands_on_pinned_patch() {
    let scratch = ScratchRepo::new();
    scratch.write_config(&format!(
        r#"{{"branches": {{"main": {{"version": "1.2.7", "parentSha": "{}"}}}}}}"#,
        scratch.c3
    ));

    let engine = VersionEngine::discover(scratch.dir.path(), None).unwrap();
    assert_eq!(engine.compute_default().unwrap().to_string(), "1.2.7");
}

#[test]
fn test_new_commits_advance_patch() {
    let scratch = ScratchRepo::new();
    pin_main(&scratch, "2.5.3");
    scratch.commit("after merge");
    scratch.commit("another");

    let engine = VersionEngine::discover(scratch.dir.path(), None).unwrap();
    assert_eq!(engine.compute_default().unwrap().to_string(), "2.5.6");
}

#[test]
fn test_override_for_other_branch_is_ignored() {
    let scratch = ScratchRepo::new();
    pin_main(&scratch, "9.9.9");
    scratch.checkout_branch("feature");

    let engine = VersionEngine::discover(scratch.dir.path(), None).unwrap();
    let version = engine.compute_default().unwrap();
    assert_eq!(version.to_string(), "0.0.4");
    assert_eq!(version.facts.current_branch, "feature");
}

#[test]
fn test_custom_config_path() {
    let scratch = ScratchRepo::new();
    let elsewhere = tempfile::TempDir::new().unwrap();
    let custom = elsewhere.path().join("versions.toml");
    std::fs::write(
        &custom,
        format!(
            "[branches.main]\nversion = \"4.1.0\"\nparentSha = \"{}\"\n",
            scratch.c3
        ),
    )
    .unwrap();

    let engine = VersionEngine::discover(scratch.dir.path(), Some(&custom)).unwrap();
    assert_eq!(engine.config_path(), custom.as_path());
    assert_eq!(engine.compute_default().unwrap().to_string(), "4.1.0");
}

#[test]
fn test_malformed_config_falls_back_to_commit_count() {
    let scratch = ScratchRepo::new();
    scratch.write_config("{ not json");

    let engine = VersionEngine::discover(scratch.dir.path(), None).unwrap();
    assert_eq!(engine.compute_default().unwrap().to_string(), "0.0.4");
}

#[test]
fn test_malformed_override_version_is_error() {
    let scratch = ScratchRepo::new();
    pin_main(&scratch, "two.five");

    let engine = VersionEngine::discover(scratch.dir.path(), None).unwrap();
    let err = engine.compute_default().unwrap_err();
    assert!(matches!(err, AutoVersionError::Version(_)));
    assert!(engine.cached().is_none());
}

#[test]
fn test_unknown_parent_sha_is_error() {
    let scratch = ScratchRepo::new();
    scratch.write_config(
        r#"{"branches": {"main": {"version": "1.0.0", "parentSha": "0123456789abcdef0123456789abcdef01234567"}}}"#,
    );

    let engine = VersionEngine::discover(scratch.dir.path(), None).unwrap();
    assert!(engine.compute_default().is_err());
}

#[test]
fn test_ci_build_inputs_are_recorded() {
    let scratch = ScratchRepo::new();
    let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

    let engine = VersionEngine::discover(scratch.dir.path(), None)
        .unwrap()
        .with_machine_id("ci-agent-7");
    let version = engine.compute(42, timestamp).unwrap();

    assert_eq!(version.to_string(), "0.0.4+42");
    assert_eq!(version.timestamp, timestamp);
    assert_eq!(version.machine_id, "ci-agent-7");
    assert_eq!(version.facts.current_sha, scratch.merge.to_string());
}

#[test]
fn test_legacy_numbering_ignores_overrides() {
    let scratch = ScratchRepo::new();
    pin_main(&scratch, "2.5.0");
    let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

    let engine = VersionEngine::discover(scratch.dir.path(), None).unwrap();
    let version = engine.compute_legacy(3, 1, 118, timestamp).unwrap();

    assert_eq!(version.version().to_string(), "3.1.118");
    assert_eq!(version.facts.commits_on_current_branch_since_first_parent, 4);
}

#[test]
fn test_result_is_fixed_after_first_call() {
    let scratch = ScratchRepo::new();
    let engine = VersionEngine::discover(scratch.dir.path(), None).unwrap();

    let first = engine.compute_default().unwrap();
    scratch.commit("later");
    let timestamp = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let second = engine.compute(99, timestamp).unwrap();

    assert_eq!(first, second);
    assert_eq!(second.to_string(), "0.0.4");

    let fresh = VersionEngine::discover(scratch.dir.path(), None).unwrap();
    assert_eq!(fresh.compute_default().unwrap().to_string(), "0.0.5");
}

#[test]
fn test_concurrent_callers_share_one_computation() {
    let git = MockGitTool::on_branch("develop", 12);
    let engine = Arc::new(VersionEngine::new(git, "/nonexistent/.gitautoversion.json"));

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, i).unwrap();
                engine.compute(i as u64, timestamp).unwrap()
            })
        })
        .collect();

    let results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(engine.git().fact_queries(), 1);
}

#[test]
fn test_engine_over_git2_tool_directly() {
    let scratch = ScratchRepo::new();
    let git = Git2Tool::discover(scratch.dir.path()).unwrap();
    let config_path = git.root().join(CONFIG_FILE);
    assert_eq!(git.facts().unwrap().total_commit_count, 6);

    let engine = VersionEngine::new(git, config_path).with_machine_id("box");
    let version = engine.compute_default().unwrap();
    assert_eq!(version.machine_id, "box");
    assert_eq!(engine.cached(), Some(&version));
}
