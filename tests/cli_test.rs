//! Integration tests for the swallower binary
//!
//! Covers `plan`, `check`, `globs` and `run` against manifests written to a
//! temporary project directory.

mod common;

use common::{stderr, stdout, TestProject, SAMPLE_MANIFEST};

const STUCK_MANIFEST: &str = r#"
[[tasks]]
name = "only"
template = "list-globs"
options = { glob_sets = [] }

[[plugins]]
id = "orphan"
requires = ["nobody"]
"#;

const SHADOWING_SET_MANIFEST: &str = r#"
[glob_sets]
scripts = "a.js"

[[tasks]]
name = "build"
template = "list-globs"
options = { glob_sets = ["scripts"] }

[[task_sets]]
name = "build"
tasks = ["build"]
"#;

#[test]
fn test_plan_lists_plugins_and_registrations() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);
    let output = project.run(&["plan"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("styles → docs"), "{out}");
    assert!(out.contains("series default [lint, docs, build]"), "{out}");
    assert!(out.contains("3 tasks, 1 task sets"), "{out}");
}

#[test]
fn test_plan_json() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);
    let output = project.run(&["--json", "plan"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(report["plugins"], serde_json::json!(["styles", "docs"]));
    let names: Vec<&str> = report["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["lint", "build", "docs", "default"]);
    assert_eq!(report["entries"][3]["kind"], "set");
    assert_eq!(report["entries"][3]["mode"], "series");
}

#[test]
fn test_check_valid_manifest() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);
    let output = project.run(&["check"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Manifest is valid"));
    assert!(out.contains("1. styles"));
    assert!(out.contains("2. docs"));
}

#[test]
fn test_check_reports_errors_and_fails() {
    let project = TestProject::with_manifest(
        r#"
[[tasks]]
name = "x"
template = "teleport"

[[task_sets]]
name = "default"
tasks = ["ghost"]
"#,
    );
    let output = project.run(&["check"]);

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("teleport"));
    assert!(out.contains("ghost"));
    assert!(stderr(&output).contains("Check failed with 2 error(s)"));
}

#[test]
fn test_check_warns_when_set_shadows_task() {
    let project = TestProject::with_manifest(SHADOWING_SET_MANIFEST);
    let output = project.run(&["check"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Task set 'build' has the same name as a task"));
}

#[test]
fn test_check_rejects_set_created_later() {
    let project = TestProject::with_manifest(
        r#"
[[tasks]]
name = "lint"
template = "list-globs"
options = { glob_sets = [] }

[[task_sets]]
name = "default"
tasks = ["sub"]

[[task_sets]]
name = "sub"
tasks = ["lint"]
"#,
    );

    let check = project.run(&["check"]);
    assert_eq!(check.status.code(), Some(1));
    assert!(stdout(&check).contains("references task set 'sub' before it is created"));

    let plan = project.run(&["plan"]);
    assert_eq!(plan.status.code(), Some(1));
}

#[test]
fn test_check_json() {
    let project = TestProject::with_manifest(STUCK_MANIFEST);
    let output = project.run(&["check", "--json"]);

    assert!(!output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["stuck_plugins"], serde_json::json!(["orphan"]));
}

#[test]
fn test_globs_after_plugins() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);
    let output = project.run(&["globs", "scripts"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "scripts:\n  src/**/*.js\n  lib/**/*.js\n  docs/**/*.js\n"
    );
}

#[test]
fn test_globs_unknown_id_fails() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);
    let output = project.run(&["globs", "nothing"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Glob set 'nothing' is not defined"));
}

#[test]
fn test_run_default_target_in_series_order() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);
    let output = project.run(&["run"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let lines: Vec<String> = stdout(&output).lines().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "scripts: src/**/*.js",
            "scripts: lib/**/*.js",
            "scripts: docs/**/*.js",
            "scripts: src/**/*.js",
            "scripts: lib/**/*.js",
            "scripts: docs/**/*.js",
            "styles: src/**/*.css",
            "styles: src/**/*.css",
            "✓ Finished 'default'",
        ]
    );
}

#[test]
fn test_run_set_named_like_its_task() {
    let project = TestProject::with_manifest(SHADOWING_SET_MANIFEST);
    let output = project.run(&["run", "build"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "scripts: a.js\n✓ Finished 'build'\n");
}

#[test]
fn test_run_unknown_target_fails() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);
    let output = project.run(&["run", "deploy"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown target 'deploy'"));
}

#[cfg(unix)]
#[test]
fn test_run_command_template_expands_globs() {
    let project = TestProject::with_manifest(
        r#"
[glob_sets]
scripts = ["a.js", "b.js"]

[[tasks]]
name = "write"
template = "command"
options = { program = "sh", args = ["-c", 'printf "%s\n" "$@" > out.txt', "sh", "{globs:scripts}"] }
"#,
    );
    let output = project.run(&["-q", "run", "write"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(project.read_file("out.txt"), "a.js\nb.js\n");
}

#[test]
fn test_missing_manifest_fails() {
    let project = TestProject::new();
    let output = project.run(&["plan"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to load"));
}

#[test]
fn test_manifest_flag_selects_file() {
    let project = TestProject::new();
    project.create_file("build/other.toml", SAMPLE_MANIFEST);
    let output = project.run(&["--manifest", "build/other.toml", "globs", "styles"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("src/**/*.css"));
}

#[test]
fn test_stuck_plugins_warn_by_default() {
    let project = TestProject::with_manifest(STUCK_MANIFEST);
    let output = project.run(&["plan"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stderr(&output).contains("'orphan' (missing: nobody)"));
}

#[test]
fn test_strict_config_fails_on_stuck_plugins() {
    let project = TestProject::with_manifest(STUCK_MANIFEST);
    project.create_file(".config/config.toml", "[run]\nstrict = true\n");
    let output = project.run(&["plan"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("orphan"));
}

#[test]
fn test_global_config_selects_manifest() {
    let project = TestProject::new();
    project.create_file("build.toml", SAMPLE_MANIFEST);
    project.create_file(".config/config.toml", "[run]\nmanifest = \"build.toml\"\n");
    let output = project.run(&["check"]);

    assert!(output.status.success(), "{}", stderr(&output));
}
