//! End-to-end tests for `packlint validate`.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

static GIT_LOCK: Mutex<()> = Mutex::new(());

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn packlint(root: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("packlint"));
    cmd.current_dir(root).env_remove("RUST_LOG");
    cmd
}

fn git(dir: &Path, args: &[&str]) -> bool {
    std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn init_repo(dir: &Path) -> bool {
    git(dir, &["init", "--initial-branch=main"])
        && git(dir, &["config", "user.name", "Test"])
        && git(dir, &["config", "user.email", "test@test.com"])
}

const WIZARD: &str = "Packs/W/Wizards/wizard-w.json";

fn wizard_pack() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Packs/W/pack_metadata.json", r#"{"name": "W", "currentVersion": "1.0.0"}"#);
    write(
        temp.path(),
        WIZARD,
        r#"{"id": "should_fix", "name": "Right", "version": -1, "fromVersion": "6.8.0"}"#,
    );
    temp
}

#[test]
fn identity_mismatch_is_reported_and_fixed() -> Result<(), Box<dyn std::error::Error>> {
    let temp = wizard_pack();

    packlint(temp.path())
        .args(["validate", "-i", WIZARD, "--select", "BA101"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("BA101"))
        .stdout(predicate::str::contains("Right"))
        .stdout(predicate::str::contains("should_fix"));

    packlint(temp.path())
        .args(["validate", "-i", WIZARD, "--select", "BA101", "--fix"])
        .assert()
        .success();

    let fixed: serde_json::Value = serde_json::from_str(&fs::read_to_string(temp.path().join(WIZARD))?)?;
    assert_eq!(fixed["name"], "should_fix");

    packlint(temp.path())
        .args(["validate", "-i", WIZARD, "--select", "BA101"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BA101").not());
    Ok(())
}

#[test]
fn json_output_has_one_object_per_result() -> Result<(), Box<dyn std::error::Error>> {
    let temp = wizard_pack();
    let output = packlint(temp.path())
        .args(["validate", "--all", "--select", "BA101", "--json"])
        .output()?;
    assert_eq!(output.status.code(), Some(1));

    let results: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["error_code"], "BA101");
    assert_eq!(results[0]["file_path"], WIZARD);
    assert_eq!(results[0]["fix_available"], true);
    Ok(())
}

#[test]
fn ignored_code_is_not_reported() {
    let temp = wizard_pack();
    packlint(temp.path())
        .args(["validate", "-i", WIZARD, "--select", "BA101", "--ignore", "BA101"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BA101").not());
}

#[test]
fn removed_integration_output_breaks_backwards_compatibility() {
    let _lock = GIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    if !init_repo(temp.path()) {
        return;
    }
    let integration = |outputs: &str| {
        format!(
            "commonfields:\n  id: I\n  version: -1\nname: I\ndisplay: I\ncategory: Utilities\n\
             configuration: []\nscript:\n  type: python\n  commands:\n  - name: i-get\n    outputs:\n{}\
             fromversion: 5.0.0\n",
            outputs
        )
    };
    write(temp.path(), "Packs/I/pack_metadata.json", r#"{"name": "I", "currentVersion": "1.0.0"}"#);
    write(
        temp.path(),
        "Packs/I/Integrations/I/I.yml",
        &integration("    - contextPath: I.A\n    - contextPath: I.B\n"),
    );
    assert!(git(temp.path(), &["add", "."]));
    assert!(git(temp.path(), &["commit", "-m", "init"]));

    write(
        temp.path(),
        "Packs/I/Integrations/I/I.yml",
        &integration("    - contextPath: I.A\n"),
    );

    packlint(temp.path())
        .args(["validate", "-g", "--prev-ver", "HEAD", "--select", "BC116"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("BC116"))
        .stdout(predicate::str::contains("I.B Has been removed"))
        .stdout(predicate::str::contains("I.A").not());

    packlint(temp.path())
        .args(["validate", "-g", "--prev-ver", "HEAD", "--select", "BC116", "--fix"])
        .assert()
        .code(1);
}

const AUTONOMOUS_PLAYBOOK: &str = "Packs/Auto/Playbooks/playbook-p.yml";

#[test]
fn autonomous_playbook_tasks_get_quiet_mode() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    write(
        temp.path(),
        "Packs/Auto/pack_metadata.json",
        r#"{"name": "Auto", "currentVersion": "1.0.0", "managed": true, "source": "autonomous"}"#,
    );
    write(
        temp.path(),
        AUTONOMOUS_PLAYBOOK,
        "id: p\nname: p\nstarttaskid: t1\ntasks:\n\
         \x20 t1:\n    type: start\n    nexttasks:\n      '#none#': [t2]\n\
         \x20 t2:\n    type: title\n    displayLabel: X\n    nexttasks:\n      '#none#': [t3]\n\
         \x20 t3:\n    type: regular\n    displayLabel: ''\n    quietmode: null\n    nexttasks:\n      '#none#': [t4]\n\
         \x20 t4:\n    type: regular\n    displayLabel: null\n    quietmode: 1\n",
    );

    packlint(temp.path())
        .args(["validate", "-i", AUTONOMOUS_PLAYBOOK, "--select", "AS102"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "The following tasks have no display label and must have quietmode set to 1: t3.",
        ));

    packlint(temp.path())
        .args(["validate", "-i", AUTONOMOUS_PLAYBOOK, "--select", "AS102", "--fix"])
        .assert()
        .success();

    let fixed: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(temp.path().join(AUTONOMOUS_PLAYBOOK))?)?;
    assert_eq!(fixed["tasks"]["t3"]["quietmode"], serde_yaml::Value::from(1));

    packlint(temp.path())
        .args(["validate", "-i", AUTONOMOUS_PLAYBOOK, "--select", "AS102"])
        .assert()
        .success();
    Ok(())
}

#[test]
fn undocumented_commands_are_listed() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Packs/Rep/pack_metadata.json", r#"{"name": "Rep", "currentVersion": "1.0.0"}"#);
    write(
        temp.path(),
        "Packs/Rep/Integrations/Rep/Rep.yml",
        "commonfields:\n  id: Rep\n  version: -1\nname: Rep\ndisplay: Rep\ncategory: Utilities\n\
         configuration: []\nscript:\n  type: python\n  commands:\n  - name: ip\n  - name: url\n\
         \x20 - name: get-indicators\nfromversion: 5.0.0\n",
    );
    write(temp.path(), "Packs/Rep/Integrations/Rep/README.md", "## Commands\n\n### ip\n\nLooks up an IP.\n");

    packlint(temp.path())
        .args(["validate", "-i", "Packs/Rep/Integrations/Rep", "--select", "RM110"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("RM110"))
        .stdout(predicate::str::contains("README: url."))
        .stdout(predicate::str::contains("get-indicators").not());
}

#[test]
fn release_note_placeholder_fails() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Packs/Foo/pack_metadata.json", r#"{"name": "Foo", "currentVersion": "1.0.1"}"#);
    write(
        temp.path(),
        "Packs/Foo/ReleaseNotes/1_0_1.md",
        "#### Integrations\n- **Foo**\n%%UPDATE_RN%%\n",
    );

    packlint(temp.path())
        .args(["validate", "-i", "Packs/Foo/ReleaseNotes/1_0_1.md", "--select", "RN103"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("RN103"));
}

#[test]
fn grid_indicator_field_needs_newer_fromversion() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let field = "Packs/F/IndicatorFields/indicatorfield-grid.json";
    write(temp.path(), "Packs/F/pack_metadata.json", r#"{"name": "F", "currentVersion": "1.0.0"}"#);
    write(
        temp.path(),
        field,
        r#"{"id": "indicator_grid", "name": "grid", "cliName": "grid", "type": "grid", "version": -1, "fromVersion": "5.4.9"}"#,
    );

    packlint(temp.path())
        .args(["validate", "-i", field, "--select", "IF112"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("must be at least 5.5.0, current is 5.4.9"));

    packlint(temp.path())
        .args(["validate", "-i", field, "--select", "IF112", "--fix"])
        .assert()
        .success();
    let fixed: serde_json::Value = serde_json::from_str(&fs::read_to_string(temp.path().join(field))?)?;
    assert_eq!(fixed["fromVersion"], "5.5.0");
    Ok(())
}

#[test]
fn feed_integration_needs_newer_fromversion() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let path = "Packs/Feed/Integrations/Feed/Feed.yml";
    write(temp.path(), "Packs/Feed/pack_metadata.json", r#"{"name": "Feed", "currentVersion": "1.0.0"}"#);
    write(
        temp.path(),
        path,
        "commonfields:\n  id: Feed\n  version: -1\nname: Feed\ndisplay: Feed\ncategory: Utilities\n\
         configuration: []\nscript:\n  type: python\n  feed: true\n  commands: []\nfromversion: 5.4.9\n",
    );

    packlint(temp.path())
        .args(["validate", "-i", path, "--select", "BA106"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("BA106"));

    packlint(temp.path())
        .args(["validate", "-i", path, "--select", "BA106", "--fix"])
        .assert()
        .success();
    let fixed: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(temp.path().join(path))?)?;
    assert_eq!(fixed["fromversion"], serde_yaml::Value::from("5.5.0"));
    Ok(())
}

#[test]
fn condition_with_only_default_branch_fails() {
    let temp = TempDir::new().unwrap();
    let path = "Packs/P/Playbooks/playbook-cond.yml";
    write(temp.path(), "Packs/P/pack_metadata.json", r#"{"name": "P", "currentVersion": "1.0.0"}"#);
    write(
        temp.path(),
        path,
        "id: cond\nname: cond\nstarttaskid: '0'\ntasks:\n\
         \x20 '0':\n    id: '0'\n    type: start\n    nexttasks:\n      '#none#': ['1']\n\
         \x20 '1':\n    id: '1'\n    type: condition\n    nexttasks:\n      '#default#': ['2']\n\
         \x20 '2':\n    id: '2'\n    type: title\n",
    );

    packlint(temp.path())
        .args(["validate", "-i", path, "--select", "PB125"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("PB125"));
}

#[test]
fn conflicting_selection_flags_are_rejected() {
    let temp = TempDir::new().unwrap();
    packlint(temp.path())
        .args(["validate", "--all", "-i", "Packs"])
        .assert()
        .code(2);
}
