use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = "\
sealer:
  encrypt: [cat]
  decrypt: [cat]
";

const CA_HOST: &str = "\
secrets:
  root:
    file: secrets/root.age
    generator:
      script: printf root-secret
";

const APP_HOST: &str = r#"
secrets:
  derived:
    file: secrets/app/derived.age
    generator:
      script: |
        printf '%s-derived' "$({{decrypt}} {{deps.0.file}})"
      dependencies:
        - secret: root
          file: secrets/root.age
  manual:
    file: secrets/app/manual.age
"#;

fn repository() -> TempDir {
    let repo = TempDir::new().unwrap();
    fs::write(repo.path().join("keysmith.yml"), CONFIG).unwrap();
    fs::create_dir(repo.path().join("hosts")).unwrap();
    fs::write(repo.path().join("hosts/ca.yml"), CA_HOST).unwrap();
    fs::write(repo.path().join("hosts/app.yml"), APP_HOST).unwrap();
    repo
}

fn keysmith(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("keysmith").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_exits_with_failure() {
    Command::cargo_bin("keysmith")
        .unwrap()
        .arg("--help")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("--force-generate"));
}

#[test]
fn test_version_exits_successfully() {
    Command::cargo_bin("keysmith")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_flag_fails() {
    Command::cargo_bin("keysmith")
        .unwrap()
        .arg("--frobnicate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--frobnicate"));
}

#[test]
fn test_requires_marker_file() {
    let dir = TempDir::new().unwrap();
    keysmith(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("keysmith.yml"));
}

#[test]
fn test_generates_root_then_derived() {
    let repo = repository();

    keysmith(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("generated secrets/root.age (missing)"))
        .stdout(predicate::str::contains("generated secrets/app/derived.age (missing)"))
        .stdout(predicate::str::contains("2 generated, 0 up to date"));

    assert_eq!(
        fs::read_to_string(repo.path().join("secrets/root.age")).unwrap(),
        "root-secret"
    );
    assert_eq!(
        fs::read_to_string(repo.path().join("secrets/app/derived.age")).unwrap(),
        "root-secret-derived"
    );
    assert!(!repo.path().join("secrets/app/manual.age").exists());

    keysmith(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped secrets/root.age (up to date) ca:root"))
        .stdout(predicate::str::contains("skipped secrets/app/derived.age (up to date) app:derived"))
        .stdout(predicate::str::contains("0 generated, 2 up to date"));
}

#[test]
fn test_force_regenerates_selected_target_only() {
    let repo = repository();
    keysmith(repo.path()).assert().success();

    keysmith(repo.path())
        .args(["-f", "./secrets/root.age"])
        .assert()
        .success()
        .stdout(predicate::str::contains("generated secrets/root.age (forced)"))
        .stdout(predicate::str::contains("derived.age").not());
}

#[test]
fn test_unknown_target_fails_before_generating() {
    let repo = repository();

    keysmith(repo.path())
        .args(["secrets/root.age", "secrets/nope.age"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("secrets/nope.age"));

    assert!(!repo.path().join("secrets").exists());
}

#[test]
fn test_manual_secret_is_not_a_target() {
    let repo = repository();

    keysmith(repo.path())
        .arg("secrets/app/manual.age")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not the path of any generated secret"));
}

#[test]
fn test_cycle_fails_without_generating() {
    let repo = repository();
    fs::write(
        repo.path().join("hosts/loop.yml"),
        "\
secrets:
  a:
    file: secrets/a.age
    generator:
      script: cat {{deps.0.file}}
      dependencies:
        - secret: b
          file: secrets/b.age
  b:
    file: secrets/b.age
    generator:
      script: cat {{deps.0.file}}
      dependencies:
        - secret: a
          file: secrets/a.age
",
    )
    .unwrap();

    keysmith(repo.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Circular dependency"));

    assert!(!repo.path().join("secrets").exists());
}

#[test]
fn test_ambiguous_owner_is_reported_once() {
    let repo = repository();
    fs::write(repo.path().join("hosts/backup.yml"), CA_HOST).unwrap();

    let output = keysmith(repo.path()).assert().success().get_output().clone();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(stderr.matches("declared by several hosts").count(), 1, "{}", stderr);
    assert!(stderr.contains("Warning:"));
    assert!(stderr.contains("using backup"));
}

#[test]
fn test_paths_are_printed_verbatim() {
    let repo = TempDir::new().unwrap();
    fs::write(repo.path().join("keysmith.yml"), CONFIG).unwrap();
    fs::create_dir(repo.path().join("hosts")).unwrap();
    fs::write(
        repo.path().join("hosts/odd.yml"),
        "\
secrets:
  braces:
    file: \"secrets/#G{x}}.age\"
    generator:
      script: printf odd
",
    )
    .unwrap();

    keysmith(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("generated secrets/#G{x}}.age (missing) odd:braces"));

    keysmith(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped secrets/#G{x}}.age (up to date) odd:braces"));
}
