//! Smoke tests for the cadence binary
//!
//! Each test runs the real binary in a throwaway project directory with an
//! explicit config file so nothing above the temp dir can leak in.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use cadence_utils::test_support::ProjectFixture;
use predicates::prelude::*;

fn cadence(project: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cadence"));
    cmd.current_dir(project).env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

fn with_config(fixture: ProjectFixture, toml: &str) -> ProjectFixture {
    fixture.with_file(".cadence/config.toml", toml)
}

#[test]
fn test_version_prints_crate_version() {
    let fixture = with_config(ProjectFixture::new(), "");

    cadence(fixture.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!(
            "cadence ",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_unknown_command_exits_with_not_found() {
    let fixture = with_config(ProjectFixture::new(), "");

    cadence(fixture.path())
        .arg("invalid")
        .assert()
        .code(3)
        .stderr(predicate::str::contains(
            "The specified command invalid is invalid",
        ))
        .stderr(predicate::str::contains("Available commands: clean, install, version"));
}

#[test]
fn test_missing_command_shows_usage() {
    let fixture = with_config(ProjectFixture::new(), "");

    cadence(fixture.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_clean_removes_project_output() {
    let fixture = with_config(ProjectFixture::new(), "[clean]\noutput_path = \"build\"\n")
        .with_dirs(&["tmp", "build", "dist", "node_modules"]);

    cadence(fixture.path())
        .args(["clean", "--skip-npm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned tmp, build."));

    assert!(!fixture.join("tmp").exists());
    assert!(!fixture.join("build").exists());
    assert!(fixture.join("dist").exists());
    assert!(fixture.join("node_modules").exists());
}

#[test]
fn test_install_dry_run_uses_configured_manager() {
    let fixture = with_config(
        ProjectFixture::new(),
        "[tasks]\npackage_manager = \"yarn\"\n",
    );

    cadence(fixture.path())
        .args(["install", "--dry-run", "left-pad"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Dry run: would run `yarn install left-pad`",
        ));
}

#[test]
fn test_cli_flag_overrides_config_file() {
    let fixture = with_config(
        ProjectFixture::new(),
        "[tasks]\npackage_manager = \"yarn\"\n",
    );

    cadence(fixture.path())
        .args(["--package-manager", "pnpm", "install", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("`pnpm install`"));
}

#[test]
fn test_invalid_config_exits_with_cli_args_code() {
    let fixture = with_config(
        ProjectFixture::new(),
        "[interrupt]\ngrace_period_secs = 0\n",
    );

    cadence(fixture.path())
        .arg("version")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("grace_period_secs"));
}

#[test]
fn test_missing_package_manager_fails() {
    let fixture = with_config(
        ProjectFixture::new(),
        "[tasks]\npackage_manager = \"cadence-missing-package-manager\"\n",
    );

    cadence(fixture.path())
        .arg("install")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "`cadence-missing-package-manager install` not found",
        ));
}

#[test]
fn test_instrumentation_report_is_written() {
    let fixture = with_config(
        ProjectFixture::new(),
        "[instrumentation]\noutput_dir = \"reports\"\n",
    );

    cadence(fixture.path())
        .args(["--instrumentation", "version"])
        .assert()
        .success();

    let reports: Vec<_> = fs::read_dir(fixture.join("reports"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(reports.len(), 1);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&reports[0]).unwrap()).unwrap();
    assert_eq!(report["command"], "version");
    assert_eq!(report["outcome"], "success");
    let phases: Vec<_> = report["phases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|phase| phase["phase"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(phases, vec!["init", "command", "shutdown"]);
}

#[cfg(unix)]
#[test]
fn test_sigint_waits_for_install_cleanup() {
    use std::process::Stdio;
    use std::time::{Duration, Instant};

    use cadence_utils::test_support::write_fake_executable;

    let fixture = ProjectFixture::new();
    let marker = fixture.join("cleaned");
    let pm = write_fake_executable(
        fixture.path(),
        "pm",
        &format!(
            "trap 'echo cleaned > \"{}\"; exit 0' TERM\necho started\nwhile true; do sleep 0.1; done",
            marker.display()
        ),
    );
    let fixture = with_config(
        fixture,
        &format!("[tasks]\npackage_manager = \"{}\"\n", pm.display()),
    );

    let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_cadence"))
        .arg("install")
        .current_dir(fixture.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    std::thread::sleep(Duration::from_millis(1000));

    let status = std::process::Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(15);
    let exit = loop {
        if let Some(exit) = child.try_wait().unwrap() {
            break exit;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("cadence did not exit after SIGINT");
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    assert_eq!(exit.code(), Some(130));
    assert!(marker.exists(), "package manager cleanup did not run");
}
