//! CLI argument parsing and offline command tests
//!
//! Every invocation gets its own config directory so the user's real
//! configuration is never read or written.

#![allow(deprecated)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the clipbook binary command with an isolated config home
fn clipbook(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("clipbook").unwrap();
    cmd.env("XDG_CONFIG_HOME", home)
        .env("HOME", home)
        .env_remove("CLIPBOOK_CDP")
        .env_remove("CLIPBOOK_PROFILE")
        .env_remove("CLIPBOOK_BROWSER_PATH")
        .env_remove("RUST_LOG");
    cmd
}

mod help {
    use super::*;

    #[test]
    fn shows_help() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("clipbook"))
            .stdout(predicate::str::contains("NotebookLM"));
    }

    #[test]
    fn shows_version() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("clipbook"));
    }

    #[test]
    fn run_help_shows_options() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .args(["run", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--destination"))
            .stdout(predicate::str::contains("--on-miss"));
    }

    #[test]
    fn run_rejects_unknown_miss_policy() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .args(["run", "--on-miss", "retry"])
            .assert()
            .failure();
    }

    #[test]
    fn probe_requires_file() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .arg("probe")
            .assert()
            .failure()
            .stderr(predicate::str::contains("FILE"));
    }
}

mod trigger_command {
    use super::*;

    #[test]
    fn unknown_command_is_ignored() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .args(["trigger", "open-settings"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ignored"));
    }

    #[test]
    fn unknown_command_json() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .args(["--json", "trigger", "open-settings"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"status\":\"ignored\""));
    }
}

mod probe_command {
    use super::*;

    const NOTEBOOK_PAGE: &str = r#"<html><body>
        <button class="mat-flat-button">Create new</button>
        <mat-chip class="mat-mdc-chip"><mat-icon data-mat-icon-type="font">web</mat-icon>Website</mat-chip>
        <input type="url">
        <button class="mat-mdc-button-base">Insert</button>
    </body></html>"#;

    fn snapshot(dir: &TempDir, html: &str) -> std::path::PathBuf {
        let path = dir.path().join("page.html");
        std::fs::write(&path, html).unwrap();
        path
    }

    #[test]
    fn finds_every_target_in_snapshot() {
        let home = TempDir::new().unwrap();
        let page = snapshot(&home, NOTEBOOK_PAGE);

        let output = clipbook(home.path())
            .arg("--json")
            .arg("probe")
            .arg(&page)
            .output()
            .unwrap();
        assert!(output.status.success());

        let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let results = results.as_array().unwrap();
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r["found"] == true));
        assert_eq!(results[0]["target"], "create");
        assert_eq!(results[0]["selector"], "button.mat-flat-button");
        assert_eq!(results[2]["selector"], "input[type=\"url\"]");
    }

    #[test]
    fn reports_missing_target() {
        let home = TempDir::new().unwrap();
        let page = snapshot(&home, "<html><body><p>Loading</p></body></html>");

        clipbook(home.path())
            .arg("probe")
            .arg(&page)
            .args(["--target", "insert"])
            .assert()
            .success()
            .stdout(predicate::str::contains("no match"));
    }

    #[test]
    fn configured_selectors_take_over() {
        let home = TempDir::new().unwrap();
        let page = snapshot(
            &home,
            r#"<html><body><div class="add-source">Insert</div></body></html>"#,
        );

        clipbook(home.path())
            .env("CLIPBOOK_SELECTORS__INSERT", "[\"div.add-source\"]")
            .args(["--json", "probe", "--target", "insert"])
            .arg(&page)
            .assert()
            .success()
            .stdout(predicate::str::contains("div.add-source"));
    }

    #[test]
    fn missing_file_fails() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .args(["probe", "/nonexistent/page.html"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read"));
    }
}

mod config_command {
    use super::*;

    #[test]
    fn get_reports_defaults() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .args(["config", "get", "automation.destination_url"])
            .assert()
            .success()
            .stdout(predicate::str::contains("https://notebooklm.google.com/"));
    }

    #[test]
    fn get_unknown_key_fails() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .args(["config", "get", "api.base_url"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn set_then_get_round_trips() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .args(["config", "set", "automation.on_miss", "continue"])
            .assert()
            .success();

        clipbook(home.path())
            .args(["config", "get", "automation.on_miss"])
            .assert()
            .success()
            .stdout(predicate::str::contains("continue"));
    }

    #[test]
    fn set_rejects_invalid_value() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .args(["config", "set", "automation.poll_interval_ms", "0"])
            .assert()
            .failure();
    }

    #[test]
    fn env_overrides_defaults() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .env("CLIPBOOK_AUTOMATION__SETTLE_MS", "1200")
            .args(["config", "get", "automation.settle_ms"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1200"));
    }

    #[test]
    fn path_points_into_config_home() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }
}

mod profile_command {
    use super::*;

    #[test]
    fn create_assigns_next_port() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .args(["--json", "profile", "create", "work", "--cdp-port", "9400"])
            .assert()
            .success()
            .stdout(predicate::str::contains("9400"));

        clipbook(home.path())
            .args(["--json", "profile", "create", "research"])
            .assert()
            .success()
            .stdout(predicate::str::contains("9401"));
    }

    #[test]
    fn show_unknown_profile_fails() {
        let home = TempDir::new().unwrap();
        clipbook(home.path())
            .args(["profile", "show", "missing"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Profile not found"));
    }
}
