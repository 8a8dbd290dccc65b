//! CLI argument parsing and offline command tests

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the axview binary command, isolated from the user's config
fn axview(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("axview").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("AXVIEW_CDP")
        .env_remove("AXVIEW_BROWSER_PATH")
        .env_remove("RUST_LOG");
    cmd
}

fn home() -> TempDir {
    tempfile::tempdir().unwrap()
}

mod help {
    use super::*;

    #[test]
    fn shows_help() {
        axview(&home())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("axview"))
            .stdout(predicate::str::contains("accessibility tree"));
    }

    #[test]
    fn shows_version() {
        axview(&home())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("axview"));
    }

    #[test]
    fn help_lists_commands() {
        axview(&home())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("browse"))
            .stdout(predicate::str::contains("snapshot"))
            .stdout(predicate::str::contains("config"));
    }

    #[test]
    fn help_lists_global_flags() {
        axview(&home())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--show"))
            .stdout(predicate::str::contains("--cdp"))
            .stdout(predicate::str::contains("--poll-interval"))
            .stdout(predicate::str::contains("--browser-path"));
    }

    #[test]
    fn unknown_command_fails() {
        axview(&home())
            .arg("teleport")
            .assert()
            .failure()
            .stderr(predicate::str::contains("unrecognized subcommand"));
    }
}

mod snapshot_command {
    use super::*;

    #[test]
    fn snapshot_help_shows_url() {
        axview(&home())
            .args(["snapshot", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[URL]"));
    }

    #[test]
    fn blank_url_is_rejected_before_launch() {
        axview(&home())
            .args(["snapshot", "   "])
            .assert()
            .failure()
            .stderr(predicate::str::contains("InvalidUrl"));
    }

    #[test]
    fn missing_browser_is_reported() {
        axview(&home())
            .args([
                "--browser-path",
                "/nonexistent/axview-chrome",
                "snapshot",
                "example.com",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("/nonexistent/axview-chrome"));
    }

    #[test]
    fn unreachable_cdp_endpoint_is_reported() {
        axview(&home())
            .args(["--cdp", "1", "snapshot", "example.com"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("CdpConnectionFailed"));
    }
}

mod config_command {
    use super::*;

    #[test]
    fn config_requires_subcommand() {
        axview(&home())
            .arg("config")
            .assert()
            .failure()
            .stderr(predicate::str::contains("subcommand"));
    }

    #[test]
    fn config_set_requires_key_value() {
        axview(&home())
            .args(["config", "set"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("KEY"));
    }

    #[test]
    fn config_path_points_into_axview_dir() {
        axview(&home())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("axview"))
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_prints_defaults() {
        axview(&home())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("poll_interval_ms = 1500"))
            .stdout(predicate::str::contains("start_url"));
    }

    #[test]
    fn config_show_json() {
        axview(&home())
            .args(["--json", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"long_link_threshold\": 25"));
    }

    #[test]
    fn config_set_then_get() {
        let home = home();
        axview(&home)
            .args(["config", "set", "render.poll_interval_ms", "800"])
            .assert()
            .success()
            .stdout(predicate::str::contains("render.poll_interval_ms"));

        axview(&home)
            .args(["config", "get", "render.poll_interval_ms"])
            .assert()
            .success()
            .stdout(predicate::str::diff("800\n"));
    }

    #[test]
    fn config_get_applies_flags_and_env() {
        axview(&home())
            .args(["--poll-interval", "250", "config", "get", "render.poll_interval_ms"])
            .assert()
            .success()
            .stdout(predicate::str::diff("250\n"));

        axview(&home())
            .env("AXVIEW_RENDER__LONG_LINK_THRESHOLD", "40")
            .args(["config", "get", "render.long_link_threshold"])
            .assert()
            .success()
            .stdout(predicate::str::diff("40\n"));
    }

    #[test]
    fn config_get_rejects_unknown_key() {
        axview(&home())
            .args(["config", "get", "api.key"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn config_init_refuses_to_overwrite() {
        let home = home();
        axview(&home).args(["config", "init"]).assert().success();
        axview(&home)
            .args(["config", "init"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
        axview(&home)
            .args(["config", "init", "--force"])
            .assert()
            .success();
    }
}
