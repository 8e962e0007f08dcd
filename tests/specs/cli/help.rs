//! CLI help and version specs

use crate::prelude::*;

#[test]
fn wsh_no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn wsh_run_help_lists_flags() {
    cli().args(&["run", "--help"]).passes().stdout_has("--cmd").stdout_has("--timeout");
}

#[test]
fn wsh_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}

#[test]
fn unknown_subcommand_is_usage_error() {
    cli().args(&["frobnicate"]).exits(2);
}

#[test]
fn invalid_config_is_usage_error() {
    let temp = Project::empty();
    let config = temp.file("wsh.toml", "[engine\n");
    temp.wsh()
        .args(&["history", "--config", config.to_str().unwrap()])
        .exits(2)
        .stderr_has("invalid config");
}

#[test]
fn remote_backend_without_session_is_usage_error() {
    let temp = Project::empty();
    let config = temp.file("wsh.toml", "[backend]\nkind = \"remote\"\n");
    temp.wsh()
        .env("WSH_CONFIG", &config)
        .args(&["run", "x", "--cmd", "true"])
        .exits(2)
        .stderr_has("no session");
}
