//! `wsh host` specs

use crate::prelude::*;

#[test]
fn host_prints_descriptor() {
    cli().args(&["host"]).passes().stdout_has("Host:").stdout_has("@");
}

#[test]
fn host_json_has_identity_fields() {
    let run = cli().args(&["host", "--json"]).passes();
    let host = run.json();
    assert!(host["os"].is_string());
    assert!(host["user"].is_string());
    assert!(host.get("inventory").is_none());
}

#[test]
fn full_host_lists_path_executables() {
    let run = cli().args(&["host", "--full", "--json"]).env("PATH", "/bin:/usr/bin").passes();
    let inventory = run.json()["inventory"].as_array().cloned().unwrap_or_default();
    assert!(inventory.iter().any(|name| name == "sh"), "{inventory:?}");
}
