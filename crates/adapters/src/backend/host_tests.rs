// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::os::unix::fs::PermissionsExt;
use tempfile::tempdir;

fn touch(dir: &Path, name: &str, mode: u32) {
    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
}

#[test]
fn inventory_lists_only_executables_sorted_and_deduplicated() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    touch(a.path(), "nmap", 0o755);
    touch(a.path(), "notes.txt", 0o644);
    touch(b.path(), "curl", 0o755);
    touch(b.path(), "nmap", 0o755);

    let names = path_inventory([a.path(), b.path(), Path::new("/nonexistent/bin")]);

    assert_eq!(names, vec!["curl".to_string(), "nmap".to_string()]);
}

#[test]
fn basic_description_has_platform_fields() {
    let host = describe_local_host(false);
    assert!(!host.is_degraded());
    assert_eq!(host.os, std::env::consts::OS);
    assert_eq!(host.arch, std::env::consts::ARCH);
    assert!(!host.hostname.is_empty());
    assert!(host.inventory.is_empty());
}
