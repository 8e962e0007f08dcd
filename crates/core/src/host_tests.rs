// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample() -> HostDescriptor {
    HostDescriptor {
        os: "linux".to_string(),
        arch: "x86_64".to_string(),
        hostname: "kali".to_string(),
        user: "root".to_string(),
        inventory: vec!["nmap".to_string(), "curl".to_string()],
        error: None,
    }
}

#[test]
fn degraded_descriptor_is_tagged() {
    let host = HostDescriptor::degraded("session closed");
    assert!(host.is_degraded());
    assert_eq!(host.os, "unknown");
    assert_eq!(host.to_string(), "unknown@unknown (unknown/unknown) [degraded: session closed]");
}

#[test]
fn context_includes_inventory_when_present() {
    let ctx = sample().to_context();
    assert_eq!(ctx.get("host.os").map(String::as_str), Some("linux"));
    assert_eq!(ctx.get("host.inventory").map(String::as_str), Some("nmap,curl"));
    assert!(!ctx.contains_key("host.error"));
}

#[test]
fn context_omits_empty_inventory() {
    let mut host = sample();
    host.inventory.clear();
    assert!(!host.to_context().contains_key("host.inventory"));
}

#[test]
fn display_healthy_descriptor() {
    assert_eq!(sample().to_string(), "root@kali (linux/x86_64)");
}
