// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeSet;
use std::path::Path;
use wsh_core::HostDescriptor;

/// Describe the machine this process runs on.
///
/// Blocking (scans `PATH` for the full inventory); call from a blocking task.
pub fn describe_local_host(full_inventory: bool) -> HostDescriptor {
    match collect(full_inventory) {
        Ok(host) => host,
        Err(e) => {
            tracing::warn!(error = %e, "host description degraded");
            HostDescriptor::degraded(e)
        }
    }
}

fn collect(full_inventory: bool) -> Result<HostDescriptor, String> {
    let hostname = nix::unistd::gethostname()
        .map_err(|e| format!("gethostname failed: {e}"))?
        .into_string()
        .map_err(|_| "hostname is not valid UTF-8".to_string())?;

    let user = nix::unistd::User::from_uid(nix::unistd::getuid())
        .ok()
        .flatten()
        .map(|u| u.name)
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "unknown".to_string());

    let inventory = if full_inventory {
        let path = std::env::var_os("PATH").ok_or("PATH is not set")?;
        path_inventory(std::env::split_paths(&path))
    } else {
        Vec::new()
    };

    Ok(HostDescriptor {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        hostname,
        user,
        inventory,
        error: None,
    })
}

/// Sorted, de-duplicated names of executable files in the given directories
pub(crate) fn path_inventory<I, P>(dirs: I) -> Vec<String>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut names = BTreeSet::new();
    for dir in dirs {
        let Ok(entries) = std::fs::read_dir(dir.as_ref()) else {
            continue;
        };
        for entry in entries.flatten() {
            if is_executable(&entry.path()) {
                if let Some(name) = entry.file_name().to_str() {
                    names.insert(name.to_string());
                }
            }
        }
    }
    names.into_iter().collect()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
