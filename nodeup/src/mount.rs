//! Mount-state reconciliation for the node mount directory.
//!
//! Before build and launch, the mount directory must start from a clean,
//! unmounted, nonexistent state. Reconciliation is detect → unmount →
//! remove: an unmount failure is tolerated (the removal below is the
//! authoritative cleanup step), a removal failure is fatal.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{NodeupError, NodeupResult};

#[cfg(target_os = "linux")]
const PROC_MOUNTS: &str = "/proc/mounts";

/// One entry of the live mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub source: String,
    pub target: PathBuf,
    pub fs_type: String,
}

/// Ensure `dir` is unmounted and absent.
///
/// Idempotent: running this twice in a row on an already-clean state finds
/// no mount entry and no directory, performs nothing, and succeeds.
pub fn reconcile(dir: &Path) -> NodeupResult<()> {
    match query_mount(dir)? {
        Some(entry) => {
            info!(
                mount_point = %entry.target.display(),
                fs_type = %entry.fs_type,
                "mount directory is mounted, detaching"
            );
            if let Err(e) = detach(&entry.target) {
                // Removal below is the safety gate, not the unmount.
                warn!(
                    mount_point = %entry.target.display(),
                    error = %e,
                    "unmount failed, continuing"
                );
            }
        }
        None => debug!(dir = %dir.display(), "not mounted"),
    }

    if dir.symlink_metadata().is_ok() {
        info!(dir = %dir.display(), "removing stale mount directory");
        remove_all(dir)?;
    }

    Ok(())
}

/// Query the live mount table for an entry at or under `dir`.
///
/// When several entries match, the deepest one is returned.
#[cfg(target_os = "linux")]
pub fn query_mount(dir: &Path) -> NodeupResult<Option<MountEntry>> {
    let raw = std::fs::read_to_string(PROC_MOUNTS).map_err(|e| {
        NodeupError::Mount(format!("failed to read {}: {}", PROC_MOUNTS, e))
    })?;
    let entries = parse_mount_table(&raw);
    Ok(match_mount(&entries, dir).cloned())
}

/// Stub for non-Linux platforms: reports "not mounted".
#[cfg(not(target_os = "linux"))]
pub fn query_mount(_dir: &Path) -> NodeupResult<Option<MountEntry>> {
    Ok(None)
}

#[cfg(target_os = "linux")]
fn detach(target: &Path) -> NodeupResult<()> {
    use nix::mount::{MntFlags, umount2};

    umount2(target, MntFlags::MNT_DETACH).map_err(|e| {
        NodeupError::Mount(format!("failed to unmount {}: {}", target.display(), e))
    })
}

#[cfg(not(target_os = "linux"))]
fn detach(_target: &Path) -> NodeupResult<()> {
    Ok(())
}

fn remove_all(path: &Path) -> NodeupResult<()> {
    let meta = path.symlink_metadata().map_err(|e| {
        NodeupError::Mount(format!("failed to stat {}: {}", path.display(), e))
    })?;
    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|e| {
        NodeupError::Mount(format!("failed to remove {}: {}", path.display(), e))
    })
}

/// Parse the contents of a `/proc/mounts`-format mount table.
///
/// Fields are whitespace-separated; paths escape whitespace and backslashes
/// octally (`\040` for space). Malformed lines are skipped.
fn parse_mount_table(raw: &str) -> Vec<MountEntry> {
    raw.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let source = fields.next()?;
            let target = fields.next()?;
            let fs_type = fields.next()?;
            Some(MountEntry {
                source: unescape_field(source),
                target: PathBuf::from(unescape_field(target)),
                fs_type: fs_type.to_string(),
            })
        })
        .collect()
}

/// Decode the octal escapes mount tables use inside path fields.
fn unescape_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let digits: String = chars.clone().take(3).collect();
        if digits.len() == 3
            && let Ok(code) = u8::from_str_radix(&digits, 8)
        {
            out.push(code as char);
            chars.nth(2);
        } else {
            out.push(c);
        }
    }
    out
}

/// Pick the deepest entry whose mount point equals `dir` or lies under it.
fn match_mount<'a>(entries: &'a [MountEntry], dir: &Path) -> Option<&'a MountEntry> {
    entries
        .iter()
        .filter(|entry| entry.target == dir || entry.target.starts_with(dir))
        .max_by_key(|entry| entry.target.components().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
/dev/sda1 / ext4 rw,relatime 0 0
stornode /tmp/stornode_data fuse.stornode rw,nosuid,nodev 0 0
tmpfs /tmp/stornode_data/scratch tmpfs rw 0 0
tmpfs /tmp/with\\040space tmpfs rw 0 0
malformed-line
";

    #[test]
    fn parses_mount_table_fields() {
        let entries = parse_mount_table(TABLE);
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[2].source, "stornode");
        assert_eq!(entries[2].target, PathBuf::from("/tmp/stornode_data"));
        assert_eq!(entries[2].fs_type, "fuse.stornode");
    }

    #[test]
    fn unescapes_octal_sequences() {
        assert_eq!(unescape_field("/tmp/with\\040space"), "/tmp/with space");
        assert_eq!(unescape_field("/plain/path"), "/plain/path");
        assert_eq!(unescape_field("tab\\011sep"), "tab\tsep");
        // Incomplete escape is kept verbatim
        assert_eq!(unescape_field("trail\\04"), "trail\\04");
    }

    #[test]
    fn matches_exact_and_nested_mounts() {
        let entries = parse_mount_table(TABLE);

        // Deepest match under the configured directory wins
        let hit = match_mount(&entries, Path::new("/tmp/stornode_data")).unwrap();
        assert_eq!(hit.target, PathBuf::from("/tmp/stornode_data/scratch"));

        assert!(match_mount(&entries, Path::new("/tmp/elsewhere")).is_none());
        // Prefix matching is per path component, not per byte
        assert!(match_mount(&entries, Path::new("/tmp/storn")).is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn query_mount_reports_unmounted_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(query_mount(dir.path()).unwrap().is_none());
    }

    #[test]
    fn reconcile_removes_populated_directory() {
        let base = tempfile::tempdir().unwrap();
        let target = base.path().join("mnt");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("stale.txt"), b"leftover").unwrap();

        reconcile(&target).unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn reconcile_removes_file_at_mount_path() {
        let base = tempfile::tempdir().unwrap();
        let target = base.path().join("mnt");
        std::fs::write(&target, b"not a directory").unwrap();

        reconcile(&target).unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let base = tempfile::tempdir().unwrap();
        let target = base.path().join("mnt");
        std::fs::create_dir(&target).unwrap();

        reconcile(&target).unwrap();
        assert!(!target.exists());

        // Second run finds nothing to do and must not error
        reconcile(&target).unwrap();
        assert!(!target.exists());
    }
}
