//! Schema version ordering.

use std::cmp::Ordering;

/// Version string of development builds. Newer than every release.
pub const DEV_VERSION: &str = "dev";

/// Version of the running binary, stamped into migrated profiles.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compare two `major.minor.patch` version strings.
///
/// A leading `v` is ignored, missing components count as `0`, and an empty
/// version sorts before every release. Components that are not numbers on
/// both sides compare as strings. [`DEV_VERSION`] is newer than everything
/// except itself.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = normalize(a);
    let b = normalize(b);
    if a == b {
        return Ordering::Equal;
    }
    match (a == DEV_VERSION, b == DEV_VERSION) {
        (true, _) => return Ordering::Greater,
        (_, true) => return Ordering::Less,
        _ => {}
    }

    let left: Vec<&str> = a.split('.').collect();
    let right: Vec<&str> = b.split('.').collect();
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or("0");
        let r = right.get(i).copied().unwrap_or("0");
        let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(l), Ok(r)) => l.cmp(&r),
            _ => l.cmp(r),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Whether `version` is strictly older than `target`.
pub fn is_older(version: &str, target: &str) -> bool {
    compare_versions(version, target) == Ordering::Less
}

pub fn is_dev(version: &str) -> bool {
    version.trim() == DEV_VERSION
}

fn normalize(version: &str) -> &str {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    if trimmed.is_empty() || trimmed == "0" {
        "0.0.0"
    } else {
        trimmed
    }
}
