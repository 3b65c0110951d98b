//! Repository layout: where tests live and how their variants relate.
//!
//! Test directories are addressed by their path relative to the repository
//! root, always `/`-separated, e.g. `feature/bgp/policy/otg_tests/foo_test`.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

pub const KIND_ATE: &str = "ate_tests";
pub const KIND_OTG: &str = "otg_tests";
pub const KIND_KNE: &str = "kne_tests";
pub const KIND_TESTS: &str = "tests";

/// Directory segments that may hold test directories.
pub const TEST_KINDS: [&str; 4] = [KIND_ATE, KIND_OTG, KIND_KNE, KIND_TESTS];

/// File names and roots used during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layout {
    pub feature_dir: String,
    pub spec_file: String,
    pub record_file: String,
    pub test_file_suffix: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            feature_dir: "feature".to_string(),
            spec_file: "README.md".to_string(),
            record_file: "metadata.json".to_string(),
            test_file_suffix: "_test.go".to_string(),
        }
    }
}

impl Layout {
    /// Whether `test_dir` has the shape `<feature_dir>/<seg>/.../<kind>/<name>`.
    pub fn conforms(&self, test_dir: &str) -> bool {
        let segments: Vec<&str> = test_dir.split('/').collect();
        segments.len() >= 4
            && segments[0] == self.feature_dir
            && TEST_KINDS.contains(&segments[segments.len() - 2])
    }
}

/// The kind segment directly above the test directory, or `""` when that
/// segment is not a recognized kind.
pub fn test_kind(test_dir: &str) -> &str {
    let mut segments = test_dir.rsplit('/');
    segments.next();
    match segments.next() {
        Some(kind) if TEST_KINDS.contains(&kind) => kind,
        _ => "",
    }
}

fn replace_kind(test_dir: &str, from: &str, to: &str) -> Option<String> {
    let (parent, name) = test_dir.rsplit_once('/')?;
    let prefix = match parent.rsplit_once('/') {
        Some((prefix, kind)) if kind == from => Some(prefix),
        None if parent == from => None,
        _ => return None,
    };
    Some(match prefix {
        Some(prefix) => format!("{prefix}/{to}/{name}"),
        None => format!("{to}/{name}"),
    })
}

/// The OTG twin of an ATE test directory.
pub fn twin_dir(test_dir: &str) -> Option<String> {
    replace_kind(test_dir, KIND_ATE, KIND_OTG)
}

/// The directory that identifies the logical test: OTG variants map onto
/// their ATE twin, everything else maps onto itself.
pub fn logical_dir(test_dir: &str) -> String {
    replace_kind(test_dir, KIND_OTG, KIND_ATE).unwrap_or_else(|| test_dir.to_string())
}

/// `path` relative to `root` as a `/`-separated string.
pub fn relative_dir(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}
