//! Deterministic validation findings and cross-case consistency checks.

use crate::layout::{KIND_ATE, logical_dir, test_kind, twin_dir};
use crate::record::{IdentityRecord, parse_v4_uuid};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const RUNDATA_CHECK_KIND: &str = "rundata.check.v1";

pub const FAILURE_CLASS_OUTSIDE_LAYOUT: &str = "rundata.discovery.outside_layout";
pub const FAILURE_CLASS_MARKDOWN_MISSING: &str = "rundata.markdown.missing";
pub const FAILURE_CLASS_MARKDOWN_PARSE: &str = "rundata.markdown.parse";
pub const FAILURE_CLASS_RECORD_MISSING: &str = "rundata.record.missing";
pub const FAILURE_CLASS_RECORD_PARSE: &str = "rundata.record.parse";
pub const FAILURE_CLASS_PLAN_ID_STALE: &str = "rundata.plan_id.needs_update";
pub const FAILURE_CLASS_DESCRIPTION_STALE: &str = "rundata.description.needs_update";
pub const FAILURE_CLASS_TESTBED_UNSPECIFIED: &str = "rundata.testbed.unspecified";
pub const FAILURE_CLASS_UUID_MISSING: &str = "rundata.uuid.missing";
pub const FAILURE_CLASS_UUID_INVALID: &str = "rundata.uuid.invalid";
pub const FAILURE_CLASS_UUID_NON_CANONICAL: &str = "rundata.uuid.non_canonical";
pub const FAILURE_CLASS_PLAN_ID_DUPLICATE: &str = "rundata.plan_id.duplicate";
pub const FAILURE_CLASS_UUID_DUPLICATE: &str = "rundata.uuid.duplicate";
pub const FAILURE_CLASS_TWIN_DIVERGENT: &str = "rundata.twin.divergent";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub test_dir: String,
    pub class: String,
    pub message: String,
}

impl Finding {
    pub fn new(
        test_dir: impl Into<String>,
        class: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            test_dir: test_dir.into(),
            class: class.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    pub test_count: usize,
    pub error_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub check_kind: String,
    pub result: String,
    pub failure_classes: Vec<String>,
    pub errors: Vec<Finding>,
    pub summary: CheckSummary,
}

impl CheckReport {
    pub fn from_findings(test_count: usize, mut errors: Vec<Finding>) -> Self {
        errors.sort();
        errors.dedup();
        let failure_classes = errors
            .iter()
            .map(|finding| finding.class.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let result = if errors.is_empty() {
            "accepted".to_string()
        } else {
            "rejected".to_string()
        };
        let summary = CheckSummary {
            test_count,
            error_count: errors.len(),
        };
        Self {
            check_kind: RUNDATA_CHECK_KIND.to_string(),
            result,
            failure_classes,
            errors,
            summary,
        }
    }

    pub fn accepted(&self) -> bool {
        self.result == "accepted"
    }
}

fn uuid_key(uuid: &str) -> String {
    parse_v4_uuid(uuid)
        .map(|u| u.hyphenated().to_string())
        .unwrap_or_else(|| uuid.to_string())
}

/// Report values shared by tests that are not twins of one another.
fn check_shared_values<F>(
    records: &BTreeMap<&str, &IdentityRecord>,
    what: &str,
    class: &str,
    value_of: F,
    out: &mut Vec<Finding>,
) where
    F: Fn(&IdentityRecord) -> Option<String>,
{
    let mut users: BTreeMap<String, BTreeMap<String, Vec<&str>>> = BTreeMap::new();
    for (test_dir, record) in records {
        let Some(value) = value_of(*record) else {
            continue;
        };
        users
            .entry(value)
            .or_default()
            .entry(logical_dir(test_dir))
            .or_default()
            .push(*test_dir);
    }

    for (value, logical) in users {
        if logical.len() < 2 {
            continue;
        }
        let dirs: Vec<&str> = logical.values().flatten().copied().collect();
        out.push(Finding::new(
            dirs[0],
            class,
            format!(
                "{what} {value} is used by multiple tests: {}",
                dirs.join(", ")
            ),
        ));
    }
}

/// Distinct logical tests must not share a plan ID.
pub fn check_duplicate_plan_ids(
    records: &BTreeMap<&str, &IdentityRecord>,
    out: &mut Vec<Finding>,
) {
    check_shared_values(
        records,
        "plan_id",
        FAILURE_CLASS_PLAN_ID_DUPLICATE,
        |record| (!record.plan_id.is_empty()).then(|| record.plan_id.clone()),
        out,
    );
}

/// Distinct logical tests must not share a uuid.
pub fn check_duplicate_uuids(records: &BTreeMap<&str, &IdentityRecord>, out: &mut Vec<Finding>) {
    check_shared_values(
        records,
        "uuid",
        FAILURE_CLASS_UUID_DUPLICATE,
        |record| (!record.uuid.is_empty()).then(|| uuid_key(&record.uuid)),
        out,
    );
}

/// ATE and OTG variants of one test must agree on their identity.
pub fn check_twins(records: &BTreeMap<&str, &IdentityRecord>, out: &mut Vec<Finding>) {
    for (test_dir, ate) in records {
        if test_kind(test_dir) != KIND_ATE {
            continue;
        }
        let Some(twin) = twin_dir(test_dir) else {
            continue;
        };
        let Some(otg) = records.get(twin.as_str()) else {
            continue;
        };

        let mut diverged = Vec::new();
        if ate.plan_id != otg.plan_id {
            diverged.push("plan_id");
        }
        if ate.description != otg.description {
            diverged.push("description");
        }
        if uuid_key(&ate.uuid) != uuid_key(&otg.uuid) {
            diverged.push("uuid");
        }
        if !diverged.is_empty() {
            out.push(Finding::new(
                *test_dir,
                FAILURE_CLASS_TWIN_DIVERGENT,
                format!("{} differs from twin {twin}", diverged.join(", ")),
            ));
        }
    }
}

/// Run every cross-case check over one view of the records.
pub fn check_consistency(records: &BTreeMap<&str, &IdentityRecord>, out: &mut Vec<Finding>) {
    check_duplicate_plan_ids(records, out);
    check_duplicate_uuids(records, out);
    check_twins(records, out);
}
