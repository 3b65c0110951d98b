//! Project a reconciled suite into sections of uniquely identified cases.

use rundata_kernel::layout::test_kind;
use rundata_kernel::{IdentityRecord, TestSuite, parse_v4_uuid, version_cmp};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// One logical test: its record and every directory implementing it,
/// keyed by test kind (`""` for unrecognized kinds).
#[derive(Debug, Clone, PartialEq)]
pub struct PlanCase {
    pub record: IdentityRecord,
    pub test_dirs: BTreeMap<String, String>,
}

impl PlanCase {
    pub fn new(record: IdentityRecord) -> Self {
        Self {
            record,
            test_dirs: BTreeMap::new(),
        }
    }

    pub fn with_test_dir(mut self, kind: &str, test_dir: &str) -> Self {
        self.test_dirs.insert(kind.to_string(), test_dir.to_string());
        self
    }
}

/// Cases of one section keyed by canonical uuid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanSuite {
    pub cases: BTreeMap<String, PlanCase>,
}

impl PlanSuite {
    /// Uuids in version order of their plan IDs, ties broken by uuid.
    pub fn sorted_uuids(&self) -> Vec<&str> {
        let mut uuids: Vec<&str> = self.cases.keys().map(String::as_str).collect();
        uuids.sort_by(|a, b| {
            version_cmp(&self.cases[*a].record.plan_id, &self.cases[*b].record.plan_id)
                .then_with(|| a.cmp(b))
        });
        uuids
    }

    /// The uuid of the case carrying `plan_id`, if any.
    pub fn uuid_for_plan_id(&self, plan_id: &str) -> Option<&str> {
        self.cases
            .iter()
            .find(|(_, case)| case.record.plan_id == plan_id)
            .map(|(uuid, _)| uuid.as_str())
    }

    pub fn get(&self, uuid: &str) -> Option<&PlanCase> {
        self.cases.get(uuid)
    }
}

/// Keys must already be canonical uuids.
impl FromIterator<(String, PlanCase)> for PlanSuite {
    fn from_iter<I: IntoIterator<Item = (String, PlanCase)>>(iter: I) -> Self {
        Self {
            cases: iter.into_iter().collect(),
        }
    }
}

/// Sections keyed by the plan ID prefix before the first `.`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestPlan {
    pub sections: BTreeMap<String, PlanSuite>,
}

impl TestPlan {
    /// Section names in version order.
    pub fn sorted_sections(&self) -> Vec<&str> {
        let mut sections: Vec<&str> = self.sections.keys().map(String::as_str).collect();
        sections.sort_by(|a, b| version_cmp(a, b));
        sections
    }

    pub fn get(&self, section: &str) -> Option<&PlanSuite> {
        self.sections.get(section)
    }

    /// Place `case` under the section of its plan ID.
    pub fn insert(&mut self, uuid: String, case: PlanCase) {
        let section = test_section(&case.record.plan_id).to_string();
        self.sections
            .entry(section)
            .or_default()
            .cases
            .insert(uuid, case);
    }

    pub fn case_count(&self) -> usize {
        self.sections.values().map(|suite| suite.cases.len()).sum()
    }
}

impl FromIterator<(String, PlanSuite)> for TestPlan {
    fn from_iter<I: IntoIterator<Item = (String, PlanSuite)>>(iter: I) -> Self {
        Self {
            sections: iter.into_iter().collect(),
        }
    }
}

/// `"RT-1.2"` is in section `"RT-1"`; IDs without a `.` are their own section.
pub fn test_section(plan_id: &str) -> &str {
    plan_id.split_once('.').map_or(plan_id, |(section, _)| section)
}

#[derive(Debug, thiserror::Error)]
#[error("cannot build test plan: {}", .problems.join("; "))]
pub struct PlanBuildError {
    pub problems: Vec<String>,
}

/// Group every case of `suite` by section and uuid.
///
/// All cases are visited; any problem fails the build and every problem is
/// reported together.
pub fn build_plan(suite: &TestSuite) -> Result<TestPlan, PlanBuildError> {
    let mut problems = Vec::new();
    let mut by_uuid: BTreeMap<String, (String, PlanCase)> = BTreeMap::new();

    for case in suite.cases() {
        let test_dir = case.test_dir.as_str();
        let Some(record) = &case.existing else {
            problems.push(format!("{test_dir}: missing rundata"));
            continue;
        };
        let Some(uuid) = parse_v4_uuid(&record.uuid) else {
            problems.push(format!("{test_dir}: invalid uuid {:?}", record.uuid));
            continue;
        };
        let kind = test_kind(test_dir);

        match by_uuid.entry(uuid.hyphenated().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert((
                    test_dir.to_string(),
                    PlanCase::new(record.clone()).with_test_dir(kind, test_dir),
                ));
            }
            Entry::Occupied(mut slot) => {
                let uuid = slot.key().clone();
                let (first_dir, seen) = slot.get_mut();
                if !seen.record.equivalent(record) {
                    problems.push(format!(
                        "{test_dir}: uuid {uuid} reused with divergent data \
                         (first used by {first_dir})"
                    ));
                    continue;
                }
                seen.test_dirs
                    .entry(kind.to_string())
                    .or_insert_with(|| test_dir.to_string());
            }
        }
    }

    if !problems.is_empty() {
        return Err(PlanBuildError { problems });
    }

    let mut plan = TestPlan::default();
    for (uuid, (_, case)) in by_uuid {
        plan.insert(uuid, case);
    }
    Ok(plan)
}
