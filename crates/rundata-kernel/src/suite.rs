//! The collection of all test cases under one repository root.

use crate::case::TestCase;
use crate::check::{CheckReport, FAILURE_CLASS_OUTSIDE_LAYOUT, Finding, check_consistency};
use crate::error::{FixError, RundataError};
use crate::layout::{KIND_ATE, Layout, relative_dir, test_kind, twin_dir};
use crate::record::{IdentityRecord, Testbed};
use crate::store::{WriteOutcome, write_case};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Test cases keyed by repository-relative directory.
#[derive(Debug, Clone, Default)]
pub struct TestSuite {
    cases: BTreeMap<String, TestCase>,
}

/// A freshly read suite plus the directories that broke the layout.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub suite: TestSuite,
    pub discovery: Vec<Finding>,
}

/// What [`TestSuite::fix`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixReport {
    pub fixed: usize,
    pub errors: Vec<FixError>,
    /// `(ate_dir, otg_dir)` pairs whose uuid was copied onto the OTG side.
    pub propagated: Vec<(String, String)>,
}

/// What [`TestSuite::write`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub updated: Vec<String>,
    pub unchanged: usize,
}

impl WriteSummary {
    /// No record needed rewriting.
    pub fn is_noop(&self) -> bool {
        self.updated.is_empty()
    }
}

impl FromIterator<TestCase> for TestSuite {
    fn from_iter<I: IntoIterator<Item = TestCase>>(iter: I) -> Self {
        Self {
            cases: iter
                .into_iter()
                .map(|case| (case.test_dir.clone(), case))
                .collect(),
        }
    }
}

impl TestSuite {
    /// Discover and load every test under `<root>/<layout.feature_dir>`.
    ///
    /// A directory is a test when it holds a file ending in
    /// `layout.test_file_suffix`. Directories outside the layout are
    /// reported in [`ReadOutcome::discovery`] without stopping the walk.
    pub fn read(root: &Path, layout: &Layout) -> Result<ReadOutcome, RundataError> {
        let feature_root = root.join(&layout.feature_dir);
        if !feature_root.is_dir() {
            return Err(RundataError::MissingFeatureDir {
                path: feature_root.display().to_string(),
            });
        }

        let mut test_dirs = BTreeSet::new();
        let mut rejected = BTreeSet::new();
        let mut discovery = Vec::new();
        for entry in WalkDir::new(&feature_root).sort_by_file_name() {
            let entry = entry.map_err(|source| RundataError::Walk {
                root: feature_root.display().to_string(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !name.ends_with(&layout.test_file_suffix) {
                continue;
            }
            let Some(test_dir) = entry.path().parent().and_then(|dir| relative_dir(root, dir))
            else {
                continue;
            };
            if layout.conforms(&test_dir) {
                test_dirs.insert(test_dir);
            } else if rejected.insert(test_dir.clone()) {
                discovery.push(Finding::new(
                    test_dir,
                    FAILURE_CLASS_OUTSIDE_LAYOUT,
                    format!(
                        "{name} is outside {}/<feature>/.../<kind>/<test>/",
                        layout.feature_dir
                    ),
                ));
            }
        }

        let mut cases = BTreeMap::new();
        for test_dir in test_dirs {
            debug!(%test_dir, "discovered test");
            let mut case = TestCase::new(test_dir.clone());
            case.read(root, layout)?;
            cases.insert(test_dir, case);
        }

        Ok(ReadOutcome {
            suite: Self { cases },
            discovery,
        })
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn get(&self, test_dir: &str) -> Option<&TestCase> {
        self.cases.get(test_dir)
    }

    /// Cases in directory order.
    pub fn cases(&self) -> impl Iterator<Item = &TestCase> {
        self.cases.values()
    }

    fn view<F>(&self, select: F) -> BTreeMap<&str, &IdentityRecord>
    where
        F: Fn(&TestCase) -> Option<&IdentityRecord>,
    {
        self.cases
            .iter()
            .filter_map(|(dir, case)| select(case).map(|record| (dir.as_str(), record)))
            .collect()
    }

    /// Per-case findings plus cross-case consistency over persisted records.
    pub fn check(&self) -> CheckReport {
        let mut findings: Vec<Finding> = self.cases.values().flat_map(TestCase::check).collect();
        check_consistency(&self.view(|case| case.existing.as_ref()), &mut findings);
        CheckReport::from_findings(self.len(), findings)
    }

    /// Cross-case consistency over computed records, run before writing.
    pub fn check_fixed(&self) -> CheckReport {
        let mut findings = Vec::new();
        check_consistency(&self.view(|case| case.fixed.as_ref()), &mut findings);
        CheckReport::from_findings(self.len(), findings)
    }

    /// Fix every case, then copy ATE uuids onto their OTG twins.
    ///
    /// Propagation needs every uuid minted first, so it runs only after all
    /// per-case fixes.
    pub fn fix(&mut self, default_testbed: Testbed) -> FixReport {
        let mut report = FixReport::default();
        for case in self.cases.values_mut() {
            if case.record_unreadable() {
                warn!(test_dir = %case.test_dir, "skipping fix: record file is unreadable");
                report.errors.push(FixError::UnreadableRecord {
                    test_dir: case.test_dir.clone(),
                });
                continue;
            }
            match case.fix(default_testbed) {
                Ok(_) => report.fixed += 1,
                Err(err) => {
                    warn!(test_dir = %case.test_dir, "skipping fix: {err}");
                    report.errors.push(err);
                }
            }
        }

        let pairs: Vec<(String, String)> = self
            .cases
            .keys()
            .filter(|dir| test_kind(dir) == KIND_ATE)
            .filter_map(|dir| twin_dir(dir).map(|twin| (dir.clone(), twin)))
            .filter(|(_, twin)| self.cases.contains_key(twin))
            .collect();
        for (ate_dir, otg_dir) in pairs {
            let Some(uuid) = self.cases[&ate_dir]
                .fixed
                .as_ref()
                .map(|fixed| fixed.uuid.clone())
            else {
                continue;
            };
            let Some(otg) = self
                .cases
                .get_mut(&otg_dir)
                .and_then(|case| case.fixed.as_mut())
            else {
                continue;
            };
            if otg.uuid != uuid {
                debug!(%ate_dir, %otg_dir, %uuid, "propagating uuid to twin");
                otg.uuid = uuid;
            }
            report.propagated.push((ate_dir, otg_dir));
        }

        report
    }

    /// Persist every fixed case.
    pub fn write(&mut self, root: &Path, layout: &Layout) -> Result<WriteSummary, RundataError> {
        let mut summary = WriteSummary::default();
        for case in self.cases.values_mut() {
            match write_case(case, root, layout)? {
                WriteOutcome::Written => summary.updated.push(case.test_dir.clone()),
                WriteOutcome::Unchanged => summary.unchanged += 1,
            }
        }
        Ok(summary)
    }
}
