//! One test directory and the three views of its identity record.

use crate::check::{
    FAILURE_CLASS_DESCRIPTION_STALE, FAILURE_CLASS_MARKDOWN_MISSING, FAILURE_CLASS_MARKDOWN_PARSE,
    FAILURE_CLASS_PLAN_ID_STALE, FAILURE_CLASS_RECORD_MISSING, FAILURE_CLASS_RECORD_PARSE,
    FAILURE_CLASS_TESTBED_UNSPECIFIED, FAILURE_CLASS_UUID_INVALID, FAILURE_CLASS_UUID_MISSING,
    FAILURE_CLASS_UUID_NON_CANONICAL, Finding,
};
use crate::codec::{parse_markdown, parse_record};
use crate::error::{FixError, RundataError};
use crate::layout::Layout;
use crate::record::{IdentityRecord, Testbed, parse_v4_uuid};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

/// A test directory with its markdown, persisted and computed records.
#[derive(Debug, Clone, Default)]
pub struct TestCase {
    /// Repository-relative, `/`-separated.
    pub test_dir: String,
    /// From the README heading; only plan_id and description are set.
    pub markdown: Option<IdentityRecord>,
    /// As persisted, or `None` when no record file exists yet.
    pub existing: Option<IdentityRecord>,
    /// Target state computed by [`TestCase::fix`].
    pub fixed: Option<IdentityRecord>,
    /// Parse problems found by [`TestCase::read`].
    pub problems: Vec<Finding>,
}

impl TestCase {
    pub fn new(test_dir: impl Into<String>) -> Self {
        Self {
            test_dir: test_dir.into(),
            ..Self::default()
        }
    }

    /// Load the README heading and the persisted record.
    ///
    /// Missing files are not errors here; [`TestCase::check`] reports them.
    /// Malformed files become problems on the case. Only I/O failures other
    /// than "not found" abort.
    pub fn read(&mut self, root: &Path, layout: &Layout) -> Result<(), RundataError> {
        let dir = root.join(&self.test_dir);

        let spec_path = dir.join(&layout.spec_file);
        match fs::read_to_string(&spec_path) {
            Ok(text) => match parse_markdown(&text) {
                Ok(record) => self.markdown = Some(record),
                Err(err) => self.problems.push(Finding::new(
                    &self.test_dir,
                    FAILURE_CLASS_MARKDOWN_PARSE,
                    format!("{}: {err}", layout.spec_file),
                )),
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(test_dir = %self.test_dir, "no README");
            }
            Err(err) => return Err(RundataError::read(&spec_path, err)),
        }

        let record_path = dir.join(&layout.record_file);
        match fs::read(&record_path) {
            Ok(bytes) => match parse_record(&bytes) {
                Ok(record) => self.existing = Some(record),
                Err(err) => self.problems.push(Finding::new(
                    &self.test_dir,
                    FAILURE_CLASS_RECORD_PARSE,
                    format!("{}: {err}", layout.record_file),
                )),
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(test_dir = %self.test_dir, "no identity record yet");
            }
            Err(err) => return Err(RundataError::read(&record_path, err)),
        }

        Ok(())
    }

    fn has_problem(&self, class: &str) -> bool {
        self.problems.iter().any(|problem| problem.class == class)
    }

    /// Whether a record file exists but could not be decoded.
    pub fn record_unreadable(&self) -> bool {
        self.has_problem(FAILURE_CLASS_RECORD_PARSE)
    }

    /// Validate this case on its own. Never fails; findings accumulate.
    pub fn check(&self) -> Vec<Finding> {
        let mut findings = self.problems.clone();
        let finding = |class: &str, message: String| Finding::new(&self.test_dir, class, message);

        if self.existing.is_none() && !self.record_unreadable() {
            findings.push(finding(FAILURE_CLASS_RECORD_MISSING, "missing rundata".to_string()));
        }
        if self.markdown.is_none() && !self.has_problem(FAILURE_CLASS_MARKDOWN_PARSE) {
            findings.push(finding(
                FAILURE_CLASS_MARKDOWN_MISSING,
                "missing markdown".to_string(),
            ));
        }

        if let (Some(markdown), Some(existing)) = (&self.markdown, &self.existing) {
            if existing.plan_id != markdown.plan_id {
                findings.push(finding(
                    FAILURE_CLASS_PLAN_ID_STALE,
                    format!(
                        "plan_id needs update: {:?} -> {:?}",
                        existing.plan_id, markdown.plan_id
                    ),
                ));
            }
            if existing.description != markdown.description {
                findings.push(finding(
                    FAILURE_CLASS_DESCRIPTION_STALE,
                    format!(
                        "description needs update: {:?} -> {:?}",
                        existing.description, markdown.description
                    ),
                ));
            }
        }

        if let Some(existing) = &self.existing {
            if existing.testbed.is_unspecified() {
                findings.push(finding(
                    FAILURE_CLASS_TESTBED_UNSPECIFIED,
                    "testbed is unspecified".to_string(),
                ));
            }
            if existing.uuid.is_empty() {
                findings.push(finding(FAILURE_CLASS_UUID_MISSING, "uuid is missing".to_string()));
            } else {
                match parse_v4_uuid(&existing.uuid) {
                    None => findings.push(finding(
                        FAILURE_CLASS_UUID_INVALID,
                        format!("uuid {:?} is not an RFC 4122 version 4 uuid", existing.uuid),
                    )),
                    Some(uuid) => {
                        let canonical = uuid.hyphenated().to_string();
                        if canonical != existing.uuid {
                            findings.push(finding(
                                FAILURE_CLASS_UUID_NON_CANONICAL,
                                format!(
                                    "uuid {:?} should be written as {canonical}",
                                    existing.uuid
                                ),
                            ));
                        }
                    }
                }
            }
        }

        findings
    }

    /// Compute the canonical record.
    ///
    /// Plan ID and description always come from the markdown. A valid
    /// existing uuid is kept; otherwise a new one is minted. Everything else
    /// on the existing record is carried forward.
    pub fn fix(&mut self, default_testbed: Testbed) -> Result<&IdentityRecord, FixError> {
        let Some(markdown) = &self.markdown else {
            return Err(FixError::MissingMarkdown {
                test_dir: self.test_dir.clone(),
            });
        };

        let mut fixed = self.existing.clone().unwrap_or_default();
        fixed.plan_id = markdown.plan_id.clone();
        fixed.description = markdown.description.clone();
        if fixed.testbed.is_unspecified() {
            fixed.testbed = default_testbed;
        }
        fixed.uuid = match parse_v4_uuid(&fixed.uuid) {
            Some(uuid) => uuid.hyphenated().to_string(),
            None => Uuid::new_v4().hyphenated().to_string(),
        };

        Ok(&*self.fixed.insert(fixed))
    }
}
