//! Order-preserving merge of a [`TestPlan`] onto a foreign plan document.
//!
//! The document is a tree of `{text, type, li_attr, children}` nodes: a plan
//! root, suites named `[SECTION] ...`, and cases carrying a uuid in
//! `li_attr`. Merging rewrites only the keys this tool owns. Nodes it does
//! not recognize, and keys it does not own, come out exactly as they went
//! in. Merging the output again yields the same tree.

use crate::builder::{PlanCase, PlanSuite, TestPlan};
use crate::node::Node;
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use tracing::debug;

pub const DEFAULT_CODE_URL_PREFIX: &str =
    "https://github.com/openconfig/featureprofiles/tree/main/";

/// Case attributes filled in when a document does not have them yet.
pub const DEFAULT_CASE_ATTRS: [(&str, &str); 8] = [
    ("script", ""),
    ("script_status", ""),
    ("requirement", ""),
    ("tags", ""),
    ("priority", ""),
    ("duration", ""),
    ("goal", ""),
    ("topology", ""),
];

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("plan document root must be a JSON object")]
    RootNotObject,

    #[error("plan document root has non-array `children`")]
    ChildrenNotArray,

    #[error("failed to render plan document: {0}")]
    Render(#[source] serde_json::Error),
}

/// Which consumer the document is written for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlanFormat {
    #[default]
    JsTree,
    TestTracker,
}

impl PlanFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JsTree => "jstree",
            Self::TestTracker => "testtracker",
        }
    }
}

impl Display for PlanFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeMerger {
    pub format: PlanFormat,
    pub code_url_prefix: String,
}

impl TreeMerger {
    pub fn new(format: PlanFormat) -> Self {
        Self {
            format,
            code_url_prefix: DEFAULT_CODE_URL_PREFIX.to_string(),
        }
    }

    pub fn with_code_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.code_url_prefix = prefix.into();
        self
    }

    /// An empty plan document.
    pub fn skeleton(&self, title: &str) -> Value {
        json!({
            "text": title,
            "type": "testplan",
            "children": [],
        })
    }

    /// Merge `plan` onto `document`, returning a new tree.
    ///
    /// Suites already in the document keep their position; sections the
    /// document lacks are appended in version order.
    pub fn merge(&self, plan: &TestPlan, document: &Value) -> Result<Value, MergeError> {
        let Value::Object(root) = document else {
            return Err(MergeError::RootNotObject);
        };
        let children = match root.get("children") {
            None => &[][..],
            Some(Value::Array(children)) => children.as_slice(),
            Some(_) => return Err(MergeError::ChildrenNotArray),
        };

        let mut merged: BTreeSet<String> = BTreeSet::new();
        let mut out = Vec::with_capacity(children.len() + plan.sections.len());
        for child in children {
            match Node::suite(child) {
                Node::Suite { section, node } if !merged.contains(&section) => {
                    match plan.sections.get_key_value(&section) {
                        Some((name, suite)) => {
                            out.push(Value::Object(self.merge_suite(suite, node)));
                            merged.insert(name.clone());
                        }
                        None => {
                            debug!(%section, "suite not in plan; passing through");
                            out.push(child.clone());
                        }
                    }
                }
                _ => out.push(child.clone()),
            }
        }
        for section in plan.sorted_sections() {
            if merged.contains(section) {
                continue;
            }
            if let Some(suite) = plan.get(section) {
                out.push(self.new_suite(section, suite));
            }
        }

        let mut root = root.clone();
        root.insert("children".to_string(), Value::Array(out));
        Ok(Value::Object(root))
    }

    fn new_suite(&self, section: &str, suite: &PlanSuite) -> Value {
        let name = format!("[{section}]");
        let mut attrs = Map::new();
        attrs.insert("rel".to_string(), json!("testsuites"));
        attrs.insert("title".to_string(), json!(name));
        attrs.insert("description".to_string(), json!(json_quote("")));
        attrs.insert("tags".to_string(), json!(""));

        let mut node = Map::new();
        node.insert("text".to_string(), json!(name));
        node.insert("type".to_string(), json!("testsuites"));
        node.insert("li_attr".to_string(), Value::Object(attrs));
        Value::Object(self.merge_suite(suite, &node))
    }

    /// Cases match first by plan ID, then by uuid. The first node to match a
    /// case claims it; later nodes for the same case pass through.
    fn merge_suite(&self, suite: &PlanSuite, node: &Map<String, Value>) -> Map<String, Value> {
        let children = match node.get("children") {
            Some(Value::Array(children)) => children.as_slice(),
            _ => &[][..],
        };

        let mut merged: BTreeSet<&str> = BTreeSet::new();
        let mut out = Vec::with_capacity(children.len() + suite.cases.len());
        for child in children {
            let Node::Case { key, node: case_node } = Node::case(child) else {
                debug!("unrecognized case node; passing through");
                out.push(child.clone());
                continue;
            };
            let by_plan_id = Some(key.plan_id.as_str())
                .filter(|plan_id| !plan_id.is_empty())
                .and_then(|plan_id| suite.uuid_for_plan_id(plan_id))
                .filter(|uuid| !merged.contains(uuid));
            let by_uuid = || {
                suite
                    .cases
                    .get_key_value(&key.uuid)
                    .map(|(uuid, _)| uuid.as_str())
                    .filter(|uuid| !merged.contains(uuid))
            };
            match by_plan_id.or_else(by_uuid) {
                Some(uuid) => {
                    if let Some(case) = suite.get(uuid) {
                        out.push(Value::Object(self.merge_case(uuid, case, case_node)));
                    }
                    merged.insert(uuid);
                }
                None => {
                    debug!(
                        plan_id = %key.plan_id,
                        uuid = %key.uuid,
                        "case not in plan; passing through"
                    );
                    out.push(child.clone());
                }
            }
        }
        for uuid in suite.sorted_uuids() {
            if merged.contains(uuid) {
                continue;
            }
            if let Some(case) = suite.get(uuid) {
                out.push(Value::Object(self.merge_case(uuid, case, &Map::new())));
            }
        }

        let mut node = node.clone();
        node.insert("children".to_string(), Value::Array(out));
        node
    }

    fn merge_case(
        &self,
        uuid: &str,
        case: &PlanCase,
        node: &Map<String, Value>,
    ) -> Map<String, Value> {
        let title = case.record.title();
        let mut node = node.clone();
        node.insert("type".to_string(), json!("testcases"));
        node.insert("text".to_string(), json!(title));

        let mut attrs = match node.get("li_attr") {
            Some(Value::Object(attrs)) => attrs.clone(),
            _ => Map::new(),
        };
        attrs.insert("rel".to_string(), json!("testcases"));
        attrs.insert("title".to_string(), json!(title));
        attrs.insert("uuid".to_string(), json!(uuid));
        attrs.insert(
            "description".to_string(),
            json!(json_quote(&self.case_description(&case.test_dirs))),
        );
        if self.format == PlanFormat::TestTracker && !case.record.testbed.is_unspecified() {
            attrs.insert("testbed".to_string(), json!(case.record.testbed.as_str()));
        }
        for (key, value) in DEFAULT_CASE_ATTRS {
            if !attrs.contains_key(key) {
                attrs.insert(key.to_string(), json!(value));
            }
        }
        node.insert("li_attr".to_string(), Value::Object(attrs));
        node
    }

    /// The "See code location" block listing every directory of a case.
    pub fn case_description(&self, test_dirs: &BTreeMap<String, String>) -> String {
        if test_dirs.is_empty() {
            return String::new();
        }
        let mut out = String::from("See code location:\n");
        for (kind, path) in test_dirs {
            let label = match kind.as_str() {
                "ate_tests" => "ATE Test",
                "otg_tests" => "OTG Test",
                "kne_tests" => "KNE Test",
                _ => "Test",
            };
            out.push_str(&format!("  - {label}: {}{path}\n", self.code_url_prefix));
        }
        out
    }
}

/// String encoded as a JSON literal, with HTML-sensitive characters escaped
/// so the result is safe to embed in markup.
pub fn json_quote(s: &str) -> String {
    Value::String(s.to_string())
        .to_string()
        .replace('&', "\\u0026")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Indented JSON with a trailing newline.
pub fn render(value: &Value) -> Result<String, MergeError> {
    let mut out = serde_json::to_string_pretty(value).map_err(MergeError::Render)?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rundata_kernel::{IdentityRecord, Testbed};

    fn record(plan_id: &str, description: &str, uuid: &str) -> IdentityRecord {
        IdentityRecord {
            uuid: uuid.to_string(),
            ..IdentityRecord::from_heading(plan_id, description)
        }
    }

    fn suite(cases: &[(&str, &str, &str)]) -> PlanSuite {
        cases
            .iter()
            .map(|(plan_id, description, uuid)| {
                (
                    uuid.to_string(),
                    PlanCase::new(record(plan_id, description, uuid)),
                )
            })
            .collect()
    }

    fn case_attrs(title: &str, uuid: &str) -> Value {
        let mut attrs = Map::new();
        for (key, value) in DEFAULT_CASE_ATTRS {
            attrs.insert(key.to_string(), json!(value));
        }
        attrs.insert("rel".to_string(), json!("testcases"));
        attrs.insert("title".to_string(), json!(title));
        attrs.insert("uuid".to_string(), json!(uuid));
        attrs.insert("description".to_string(), json!("\"\""));
        Value::Object(attrs)
    }

    fn merged_case(title: &str, uuid: &str) -> Value {
        json!({
            "type": "testcases",
            "text": title,
            "li_attr": case_attrs(title, uuid),
        })
    }

    #[test]
    fn plan_merge_preserves_order_and_appends_new_sections() {
        let plan: TestPlan = [
            (
                "XX-1".to_string(),
                suite(&[("XX-1.1", "Foo", "0eac5b62-ab22-449d-9a9a-255b05572641")]),
            ),
            (
                "XX-2".to_string(),
                suite(&[("XX-2.1", "Bar", "f842057d-0100-4198-a18d-593b2bf3610e")]),
            ),
            (
                "YY-1".to_string(),
                suite(&[("YY-1.1", "Xyzzy", "12cd2de3-69af-4aa6-a3d6-a2d5fbdb86c6")]),
            ),
        ]
        .into_iter()
        .collect();

        let document = json!({
            "text": "JSON Plan To Be Merged",
            "type": "testplan",
            "children": [
                42,
                {"text": "Not Bracketed"},
                {"text": "[ZZ-1] JSON Only"},
                {"text": "[YY-1] Needs Update"},
                {"text": "[XX-1] Needs Update"},
            ],
        });
        let before = document.clone();

        let got = TreeMerger::new(PlanFormat::JsTree)
            .merge(&plan, &document)
            .expect("merge should succeed");
        assert_eq!(document, before);

        let want = json!({
            "text": "JSON Plan To Be Merged",
            "type": "testplan",
            "children": [
                42,
                {"text": "Not Bracketed"},
                {"text": "[ZZ-1] JSON Only"},
                {
                    "text": "[YY-1] Needs Update",
                    "children": [
                        merged_case("YY-1.1: Xyzzy", "12cd2de3-69af-4aa6-a3d6-a2d5fbdb86c6"),
                    ],
                },
                {
                    "text": "[XX-1] Needs Update",
                    "children": [
                        merged_case("XX-1.1: Foo", "0eac5b62-ab22-449d-9a9a-255b05572641"),
                    ],
                },
                {
                    "text": "[XX-2]",
                    "type": "testsuites",
                    "li_attr": {
                        "rel": "testsuites",
                        "title": "[XX-2]",
                        "description": "\"\"",
                        "tags": "",
                    },
                    "children": [
                        merged_case("XX-2.1: Bar", "f842057d-0100-4198-a18d-593b2bf3610e"),
                    ],
                },
            ],
        });
        assert_eq!(got, want);
    }

    #[test]
    fn suite_merge_matches_by_plan_id_then_uuid() {
        let plan_suite = suite(&[
            ("XX-1.1", "Apple", "d2d462b4-db36-4159-9152-744dc6168ba8"),
            ("XX-1.2", "Banana", "755ae14f-7d1a-465a-8cfb-f1674ea68763"),
            ("XX-1.3", "Cherry", "c2cb54c0-2acc-4fd8-8c2a-7f9ccb9ea192"),
            ("XX-1.4", "Durian", "f7372990-dfb2-4a8f-acfb-c7a31b29522c"),
        ]);
        let Value::Object(node) = json!({
            "text": "JSON Suite To Be Merged",
            "type": "testsuites",
            "children": [
                42,
                {"text": "XX-1.10: Missing li_attr"},
                {"text": "XX-1.11: Missing UUID", "li_attr": {}},
                {"text": "XX-1.12: Invalid UUID", "li_attr": {"uuid": "Invalid UUID"}},
                {
                    "text": "XX-1.20: JSON Only",
                    "type": "testcases",
                    "li_attr": {"title": "XX-1.20: JSON Only"},
                },
                {
                    "text": "XX-1.3: Needs Update",
                    "li_attr": {
                        "title": "XX-1.3: Needs Update",
                        "uuid": "f6fbad49-ede3-4d47-b58b-8a8005e4b598",
                    },
                },
                {
                    "text": "No Title",
                    "li_attr": {"uuid": "755ae14f-7d1a-465a-8cfb-f1674ea68763"},
                },
                {
                    "text": "Title Has No ID",
                    "li_attr": {
                        "title": "Title Has No ID",
                        "uuid": "d2d462b4-db36-4159-9152-744dc6168ba8",
                    },
                },
            ],
        }) else {
            panic!("fixture should be an object");
        };

        let got = TreeMerger::new(PlanFormat::JsTree).merge_suite(&plan_suite, &node);
        let want = json!({
            "text": "JSON Suite To Be Merged",
            "type": "testsuites",
            "children": [
                42,
                {"text": "XX-1.10: Missing li_attr"},
                {"text": "XX-1.11: Missing UUID", "li_attr": {}},
                {"text": "XX-1.12: Invalid UUID", "li_attr": {"uuid": "Invalid UUID"}},
                {
                    "text": "XX-1.20: JSON Only",
                    "type": "testcases",
                    "li_attr": {"title": "XX-1.20: JSON Only"},
                },
                merged_case("XX-1.3: Cherry", "c2cb54c0-2acc-4fd8-8c2a-7f9ccb9ea192"),
                merged_case("XX-1.2: Banana", "755ae14f-7d1a-465a-8cfb-f1674ea68763"),
                merged_case("XX-1.1: Apple", "d2d462b4-db36-4159-9152-744dc6168ba8"),
                merged_case("XX-1.4: Durian", "f7372990-dfb2-4a8f-acfb-c7a31b29522c"),
            ],
        });
        assert_eq!(Value::Object(got), want);
    }

    #[test]
    fn duplicate_case_nodes_pass_through_after_first_match() {
        let uuid = "d2d462b4-db36-4159-9152-744dc6168ba8";
        let plan_suite = suite(&[("XX-1.1", "Apple", uuid)]);
        let stale = json!({"text": "stale", "li_attr": {"title": "XX-1.1: Old", "uuid": uuid}});
        let Value::Object(node) = json!({
            "text": "[XX-1]",
            "children": [stale.clone(), stale.clone()],
        }) else {
            panic!("fixture should be an object");
        };

        let got = TreeMerger::new(PlanFormat::JsTree).merge_suite(&plan_suite, &node);
        let children = got["children"].as_array().expect("children should be an array");
        assert_eq!(children.len(), 2);
        assert_eq!(children[0]["text"], json!("XX-1.1: Apple"));
        assert_eq!(children[1], stale);
    }

    #[test]
    fn case_merge_keeps_foreign_attributes() {
        let uuid = "a5413d74-5b44-49d2-b4e7-84c9751d50be";
        let case = PlanCase::new(record("XX-1.1", "Quuz Functional Test", uuid));
        let Value::Object(node) = json!({
            "li_attr": {
                "author": "liulk",
                "script_status": "Preserved",
                "duration": 42,
            },
            "pk": 1234567,
        }) else {
            panic!("fixture should be an object");
        };

        for format in [PlanFormat::JsTree, PlanFormat::TestTracker] {
            let got = TreeMerger::new(format).merge_case(uuid, &case, &node);

            let mut want_attrs = case_attrs("XX-1.1: Quuz Functional Test", uuid);
            want_attrs["author"] = json!("liulk");
            want_attrs["script_status"] = json!("Preserved");
            want_attrs["duration"] = json!(42);
            let want = json!({
                "type": "testcases",
                "text": "XX-1.1: Quuz Functional Test",
                "li_attr": want_attrs,
                "pk": 1234567,
            });
            assert_eq!(Value::Object(got), want, "format {format}");
        }
    }

    #[test]
    fn tracker_writes_testbed_only_when_specified() {
        let uuid = "a5413d74-5b44-49d2-b4e7-84c9751d50be";
        let case = PlanCase::new(IdentityRecord {
            testbed: Testbed::DutAte2Links,
            ..record("XX-1.1", "Quuz Functional Test", uuid)
        });
        let Value::Object(node) = json!({"li_attr": {"testbed": "TESTBED_DUT"}}) else {
            panic!("fixture should be an object");
        };

        let tracker = TreeMerger::new(PlanFormat::TestTracker).merge_case(uuid, &case, &node);
        assert_eq!(tracker["li_attr"]["testbed"], json!("TESTBED_DUT_ATE_2LINKS"));

        let jstree = TreeMerger::new(PlanFormat::JsTree).merge_case(uuid, &case, &node);
        assert_eq!(jstree["li_attr"]["testbed"], json!("TESTBED_DUT"));

        let unspecified = PlanCase::new(record("XX-1.1", "Quuz Functional Test", uuid));
        let kept = TreeMerger::new(PlanFormat::TestTracker).merge_case(uuid, &unspecified, &node);
        assert_eq!(kept["li_attr"]["testbed"], json!("TESTBED_DUT"));
    }

    #[test]
    fn description_lists_code_locations_by_kind() {
        let test_dirs: BTreeMap<String, String> = [
            ("", "feature/experimental/foo/empty_tests/foo_test"),
            ("ate_tests", "feature/experimental/foo/ate_tests/foo_test"),
            ("kne_tests", "feature/experimental/foo/kne_tests/foo_test"),
            ("otg_tests", "feature/experimental/foo/otg_tests/foo_test"),
            ("tests", "feature/experimental/foo/tests/foo_test"),
            ("unknown_tests", "feature/experimental/foo/unknown_tests/foo_test"),
        ]
        .into_iter()
        .map(|(kind, path)| (kind.to_string(), path.to_string()))
        .collect();

        let desc = TreeMerger::new(PlanFormat::JsTree)
            .with_code_url_prefix("https://code.example/")
            .case_description(&test_dirs);
        assert!(desc.ends_with('\n'));
        insta::assert_snapshot!(desc.trim_end(), @r"
        See code location:
          - Test: https://code.example/feature/experimental/foo/empty_tests/foo_test
          - ATE Test: https://code.example/feature/experimental/foo/ate_tests/foo_test
          - KNE Test: https://code.example/feature/experimental/foo/kne_tests/foo_test
          - OTG Test: https://code.example/feature/experimental/foo/otg_tests/foo_test
          - Test: https://code.example/feature/experimental/foo/tests/foo_test
          - Test: https://code.example/feature/experimental/foo/unknown_tests/foo_test
        ");

        assert_eq!(
            TreeMerger::new(PlanFormat::JsTree).case_description(&BTreeMap::new()),
            ""
        );
    }

    #[test]
    fn json_quote_escapes_html_characters() {
        assert_eq!(
            json_quote("apple\nbanana\ncherry\n"),
            r#""apple\nbanana\ncherry\n""#
        );
        assert_eq!(json_quote("Tom & Jerry"), r#""Tom \u0026 Jerry""#);
        assert_eq!(json_quote("<b>"), r#""\u003cb\u003e""#);
        assert_eq!(json_quote(""), r#""""#);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut plan = TestPlan::default();
        let uuid = "0eac5b62-ab22-449d-9a9a-255b05572641";
        plan.insert(
            uuid.to_string(),
            PlanCase::new(record("XX-1.1", "Foo", uuid))
                .with_test_dir("tests", "feature/foo/tests/foo_test"),
        );
        let merger = TreeMerger::new(PlanFormat::TestTracker);
        let once = merger
            .merge(&plan, &merger.skeleton("Test Plan"))
            .expect("merge should succeed");
        let twice = merger.merge(&plan, &once).expect("merge should succeed");
        assert_eq!(once, twice);
        assert_eq!(render(&once).ok(), render(&twice).ok());
    }

    #[test]
    fn merge_onto_document_without_children() {
        let document = json!({"text": "Base Test Plan", "type": "testplan"});
        let got = TreeMerger::new(PlanFormat::JsTree)
            .merge(&TestPlan::default(), &document)
            .expect("merge should succeed");
        assert_eq!(got["text"], json!("Base Test Plan"));
        assert_eq!(got["type"], json!("testplan"));
        assert_eq!(got["children"], json!([]));
    }

    #[test]
    fn structural_errors_are_reported() {
        let merger = TreeMerger::new(PlanFormat::JsTree);
        assert!(matches!(
            merger.merge(&TestPlan::default(), &json!([1, 2])),
            Err(MergeError::RootNotObject)
        ));
        assert!(matches!(
            merger.merge(&TestPlan::default(), &json!({"children": {}})),
            Err(MergeError::ChildrenNotArray)
        ));
    }

    #[test]
    fn render_ends_with_newline() {
        let rendered = render(&json!({"a": 1})).expect("render should succeed");
        assert_eq!(rendered, "{\n  \"a\": 1\n}\n");
    }
}
