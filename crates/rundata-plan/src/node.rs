//! Classification of nodes found in a foreign plan document.
//!
//! Documents come from outside and may hold anything. A node is only ever
//! recognized, never rejected: whatever does not look like a suite or a case
//! is [`Node::Opaque`] and is carried through untouched.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use uuid::Uuid;

/// How a case node identifies itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseKey {
    /// From `li_attr.title` before the first `:`, or `""`.
    pub plan_id: String,
    /// `li_attr.uuid` in canonical hyphenated form.
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node<'a> {
    Suite {
        section: String,
        node: &'a Map<String, Value>,
    },
    Case {
        key: CaseKey,
        node: &'a Map<String, Value>,
    },
    Opaque(&'a Value),
}

fn section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\[\]]+)\]").expect("regex must compile"))
}

fn has_child_list(node: &Map<String, Value>) -> bool {
    matches!(node.get("children"), None | Some(Value::Array(_)))
}

impl<'a> Node<'a> {
    /// A suite is an object whose `text` names a bracketed section.
    pub fn suite(value: &'a Value) -> Self {
        let Value::Object(node) = value else {
            return Self::Opaque(value);
        };
        let section = node
            .get("text")
            .and_then(Value::as_str)
            .and_then(|text| section_re().captures(text))
            .map(|caps| caps[1].to_string());
        match section {
            Some(section) if has_child_list(node) => Self::Suite { section, node },
            _ => Self::Opaque(value),
        }
    }

    /// A case is an object whose `li_attr.uuid` is a parseable uuid.
    pub fn case(value: &'a Value) -> Self {
        let Value::Object(node) = value else {
            return Self::Opaque(value);
        };
        let Some(attrs) = node.get("li_attr").and_then(Value::as_object) else {
            return Self::Opaque(value);
        };
        let Some(uuid) = attrs
            .get("uuid")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
        else {
            return Self::Opaque(value);
        };
        let plan_id = attrs
            .get("title")
            .and_then(Value::as_str)
            .and_then(|title| title.split_once(':'))
            .map(|(plan_id, _)| plan_id.trim().to_string())
            .unwrap_or_default();
        Self::Case {
            key: CaseKey {
                plan_id,
                uuid: uuid.hyphenated().to_string(),
            },
            node,
        }
    }
}
