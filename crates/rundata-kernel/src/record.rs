//! Identity record: the canonical facts about one logical test.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use uuid::{Uuid, Variant};

/// Topology a test requires.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Testbed {
    #[default]
    #[serde(rename = "TESTBED_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "TESTBED_DUT")]
    Dut,
    #[serde(rename = "TESTBED_DUT_DUT_4LINKS")]
    DutDut4Links,
    #[serde(rename = "TESTBED_DUT_ATE_2LINKS")]
    DutAte2Links,
    #[serde(rename = "TESTBED_DUT_ATE_4LINKS")]
    DutAte4Links,
    #[serde(rename = "TESTBED_DUT_ATE_9LINKS")]
    DutAte9Links,
}

/// Testbed assigned to records that do not name one.
pub const DEFAULT_TESTBED: Testbed = Testbed::DutAte2Links;

impl Testbed {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "TESTBED_UNSPECIFIED",
            Self::Dut => "TESTBED_DUT",
            Self::DutDut4Links => "TESTBED_DUT_DUT_4LINKS",
            Self::DutAte2Links => "TESTBED_DUT_ATE_2LINKS",
            Self::DutAte4Links => "TESTBED_DUT_ATE_4LINKS",
            Self::DutAte9Links => "TESTBED_DUT_ATE_9LINKS",
        }
    }

    pub fn is_unspecified(self) -> bool {
        self == Self::Unspecified
    }
}

impl Display for Testbed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which platforms an exception applies to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformMatch {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vendor: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hardware_model: Vec<String>,
}

/// Deviation flags applied on matching platforms. The flags are carried
/// verbatim; nothing here interprets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformException {
    #[serde(default)]
    pub platform: PlatformMatch,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deviations: BTreeMap<String, Value>,
}

/// The identity of one test as persisted next to it.
///
/// Fields unknown to this version land in `extra` and are written back
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub testbed: Testbed,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platform_exceptions: Vec<PlatformException>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl IdentityRecord {
    /// A record carrying only what a README heading provides.
    pub fn from_heading(plan_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// `"{plan_id}: {description}"`, the title used by plan documents.
    pub fn title(&self) -> String {
        format!("{}: {}", self.plan_id, self.description)
    }

    /// The uuid in canonical form, if it is a valid RFC 4122 version 4 uuid.
    pub fn canonical_uuid(&self) -> Option<String> {
        parse_v4_uuid(&self.uuid).map(|u| u.hyphenated().to_string())
    }

    /// Copy with repeated fields sorted so comparisons ignore their order.
    pub fn canonicalized(&self) -> Self {
        let mut out = self.clone();
        for exception in &mut out.platform_exceptions {
            exception.platform.hardware_model.sort();
        }
        out.platform_exceptions
            .sort_by_cached_key(|exception| serde_json::to_string(exception).unwrap_or_default());
        out
    }

    /// Field-for-field equality, insensitive to the order of repeated fields.
    pub fn equivalent(&self, other: &Self) -> bool {
        self.canonicalized() == other.canonicalized()
    }
}

/// Parse a uuid and accept it only if it is RFC 4122 version 4.
pub fn parse_v4_uuid(s: &str) -> Option<Uuid> {
    Uuid::parse_str(s)
        .ok()
        .filter(|u| u.get_variant() == Variant::RFC4122 && u.get_version_num() == 4)
}
