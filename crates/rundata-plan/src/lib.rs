//! Test plans built from reconciled identity records, and their merge onto
//! hierarchical JSON plan documents owned by other tools.

pub mod builder;
pub mod merge;
pub mod node;

pub use builder::{PlanBuildError, PlanCase, PlanSuite, TestPlan, build_plan, test_section};
pub use merge::{
    DEFAULT_CASE_ATTRS, DEFAULT_CODE_URL_PREFIX, MergeError, PlanFormat, TreeMerger, json_quote,
    render,
};
pub use node::{CaseKey, Node};
