//! # Rundata Kernel
//!
//! Reconciles the identity of every test in a feature-profile repository.
//! Each test directory carries a README whose heading names the
//! test, and an identity record that gives it a stable uuid and a testbed.
//!
//! ## Architecture
//!
//! ```text
//! TestSuite            ← all test directories under one root
//!     │
//! TestCase             ← markdown / existing / fixed views of one record
//!     │
//! IdentityRecord       ← uuid, plan_id, description, testbed, passthrough
//!     │
//! codec + store        ← heading parser, record serde, atomic writes
//! ```
//!
//! Checking never touches disk. Fixing computes target records in memory.
//! Writing persists only records that changed.

pub mod case;
pub mod check;
pub mod codec;
pub mod error;
pub mod layout;
pub mod record;
pub mod store;
pub mod suite;
pub mod version;

pub use case::TestCase;
pub use check::{CheckReport, CheckSummary, Finding};
pub use codec::{parse_markdown, parse_record, write_record};
pub use error::{CodecError, FixError, RundataError};
pub use layout::Layout;
pub use record::{
    DEFAULT_TESTBED, IdentityRecord, PlatformException, PlatformMatch, Testbed, parse_v4_uuid,
};
pub use store::{WriteOutcome, write_atomic, write_case};
pub use suite::{FixReport, ReadOutcome, TestSuite, WriteSummary};
pub use version::{less_version, sort_versions, version_cmp};
