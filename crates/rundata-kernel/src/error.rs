//! Error types for rundata kernel operations.

use std::path::Path;

/// Fatal failures: the run cannot continue because on-disk state is unknown.
#[derive(Debug, thiserror::Error)]
pub enum RundataError {
    #[error("feature directory not found: {path}")]
    MissingFeatureDir { path: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {root}: {source}")]
    Walk {
        root: String,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl RundataError {
    pub(crate) fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Errors from parsing or serializing README and record files.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("README has no heading")]
    EmptyMarkdown,

    #[error("heading must look like `# <plan_id>: <description>`, got {line:?}")]
    Heading { line: String },

    #[error("invalid identity record: {0}")]
    Record(#[source] serde_json::Error),

    #[error("failed to serialize identity record: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Per-case reasons a canonical record could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixError {
    #[error("{test_dir}: markdown is missing")]
    MissingMarkdown { test_dir: String },

    #[error("{test_dir}: existing record is unreadable; refusing to replace it")]
    UnreadableRecord { test_dir: String },
}
