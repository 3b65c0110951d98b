//! Atomic persistence of identity-record files.
//!
//! A record is written to a temporary sibling, synced, and renamed over the
//! target, so readers only ever see the old or the new file.

use crate::case::TestCase;
use crate::codec::write_record;
use crate::error::RundataError;
use crate::layout::Layout;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Result of persisting one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The persisted record already matched; nothing was touched.
    Unchanged,
    /// A new record file was written.
    Written,
}

/// Persist `case.fixed` unless it is equivalent to `case.existing`.
///
/// On success `existing` is updated to the written record.
pub fn write_case(
    case: &mut TestCase,
    root: &Path,
    layout: &Layout,
) -> Result<WriteOutcome, RundataError> {
    let Some(fixed) = case.fixed.clone() else {
        return Ok(WriteOutcome::Unchanged);
    };
    if case
        .existing
        .as_ref()
        .is_some_and(|existing| existing.equivalent(&fixed))
    {
        return Ok(WriteOutcome::Unchanged);
    }

    let path = root.join(&case.test_dir).join(&layout.record_file);
    let bytes = write_record(&fixed)?;
    write_atomic(&path, &bytes)?;
    info!(test_dir = %case.test_dir, uuid = %fixed.uuid, "identity record written");
    case.existing = Some(fixed);
    Ok(WriteOutcome::Written)
}

/// Replace `path` with `bytes` via temporary file and rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RundataError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| RundataError::write(parent, e))?;
    }

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> Result<(), RundataError> {
        let mut file = File::create(&tmp_path).map_err(|e| RundataError::write(&tmp_path, e))?;
        file.write_all(bytes)
            .map_err(|e| RundataError::write(&tmp_path, e))?;
        file.sync_all()
            .map_err(|e| RundataError::write(&tmp_path, e))?;
        Ok(())
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        RundataError::write(path, e)
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let dir = File::open(parent).map_err(|e| RundataError::write(parent, e))?;
        dir.sync_all().map_err(|e| RundataError::write(parent, e))?;
    }

    Ok(())
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}
