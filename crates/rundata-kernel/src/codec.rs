//! README heading and identity-record file codecs.

use crate::error::CodecError;
use crate::record::IdentityRecord;
use regex::Regex;
use std::sync::OnceLock;

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#\s*([^#\s:][^:]*?)\s*:\s*(\S.*?)\s*$").expect("heading regex must compile")
    })
}

/// Read plan ID and description from the first non-blank line of a
/// test README.
pub fn parse_markdown(text: &str) -> Result<IdentityRecord, CodecError> {
    let line = text
        .trim_start_matches('\u{feff}')
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or(CodecError::EmptyMarkdown)?;
    let captures = heading_re()
        .captures(line)
        .ok_or_else(|| CodecError::Heading {
            line: line.to_string(),
        })?;
    Ok(IdentityRecord::from_heading(&captures[1], &captures[2]))
}

/// Decode a persisted identity record.
pub fn parse_record(bytes: &[u8]) -> Result<IdentityRecord, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Record)
}

/// Encode an identity record. Output is byte-stable for equal records.
pub fn write_record(record: &IdentityRecord) -> Result<Vec<u8>, CodecError> {
    let mut bytes = serde_json::to_vec_pretty(record).map_err(CodecError::Serialize)?;
    bytes.push(b'\n');
    Ok(bytes)
}
