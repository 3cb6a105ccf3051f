//! JSON parser for stop lists.

use anyhow::{Context, Result};
use std::io::Read;
use tracing::debug;

use crate::record::StopRecord;

/// Source label meaning standard input.
pub const STDIN: &str = "-";

/// Reads the raw bytes of a stop list from a file path, or stdin for `-`.
#[tracing::instrument(fields(source = %source))]
pub fn read_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source == STDIN {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stop list from stdin")?;
        buf
    } else {
        std::fs::read(source).with_context(|| format!("Failed to read stop list from {source}"))?
    };
    debug!(bytes = bytes.len(), "Stop list bytes read");
    Ok(bytes)
}

/// Decodes a JSON array of [`StopRecord`]s.
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON array of objects carrying
/// exactly the six record keys. Wrong-typed values are not errors here.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<StopRecord>> {
    let records: Vec<StopRecord> =
        serde_json::from_slice(bytes).context("Stop list is not a valid JSON array of records")?;
    debug!(records = records.len(), "Stop list parsed");
    Ok(records)
}
