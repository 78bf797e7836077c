//! Dictionary-layout bucket files
//!
//! A dictionary bucket is a single JSON object mapping cache-key strings to
//! arbitrary JSON values. Files are always rewritten wholesale; individual
//! entries are never mutated in place or deleted.

use crate::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// In-memory form of a dictionary bucket
pub type BucketMap = BTreeMap<String, Value>;

/// Read a bucket file into a mapping
///
/// Syntactically invalid content is treated as an empty mapping when
/// `ignore_invalid` is set (the default policy), otherwise surfaced as
/// [`Error::Parse`]. Content that parses but is not a JSON object is always
/// a hard [`Error::MalformedCache`], regardless of the flag.
///
/// # Errors
///
/// I/O failures propagate with their underlying `std::io::Error` source.
pub fn read_bucket(path: &Path, ignore_invalid: bool) -> Result<BucketMap> {
    let bytes = fs::read(path).map_err(|e| Error::io(e, path, "read"))?;
    let parsed: Value = match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(e) if ignore_invalid => {
            tracing::warn!(
                path = %path.display(),
                "treating unparseable bucket file as empty: {e}"
            );
            return Ok(BucketMap::new());
        }
        Err(e) => return Err(Error::parse(path, e)),
    };
    match parsed {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(Error::malformed_cache(path)),
    }
}

/// Serialize and write a full bucket mapping, atomically
///
/// # Errors
///
/// Returns [`Error::Serialization`] if encoding fails, or an I/O error from
/// the atomic write.
pub fn write_bucket(path: &Path, entries: &BucketMap) -> Result<()> {
    let json = serde_json::to_vec(entries)
        .map_err(|e| Error::serialization(format!("failed to serialize bucket: {e}")))?;
    write_atomic(path, &json)
}

/// Write bytes so a reader never observes a partial file
///
/// Writes to a sibling temporary path, syncs, then renames over the target.
///
/// # Errors
///
/// Returns an I/O error if any step fails.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    let mut file =
        fs::File::create(&tmp_path).map_err(|e| Error::io(e, &tmp_path, "create"))?;
    file.write_all(data)
        .map_err(|e| Error::io(e, &tmp_path, "write"))?;
    file.sync_all()
        .map_err(|e| Error::io(e, &tmp_path, "sync"))?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(|e| Error::io(e, path, "rename"))?;
    Ok(())
}
