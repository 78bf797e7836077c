//! Historical bucket discovery
//!
//! Expands a bucket glob against the filesystem, re-derives the stub from
//! each candidate file name, parses it as a date, and returns the surviving
//! candidates most recent first. Dates live in file names rather than file
//! metadata: modification times drift when files are copied, backed up, or
//! touched, so they are never consulted.

use crate::bucket::STUB_FORMAT;
use crate::{Error, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Maximum age of a historical bucket eligible for a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Any bucket, regardless of age
    Unbounded,
    /// Buckets at most this many days old (inclusive)
    Days(u32),
}

impl Lifetime {
    /// Build from a signed day count; negative values mean unbounded
    #[must_use]
    pub fn from_days(days: i64) -> Self {
        u32::try_from(days).map_or(Self::Unbounded, Self::Days)
    }

    fn permits(self, age_days: i64) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Days(n) => age_days <= i64::from(n),
        }
    }
}

impl Default for Lifetime {
    /// Today's bucket only, matching the engine's conservative default
    fn default() -> Self {
        Self::Days(0)
    }
}

/// One discovered bucket file and its parsed date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalBucket {
    /// Path of the bucket file
    pub path: PathBuf,
    /// Date parsed from the file name's stub segment
    pub date: NaiveDate,
}

/// Find bucket files matching `pattern` within `lifetime`, most recent first
///
/// Candidates whose stub segment is not an 8-digit valid date are silently
/// skipped; they are not an error. "Today" is evaluated once per call.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the glob pattern itself is invalid.
/// Unreadable directory entries are skipped, not surfaced.
pub fn resolve(pattern: &str, lifetime: Lifetime) -> Result<Vec<HistoricalBucket>> {
    resolve_as_of(pattern, lifetime, chrono::Local::now().date_naive())
}

/// [`resolve`] with an explicit "today", for deterministic tests
pub fn resolve_as_of(
    pattern: &str,
    lifetime: Lifetime,
    today: NaiveDate,
) -> Result<Vec<HistoricalBucket>> {
    let (prefix, suffix) = split_wildcard(pattern)?;

    let mut found = Vec::new();
    let paths = glob::glob(pattern)
        .map_err(|e| Error::configuration(format!("invalid bucket glob '{pattern}': {e}")))?;
    for entry in paths {
        let Ok(path) = entry else { continue };
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(stub) = name
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_suffix(suffix.as_str()))
        else {
            continue;
        };
        // Same shape the wildcard stands in for: exactly eight digits.
        if stub.len() != 8 || !stub.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let Ok(date) = NaiveDate::parse_from_str(stub, STUB_FORMAT) else {
            continue;
        };
        found.push(HistoricalBucket { path, date });
    }

    // Stable sort keeps enumeration order for (theoretical) date ties.
    found.sort_by(|a, b| b.date.cmp(&a.date));
    found.retain(|bucket| lifetime.permits((today - bucket.date).num_days()));
    Ok(found)
}

/// Split the pattern's file-name component around its single `*`
fn split_wildcard(pattern: &str) -> Result<(String, String)> {
    let name = Path::new(pattern)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Error::configuration(format!("bucket glob '{pattern}' has no file name"))
        })?;
    let mut parts = name.split('*');
    let prefix = parts.next().unwrap_or_default();
    let Some(suffix) = parts.next() else {
        return Err(Error::configuration(format!(
            "bucket glob '{pattern}' contains no wildcard"
        )));
    };
    if parts.next().is_some() {
        return Err(Error::configuration(format!(
            "bucket glob '{pattern}' contains more than one wildcard"
        )));
    }
    Ok((prefix.to_string(), suffix.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"{}").unwrap();
    }

    fn pattern(dir: &Path) -> String {
        dir.join("fetch_*.json").to_string_lossy().into_owned()
    }

    #[test]
    fn orders_most_recent_first() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "fetch_20240101.json");
        touch(tmp.path(), "fetch_20240301.json");
        touch(tmp.path(), "fetch_20240201.json");

        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let found = resolve_as_of(&pattern(tmp.path()), Lifetime::Unbounded, today).unwrap();
        let dates: Vec<String> = found.iter().map(|b| b.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-02-01", "2024-01-01"]);
    }

    #[test]
    fn skips_non_date_stubs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "fetch_20240101.json");
        touch(tmp.path(), "fetch_notadate.json");
        touch(tmp.path(), "fetch_2024010.json");
        touch(tmp.path(), "fetch_20241301.json"); // month 13

        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let found = resolve_as_of(&pattern(tmp.path()), Lifetime::Unbounded, today).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].path.ends_with("fetch_20240101.json"));
    }

    #[test]
    fn lifetime_window_is_inclusive() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "fetch_20240110.json"); // 5 days old
        touch(tmp.path(), "fetch_20240112.json"); // 3 days old
        touch(tmp.path(), "fetch_20240115.json"); // today

        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        let found = resolve_as_of(&pattern(tmp.path()), Lifetime::Days(3), today).unwrap();
        assert_eq!(found.len(), 2);

        let found = resolve_as_of(&pattern(tmp.path()), Lifetime::Days(5), today).unwrap();
        assert_eq!(found.len(), 3);

        let found = resolve_as_of(&pattern(tmp.path()), Lifetime::Days(0), today).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn negative_sentinel_means_unbounded() {
        assert_eq!(Lifetime::from_days(-1), Lifetime::Unbounded);
        assert_eq!(Lifetime::from_days(0), Lifetime::Days(0));
        assert_eq!(Lifetime::from_days(7), Lifetime::Days(7));
    }

    #[test]
    fn unrelated_files_do_not_match() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "fetch_20240101.json");
        touch(tmp.path(), "other_20240101.json");
        touch(tmp.path(), "fetch_20240101.csv");

        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let found = resolve_as_of(&pattern(tmp.path()), Lifetime::Unbounded, today).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn empty_directory_resolves_to_nothing() {
        let tmp = TempDir::new().unwrap();
        let found = resolve(&pattern(tmp.path()), Lifetime::Unbounded).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn rejects_wildcard_free_patterns() {
        assert!(resolve("/tmp/no-wildcard.json", Lifetime::Unbounded).is_err());
    }
}
