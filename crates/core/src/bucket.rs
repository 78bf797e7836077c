//! Bucket naming and path construction
//!
//! A bucket is the cache partition for one function at one stub (time-bucket
//! label, `YYYYMMDD` by default). Each bucket maps to exactly one file:
//!
//! ```text
//! {cache_dir}/{function_tag}[_{key_fragment}]_{stub}.{ext}
//! ```
//!
//! The function tag is sanitized down to `[A-Za-z0-9_-]`, which keeps names
//! filesystem-safe and guarantees the history glob's single wildcard can only
//! ever match the stub segment.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Date format used for default stubs
pub const STUB_FORMAT: &str = "%Y%m%d";

/// A time-bucket label
///
/// Defaults to today's date as `YYYYMMDD`. Arbitrary labels are accepted for
/// pinned buckets, but only 8-digit date labels participate in historical
/// search (see [`crate::history`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stub(String);

impl Stub {
    /// Today's date, in local time
    #[must_use]
    pub fn today() -> Self {
        Self::from_date(chrono::Local::now().date_naive())
    }

    /// A stub for a specific date
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(STUB_FORMAT).to_string())
    }

    /// An arbitrary stub label
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The label text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Stub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strip every character that is not an ASCII letter, digit, underscore, or
/// hyphen
#[must_use]
pub fn sanitize_tag(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

fn file_name(tag: &str, fragment: Option<&str>, stub: &str, ext: &str) -> String {
    match fragment {
        Some(frag) => format!("{tag}_{frag}_{stub}.{ext}"),
        None => format!("{tag}_{stub}.{ext}"),
    }
}

/// The concrete bucket file path for one function/stub
#[must_use]
pub fn bucket_path(
    dir: &Path,
    tag: &str,
    fragment: Option<&str>,
    stub: &Stub,
    ext: &str,
) -> PathBuf {
    dir.join(file_name(tag, fragment, stub.as_str(), ext))
}

/// A glob pattern matching every bucket ever written for this function
///
/// Exactly one wildcard segment stands in for the stub.
#[must_use]
pub fn bucket_glob(dir: &Path, tag: &str, fragment: Option<&str>, ext: &str) -> String {
    dir.join(file_name(tag, fragment, "*", ext))
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_everything_unsafe() {
        assert_eq!(sanitize_tag("fetch_rates"), "fetch_rates");
        assert_eq!(sanitize_tag("<lambda>"), "lambda");
        assert_eq!(sanitize_tag("mod.fn/weird *name"), "modfnweirdname");
        assert_eq!(sanitize_tag("keep-me_2"), "keep-me_2");
    }

    #[test]
    fn path_without_fragment() {
        let p = bucket_path(
            Path::new("/tmp/cache"),
            "fetch",
            None,
            &Stub::new("20240102"),
            "json",
        );
        assert_eq!(p, PathBuf::from("/tmp/cache/fetch_20240102.json"));
    }

    #[test]
    fn path_with_fragment() {
        let p = bucket_path(
            Path::new("/tmp/cache"),
            "fetch",
            Some("abc1234"),
            &Stub::new("20240102"),
            "csv",
        );
        assert_eq!(p, PathBuf::from("/tmp/cache/fetch_abc1234_20240102.csv"));
    }

    #[test]
    fn glob_has_exactly_one_wildcard() {
        let g = bucket_glob(Path::new("/tmp/cache"), "fetch", None, "json");
        assert_eq!(g, "/tmp/cache/fetch_*.json");
        assert_eq!(g.matches('*').count(), 1);

        let g = bucket_glob(Path::new("/tmp/cache"), "fetch", Some("abc1234"), "csv");
        assert_eq!(g, "/tmp/cache/fetch_abc1234_*.csv");
        assert_eq!(g.matches('*').count(), 1);
    }

    #[test]
    fn sanitized_tag_cannot_contain_wildcard() {
        assert_eq!(sanitize_tag("evil*glob?[a]"), "evilgloba");
    }

    #[test]
    fn stub_from_date_formats_as_yyyymmdd() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(Stub::from_date(d).as_str(), "20240102");
    }
}
