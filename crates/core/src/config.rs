//! Cache configuration
//!
//! All engine state comes in through an explicit [`CacheConfig`]; there is
//! no process-wide default directory or other implicit global.

use crate::bucket::Stub;
use crate::history::Lifetime;
use crate::logger::{Logger, StdoutLogger};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable overriding the default cache root
pub const CACHE_DIR_ENV: &str = "RECACHE_CACHE_DIR";

/// Configuration for a memoizing wrapper
#[derive(Clone)]
pub struct CacheConfig {
    /// Directory holding bucket files; created on demand at wrap time
    pub cache_dir: PathBuf,
    /// Bucket label override; today's date when unset.
    ///
    /// Non-date labels still write through, but are excluded from historical
    /// search, which only recognizes 8-digit date stubs.
    pub stub: Option<Stub>,
    /// Bucket file extension (`json` for the dictionary layout)
    pub ext: String,
    /// How far back historical search may reach
    pub lifetime: Lifetime,
    /// Treat syntactically invalid bucket files as empty instead of failing
    pub ignore_invalid: bool,
    /// Progress sink; stdout by default
    pub logger: Arc<dyn Logger>,
}

impl CacheConfig {
    /// A configuration rooted at `cache_dir` with default settings
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir()
                .unwrap_or_else(|_| std::env::temp_dir().join("recache")),
            stub: None,
            ext: "json".to_string(),
            lifetime: Lifetime::default(),
            ignore_invalid: true,
            logger: Arc::new(StdoutLogger),
        }
    }
}

impl std::fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheConfig")
            .field("cache_dir", &self.cache_dir)
            .field("stub", &self.stub)
            .field("ext", &self.ext)
            .field("lifetime", &self.lifetime)
            .field("ignore_invalid", &self.ignore_invalid)
            .finish_non_exhaustive()
    }
}

/// Ensure the cache directory exists, creating it if necessary
///
/// # Errors
///
/// Returns [`Error::InvalidCacheDir`] if the path exists and is not a
/// directory, or an I/O error if creation fails.
pub fn ensure_cache_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(Error::invalid_cache_dir(dir));
        }
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|e| Error::io(e, dir, "create_dir_all"))
}

/// Inputs for determining the default cache root
#[derive(Debug, Clone)]
struct RootInputs {
    env_override: Option<PathBuf>,
    xdg_cache_home: Option<PathBuf>,
    os_cache_dir: Option<PathBuf>,
    temp_dir: PathBuf,
}

/// Resolve a usable default cache root
///
/// Resolution order (first usable wins): `RECACHE_CACHE_DIR`, then
/// `$XDG_CACHE_HOME/recache`, then the OS cache directory, then a temp-dir
/// fallback.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if no candidate can be created.
pub fn default_cache_dir() -> Result<PathBuf> {
    let inputs = RootInputs {
        env_override: std::env::var(CACHE_DIR_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from),
        xdg_cache_home: std::env::var("XDG_CACHE_HOME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from),
        os_cache_dir: dirs::cache_dir(),
        temp_dir: std::env::temp_dir(),
    };
    root_from_inputs(&inputs)
}

fn root_from_inputs(inputs: &RootInputs) -> Result<PathBuf> {
    let candidates = [
        inputs.env_override.clone(),
        inputs.xdg_cache_home.as_ref().map(|p| p.join("recache")),
        inputs.os_cache_dir.as_ref().map(|p| p.join("recache")),
        Some(inputs.temp_dir.join("recache")),
    ];
    for candidate in candidates.into_iter().flatten() {
        if ensure_cache_dir(&candidate).is_ok() {
            return Ok(candidate);
        }
    }
    Err(Error::configuration(
        "failed to determine a writable cache directory",
    ))
}
