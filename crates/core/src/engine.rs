//! Memoization engine
//!
//! [`MemoizingInvocable`] wraps any [`Invocable`] and serves repeat calls
//! from date-bucketed files instead of recomputing. Per call it runs:
//! compute key, search history (most recent first, first occurrence wins),
//! return on hit (copying the accumulated mapping forward into today's
//! bucket when the hit came from an older one), otherwise invoke the inner
//! computation and write through.
//!
//! Concurrent callers are not serialized: two simultaneous misses for the
//! same key may both compute and both write, and the later write wins at the
//! file level. Multi-writer deployments should treat that as the contract.

use crate::bucket::{self, Stub};
use crate::config::{self, CacheConfig};
use crate::history;
use crate::key::{self, CacheKey, CallArgs};
use crate::Result;
use crate::store::{self, BucketMap};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Reserved keyword argument forcing a bypass of history search
///
/// When present and truthy the engine recomputes unconditionally. The flag
/// is stripped before key derivation and never forwarded to the wrapped
/// computation.
pub const FORCE_REFRESH_KWARG: &str = "_force_refresh";

/// A zero-knowledge callable the engine can wrap
///
/// Synchronous computations adapt through [`FnInvocable`]; asynchronous ones
/// implement the trait directly. Either way the engine awaits exactly one
/// suspension point on the miss path.
#[async_trait]
pub trait Invocable: Send + Sync {
    /// Run the computation for one set of arguments
    async fn call(&self, call: &CallArgs) -> Result<Value>;
}

/// Adapter turning a plain closure into an [`Invocable`]
pub struct FnInvocable<F> {
    func: F,
}

impl<F> FnInvocable<F>
where
    F: Fn(&CallArgs) -> Result<Value> + Send + Sync,
{
    /// Wrap a synchronous closure
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> Invocable for FnInvocable<F>
where
    F: Fn(&CallArgs) -> Result<Value> + Send + Sync,
{
    async fn call(&self, call: &CallArgs) -> Result<Value> {
        (self.func)(call)
    }
}

/// Split the reserved refresh flag out of a call's keyword arguments
///
/// Returns the cleaned arguments (used for both key derivation and the
/// inner call) and whether the flag was present and truthy.
#[must_use]
pub fn split_force_refresh(call: &CallArgs) -> (CallArgs, bool) {
    let mut cleaned = call.clone();
    let force = cleaned
        .kwargs
        .remove(FORCE_REFRESH_KWARG)
        .is_some_and(|v| truthy(&v));
    (cleaned, force)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// A memoizing wrapper around an [`Invocable`]
///
/// Implements the same call contract as the computation it wraps.
pub struct MemoizingInvocable {
    inner: Arc<dyn Invocable>,
    config: CacheConfig,
    func_name: String,
    bucket_path: PathBuf,
    bucket_glob: String,
}

impl fmt::Debug for MemoizingInvocable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoizingInvocable")
            .field("func_name", &self.func_name)
            .field("bucket_path", &self.bucket_path)
            .field("bucket_glob", &self.bucket_glob)
            .finish_non_exhaustive()
    }
}

/// Wrap `inner` with dictionary-layout memoization
///
/// The cache directory is created on demand; today's bucket path and the
/// history glob are fixed here for the wrapper's lifetime.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidCacheDir`] if the configured path exists
/// and is not a directory, or an I/O error if it cannot be created.
pub fn memoize(
    config: CacheConfig,
    func_name: impl Into<String>,
    inner: Arc<dyn Invocable>,
) -> Result<MemoizingInvocable> {
    config::ensure_cache_dir(&config.cache_dir)?;

    let func_name = func_name.into();
    let tag = bucket::sanitize_tag(&func_name);
    let stub = config.stub.clone().unwrap_or_else(Stub::today);
    let bucket_path = bucket::bucket_path(&config.cache_dir, &tag, None, &stub, &config.ext);
    let bucket_glob = bucket::bucket_glob(&config.cache_dir, &tag, None, &config.ext);

    config.logger.log(&format!(
        "using bucket {} for results of {tag}",
        bucket_path.display()
    ));
    tracing::debug!(
        func = %tag,
        bucket = %bucket_path.display(),
        lifetime = ?config.lifetime,
        "memoizing wrapper created"
    );

    Ok(MemoizingInvocable {
        inner,
        config,
        func_name,
        bucket_path,
        bucket_glob,
    })
}

impl MemoizingInvocable {
    /// Today's bucket file for this wrapper
    #[must_use]
    pub fn bucket_path(&self) -> &std::path::Path {
        &self.bucket_path
    }

    /// The wrapped function's identity as used in keys
    #[must_use]
    pub fn func_name(&self) -> &str {
        &self.func_name
    }

    /// Derive the cache key this wrapper would use for `call`
    ///
    /// # Errors
    ///
    /// Same failure modes as [`key::derive`].
    pub fn derive_key(&self, call: &CallArgs) -> Result<CacheKey> {
        let (cleaned, _) = split_force_refresh(call);
        key::derive(&self.func_name, &cleaned)
    }

    /// Search history for `cache_key`, accumulating entries first-wins
    ///
    /// On a hit the accumulated mapping is copied forward into today's
    /// bucket when the source file is an older one, so future lookups for
    /// any key known as of now skip the scan. Skipping the copy would be
    /// harmless; doing it only changes later I/O cost.
    fn search_history(&self, cache_key: &CacheKey) -> Result<Option<Value>> {
        let mut seen = BucketMap::new();
        for found in history::resolve(&self.bucket_glob, self.config.lifetime)? {
            let entries = store::read_bucket(&found.path, self.config.ignore_invalid)?;
            for (k, v) in entries {
                seen.entry(k).or_insert(v);
            }
            if let Some(value) = seen.get(cache_key.as_str()) {
                self.config.logger.log(&format!(
                    "using cached call from {} with key {cache_key}",
                    found.path.display()
                ));
                tracing::debug!(
                    key = %cache_key,
                    source = %found.path.display(),
                    "cache hit"
                );
                if found.path != self.bucket_path {
                    store::write_bucket(&self.bucket_path, &seen)?;
                }
                return Ok(Some(value.clone()));
            }
        }
        Ok(None)
    }

    /// Merge the fresh result into today's bucket and persist it
    fn persist(&self, cache_key: &CacheKey, result: &Value) -> Result<()> {
        let mut entries = if self.bucket_path.exists() {
            store::read_bucket(&self.bucket_path, self.config.ignore_invalid)?
        } else {
            BucketMap::new()
        };
        entries.insert(cache_key.as_str().to_string(), result.clone());
        store::write_bucket(&self.bucket_path, &entries)
    }
}

#[async_trait]
impl Invocable for MemoizingInvocable {
    async fn call(&self, call: &CallArgs) -> Result<Value> {
        let (call, force_refresh) = split_force_refresh(call);
        let cache_key = key::derive(&self.func_name, &call)?;

        if !force_refresh {
            if let Some(value) = self.search_history(&cache_key)? {
                return Ok(value);
            }
        }

        tracing::debug!(key = %cache_key, force_refresh, "cache miss; invoking");
        let result = self.inner.call(&call).await?;

        // Persistence happens strictly after the await returns; a cancelled
        // inner call writes nothing.
        self.persist(&cache_key, &result)?;
        Ok(result)
    }
}
