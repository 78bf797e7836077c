//! Date-bucketed function-result caching for recache
//!
//! This crate wraps an arbitrary computation and persists its return value
//! to disk, keyed by function identity and arguments and partitioned by a
//! time-bucket stub (today's date by default). Repeat calls are served from
//! the newest eligible bucket file instead of recomputing.
//!
//! # Overview
//!
//! - [`key`] — deterministic cache keys from canonical argument records
//! - [`bucket`] — tag sanitization, stubs, bucket paths and history globs
//! - [`history`] — discovery and recency ordering of historical buckets
//! - [`store`] — dictionary-layout bucket files, written atomically
//! - [`engine`] — the memoizing wrapper orchestrating the above
//!
//! # Example
//!
//! ```no_run
//! use recache_core::{memoize, CacheConfig, CallArgs, FnInvocable, Invocable};
//! use std::sync::Arc;
//!
//! # async fn demo() -> recache_core::Result<()> {
//! let inner = Arc::new(FnInvocable::new(|call: &CallArgs| {
//!     let n = call.args[0].as_i64().unwrap_or_default();
//!     Ok(serde_json::json!(n * n))
//! }));
//! let wrapped = memoize(CacheConfig::new("/tmp/recache"), "square", inner)?;
//!
//! let call = CallArgs::new().positional(7);
//! let first = wrapped.call(&call).await?;  // computes and persists
//! let second = wrapped.call(&call).await?; // served from the bucket file
//! assert_eq!(first, second);
//! # Ok(())
//! # }
//! ```

pub mod bucket;
pub mod codec;
pub mod config;
pub mod engine;
mod error;
pub mod history;
pub mod key;
pub mod logger;
pub mod store;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export main types
pub use bucket::{Stub, bucket_glob, bucket_path, sanitize_tag};
pub use codec::{Codec, JsonCodec};
pub use config::{CacheConfig, default_cache_dir, ensure_cache_dir};
pub use engine::{
    FORCE_REFRESH_KWARG, FnInvocable, Invocable, MemoizingInvocable, memoize,
    split_force_refresh,
};
pub use history::{HistoricalBucket, Lifetime, resolve};
pub use key::{CacheKey, CallArgs, derive, derive_fragment};
pub use logger::{Logger, NullLogger, StdoutLogger};
pub use store::{BucketMap, read_bucket, write_atomic, write_bucket};
