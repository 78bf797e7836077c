//! Single-value-layout frame cache
//!
//! Unlike the dictionary layout, every argument combination gets its own
//! bucket file per stub: a short key fragment derived from the arguments is
//! embedded in the file name, and the whole file holds exactly one encoded
//! frame. The most recent eligible historical file *is* the hit; there is
//! no backfill, because each stub's file is already complete.

use crate::codec::codec_for;
use crate::frame::Frame;
use async_trait::async_trait;
use recache_core::{
    CacheConfig, CallArgs, Codec, Error, Invocable, Result, Stub, bucket, ensure_cache_dir,
    history, key, split_force_refresh, store,
};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::sync::Arc;

/// Hex characters of the key fragment embedded in file names
///
/// Truncation is safe here because the file name also carries the function
/// tag; see [`key::derive_fragment`].
pub const KEY_FRAGMENT_LEN: usize = 7;

/// A memoizing wrapper that persists one frame per argument combination
pub struct FrameCache {
    inner: Arc<dyn Invocable>,
    config: CacheConfig,
    func_name: String,
    tag: String,
    codec: Box<dyn Codec<Value = Frame>>,
}

/// Wrap `inner` with single-value frame memoization
///
/// The codec is selected from `config.ext` before any file is touched.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for an unknown extension,
/// [`Error::InvalidCacheDir`] if the cache path exists and is not a
/// directory, or an I/O error if the directory cannot be created.
pub fn memoize_frame(
    config: CacheConfig,
    func_name: impl Into<String>,
    inner: Arc<dyn Invocable>,
) -> Result<FrameCache> {
    let codec = codec_for(&config.ext)?;
    ensure_cache_dir(&config.cache_dir)?;

    let func_name = func_name.into();
    let tag = bucket::sanitize_tag(&func_name);
    tracing::debug!(func = %tag, ext = %config.ext, "frame cache created");

    Ok(FrameCache {
        inner,
        config,
        func_name,
        tag,
        codec,
    })
}

impl fmt::Debug for FrameCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCache")
            .field("func_name", &self.func_name)
            .field("tag", &self.tag)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl FrameCache {
    /// The wrapped function's identity as used in keys
    #[must_use]
    pub fn func_name(&self) -> &str {
        &self.func_name
    }

    /// Run one call through the cache, returning the typed frame
    ///
    /// # Errors
    ///
    /// Propagates key-derivation, codec, and I/O failures, and returns
    /// [`Error::ResultType`] if the inner computation's result is not
    /// frame-shaped (nothing is persisted in that case).
    pub async fn call_frame(&self, call: &CallArgs) -> Result<Frame> {
        let (call, force_refresh) = split_force_refresh(call);
        let fragment = key::derive_fragment(&self.func_name, &call, KEY_FRAGMENT_LEN)?;
        let stub = self.config.stub.clone().unwrap_or_else(Stub::today);
        let path = bucket::bucket_path(
            &self.config.cache_dir,
            &self.tag,
            Some(&fragment),
            &stub,
            &self.config.ext,
        );
        self.config.logger.log(&format!(
            "using bucket {} for results of {}",
            path.display(),
            self.tag
        ));

        if !force_refresh {
            let pattern = bucket::bucket_glob(
                &self.config.cache_dir,
                &self.tag,
                Some(&fragment),
                &self.config.ext,
            );
            if let Some(found) = history::resolve(&pattern, self.config.lifetime)?.first() {
                self.config.logger.log(&format!(
                    "using cached call from {}",
                    found.path.display()
                ));
                tracing::debug!(
                    fragment = %fragment,
                    source = %found.path.display(),
                    "frame cache hit"
                );
                let bytes =
                    fs::read(&found.path).map_err(|e| Error::io(e, &found.path, "read"))?;
                return self.codec.decode(&bytes);
            }
        }

        tracing::debug!(fragment = %fragment, force_refresh, "frame cache miss; invoking");
        let result = self.inner.call(&call).await?;

        // Shape validation precedes the write; a mismatch persists nothing.
        let frame = Frame::from_value(result)?;
        let bytes = self.codec.encode(&frame)?;
        store::write_atomic(&path, &bytes)?;
        Ok(frame)
    }
}

#[async_trait]
impl Invocable for FrameCache {
    async fn call(&self, call: &CallArgs) -> Result<Value> {
        let frame = self.call_frame(call).await?;
        serde_json::to_value(frame)
            .map_err(|e| Error::serialization(format!("failed to encode frame: {e}")))
    }
}
