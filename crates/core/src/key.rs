//! Cache key derivation
//!
//! A cache key identifies one logical call: the function's name plus the
//! exact positional and keyword argument values. Keys are the lowercase hex
//! SHA-256 of a canonical JSON record, so equal calls always map to the same
//! key regardless of keyword insertion order, across processes and restarts.
//!
//! Two textual renderings exist and are fixed per bucket layout:
//! - dictionary layout stores the self-describing `{func_name}#{hex}` form,
//!   which keeps shared bucket files greppable by function;
//! - the single-value layout embeds a bare truncated digest in the file name
//!   (see [`derive_fragment`]), where the function tag already disambiguates.

use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Reserved record field carrying the function name
const FUNC_NAME_FIELD: &str = "_func_name";
/// Reserved record field carrying the positional arguments
const ARGS_FIELD: &str = "_args";

/// The arguments of one logical call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    /// Positional arguments, in call order
    pub args: Vec<Value>,
    /// Keyword arguments; ordering is irrelevant to the derived key
    pub kwargs: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Create an empty argument set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    #[must_use]
    pub fn positional(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append a positional argument converted from any serializable value
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedArgument`] if the value cannot be
    /// canonically serialized.
    pub fn try_positional<T: Serialize>(mut self, value: &T) -> Result<Self> {
        self.args.push(try_value(value)?);
        Ok(self)
    }

    /// Set a keyword argument
    #[must_use]
    pub fn keyword(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Set a keyword argument converted from any serializable value
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedArgument`] if the value cannot be
    /// canonically serialized.
    pub fn try_keyword<T: Serialize>(
        mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        self.kwargs.insert(name.into(), try_value(value)?);
        Ok(self)
    }
}

/// Convert a serializable value into its canonical JSON form
///
/// Tuple-like inputs become ordered sequences; a cached result read back
/// from disk keeps the sequence form, not the original tuple type.
///
/// # Errors
///
/// Returns [`Error::UnsupportedArgument`] when serialization fails (opaque
/// objects, maps with non-string keys, failing `Serialize` impls).
pub fn try_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::unsupported_argument(e.to_string()))
}

/// Convert a float argument, rejecting non-finite values
///
/// `serde_json::Value` cannot represent NaN or infinities; converting them
/// through serde would silently degrade to `null` and produce a degenerate
/// key, so they are rejected here instead.
///
/// # Errors
///
/// Returns [`Error::UnsupportedArgument`] for NaN and infinite values.
pub fn float(value: f64) -> Result<Value> {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| Error::unsupported_argument(format!("non-finite float {value}")))
}

/// A derived cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// The key text as stored in bucket files
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// Derive the dictionary-layout cache key for one call
///
/// # Errors
///
/// Returns [`Error::UnsupportedArgument`] if a keyword argument uses one of
/// the reserved record field names, or [`Error::Serialization`] if the
/// canonical record cannot be encoded.
pub fn derive(func_name: &str, call: &CallArgs) -> Result<CacheKey> {
    let digest = digest_hex(func_name, call)?;
    Ok(CacheKey(format!("{func_name}#{digest}")))
}

/// Derive a bare digest truncated to `len` hex characters
///
/// Used by the single-value layout to embed a short key fragment in the
/// bucket file name. Truncation raises the collision risk accordingly; it is
/// acceptable only because the file name also carries the function tag.
///
/// # Errors
///
/// Same failure modes as [`derive`].
pub fn derive_fragment(func_name: &str, call: &CallArgs, len: usize) -> Result<String> {
    let mut digest = digest_hex(func_name, call)?;
    digest.truncate(len.min(digest.len()));
    Ok(digest)
}

/// SHA-256 over the canonical JSON record, rendered as lowercase hex
fn digest_hex(func_name: &str, call: &CallArgs) -> Result<String> {
    // BTreeMap gives lexicographic key order, so equal records always
    // serialize to byte-identical text.
    let mut record = call.kwargs.clone();
    for reserved in [FUNC_NAME_FIELD, ARGS_FIELD] {
        if record.contains_key(reserved) {
            return Err(Error::unsupported_argument(format!(
                "keyword argument name '{reserved}' is reserved"
            )));
        }
    }
    record.insert(FUNC_NAME_FIELD.to_string(), Value::String(func_name.to_string()));
    record.insert(ARGS_FIELD.to_string(), Value::Array(call.args.clone()));

    let bytes = serde_json::to_vec(&record)
        .map_err(|e| Error::serialization(format!("failed to encode key record: {e}")))?;
    Ok(hex::encode(Sha256::digest(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_is_deterministic() {
        let call = CallArgs::new().positional(2.0).keyword("flag", true);
        let k1 = derive("fetch", &call).unwrap();
        let k2 = derive("fetch", &call).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn key_is_keyword_order_independent() {
        let a = CallArgs::new().keyword("x", 1).keyword("y", 2);
        let b = CallArgs::new().keyword("y", 2).keyword("x", 1);
        assert_eq!(derive("f", &a).unwrap(), derive("f", &b).unwrap());
    }

    #[test]
    fn key_is_argument_sensitive() {
        let a = CallArgs::new().positional(1);
        let b = CallArgs::new().positional(2);
        assert_ne!(derive("f", &a).unwrap(), derive("f", &b).unwrap());
    }

    #[test]
    fn key_is_function_sensitive() {
        let call = CallArgs::new().positional(1);
        assert_ne!(derive("f", &call).unwrap(), derive("g", &call).unwrap());
    }

    #[test]
    fn key_carries_function_prefix() {
        let key = derive("fetch_rates", &CallArgs::new()).unwrap();
        assert!(key.as_str().starts_with("fetch_rates#"));
        // prefix + '#' + 64 hex chars
        assert_eq!(key.as_str().len(), "fetch_rates#".len() + 64);
    }

    #[test]
    fn fragment_is_truncated_prefix_of_digest() {
        let call = CallArgs::new().positional("a");
        let frag = derive_fragment("f", &call, 7).unwrap();
        assert_eq!(frag.len(), 7);
        let key = derive("f", &call).unwrap();
        assert!(key.as_str().ends_with(&derive_fragment("f", &call, 64).unwrap()));
        assert!(key.as_str().contains(&frag));
    }

    #[test]
    fn positional_order_matters() {
        let a = CallArgs::new().positional(1).positional(2);
        let b = CallArgs::new().positional(2).positional(1);
        assert_ne!(derive("f", &a).unwrap(), derive("f", &b).unwrap());
    }

    #[test]
    fn reserved_keyword_names_are_rejected() {
        let call = CallArgs::new().keyword("_func_name", "evil");
        let err = derive("f", &call).unwrap_err();
        assert!(matches!(err, Error::UnsupportedArgument { .. }));
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        assert!(matches!(
            float(f64::NAN).unwrap_err(),
            Error::UnsupportedArgument { .. }
        ));
        assert!(matches!(
            float(f64::INFINITY).unwrap_err(),
            Error::UnsupportedArgument { .. }
        ));
        assert_eq!(float(2.5).unwrap(), json!(2.5));
    }

    #[test]
    fn try_value_accepts_nested_structures() {
        let v = try_value(&json!({"a": [1, 2, {"b": null}]})).unwrap();
        assert!(v.is_object());
    }
}
