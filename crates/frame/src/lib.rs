//! Tabular single-value cache adapter for recache
//!
//! Wraps computations that produce small tables and persists each result as
//! one file per argument combination per stub, in either a row-oriented
//! text format (`csv`) or a columnar binary format (`bin`), selected by the
//! configured file extension.
//!
//! The core protocol (key derivation, bucket naming, historical search)
//! comes from `recache-core`; this crate adds the [`Frame`] type, the two
//! codecs, and the single-value engine variant.

mod cache;
mod codec;
mod frame;

// Re-export main types
pub use cache::{FrameCache, KEY_FRAGMENT_LEN, memoize_frame};
pub use codec::{BIN_EXT, BinCodec, CSV_EXT, CsvCodec, codec_for};
pub use frame::Frame;
