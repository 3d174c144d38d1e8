//! # Seere FSST
//!
//! FSST (Fast Static Symbol Table) string compression.
//!
//! FSST learns up to 255 symbols of 1-8 bytes from sample data and encodes
//! input by replacing symbol occurrences with one-byte codes; bytes no
//! symbol covers are escaped as two bytes. It is built for short,
//! repetitive text - JSON, logs, CSV, URLs - where it decompresses at
//! GB/s rates with a model of at most a couple of kilobytes.
//!
//! ## Features
//!
//! - **Trained model**: deterministic training, byte-identical tables for
//!   identical inputs
//! - **Random access friendly**: every code is one byte, no framing, no
//!   cross-chunk state
//! - **Robust decoding**: the decoder accepts arbitrary bytes without
//!   failing
//! - **Compact serialization**: tables round-trip through a stable binary
//!   format
//!
//! ## Example
//!
//! ```
//! use seere_fsst::{train, Table};
//!
//! let samples: Vec<&[u8]> = vec![b"hello world", b"hello there"];
//! let table = train(&samples);
//!
//! let compressed = table.encode(b"hello world");
//! assert_eq!(table.decode(&compressed), b"hello world");
//!
//! // Persist the model and restore it later.
//! let bytes = table.to_bytes();
//! let restored = Table::from_bytes(&bytes).unwrap();
//! assert_eq!(restored.encode(b"hello world"), compressed);
//! ```

pub mod codec;
pub mod table;
pub mod train;

mod counters;
mod decoder;
mod encoder;
mod symbol;

pub use codec::FsstCodec;
pub use table::Table;
pub use train::train;

/// The escape byte: in compressed output, 255 means the next byte is a
/// literal.
pub const ESCAPE_CODE: u8 = symbol::ESCAPE_CODE;
