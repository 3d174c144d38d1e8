//! # Seere Core
//!
//! Core traits, types, and error handling for the Seere compression library.
//!
//! Seere is named after the 70th demon of the Ars Goetia, who can traverse
//! the earth in an instant - just as this library aims to move data through
//! its codecs at memory speed.
//!
//! ## Core Traits
//!
//! - [`Compressor`] - One-shot compression operations
//! - [`Decompressor`] - One-shot decompression operations
//! - [`Codec`] - Combined compress/decompress capability
//!
//! ## Example
//!
//! ```ignore
//! use seere_core::{Codec, Compressor, Decompressor};
//! use seere_fsst::FsstCodec;
//!
//! let codec = FsstCodec::train(&samples);
//! let compressed = codec.compress(data)?;
//! let original = codec.decompress(&compressed)?;
//! ```

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{Codec, Compressor, Decompressor};
pub use types::CompressionRatio;
