//! FSST codec (combined compressor + decompressor).

use seere_core::{Codec, Compressor, Decompressor, Result};

use crate::encoder::OUTPUT_PADDING;
use crate::table::Table;
use crate::train::train;

/// FSST codec wrapping a trained symbol table.
///
/// Unlike general-purpose codecs, FSST must be trained on representative
/// samples before it compresses anything well; an untrained codec still
/// works but escapes every byte (2x expansion).
#[derive(Debug, Clone)]
pub struct FsstCodec {
    table: Table,
}

impl FsstCodec {
    /// Create an untrained codec. Every input byte is escaped until a
    /// trained table replaces it; mostly useful as a placeholder.
    pub fn new() -> Self {
        FsstCodec {
            table: train::<&[u8]>(&[]),
        }
    }

    /// Train a codec on sample data.
    pub fn train<T: AsRef<[u8]>>(samples: &[T]) -> Self {
        FsstCodec {
            table: train(samples),
        }
    }

    /// Wrap an existing trained table.
    pub fn from_table(table: Table) -> Self {
        FsstCodec { table }
    }

    /// Access the underlying symbol table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Serialize the symbol table for storage alongside the compressed
    /// data.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.table.to_bytes()
    }

    /// Restore a codec from a serialized symbol table.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(FsstCodec {
            table: Table::from_bytes(data)?,
        })
    }
}

impl Default for FsstCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for FsstCodec {
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(self.table.encode(input))
    }

    fn compress_to(&self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.table.encode_to(input, output)
    }

    fn max_compressed_size(&self, input_len: usize) -> usize {
        2 * input_len + OUTPUT_PADDING
    }
}

impl Decompressor for FsstCodec {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(self.table.decode(input))
    }

    fn decompress_to(&self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.table.decode_to(input, output)
    }
}

impl Codec for FsstCodec {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_empty() {
        let codec = FsstCodec::train(&[b"some sample" as &[u8]]);
        let compressed = codec.compress(b"").unwrap();
        assert!(compressed.is_empty());
        assert!(codec.decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_roundtrip_small() {
        let codec = FsstCodec::train(&[b"Hello, FSST!" as &[u8]]);
        let input = b"Hello, FSST!";

        let compressed = codec.compress(input).unwrap();
        let decompressed = codec.decompress(&compressed).unwrap();
        assert_eq!(decompressed.as_slice(), input);
    }

    #[test]
    fn test_roundtrip_unseen_input() {
        // Input that shares nothing with the training sample still
        // round-trips (via escapes).
        let codec = FsstCodec::train(&[b"hello world" as &[u8]]);
        let input = b"xyzzy";
        let compressed = codec.compress(input).unwrap();
        assert_eq!(codec.decompress(&compressed).unwrap().as_slice(), input);
    }

    #[test]
    fn test_roundtrip_repetitive_compresses() {
        let input: Vec<u8> = b"The quick brown fox jumps over the lazy dog. "
            .iter()
            .cycle()
            .take(20_000)
            .copied()
            .collect();
        let codec = FsstCodec::train(&[&input]);

        let compressed = codec.compress(&input).unwrap();
        assert!(compressed.len() < input.len());
        assert_eq!(codec.decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_verify_roundtrip_trait() {
        let codec = FsstCodec::train(&[b"trait coverage" as &[u8]]);
        assert!(codec.verify_roundtrip(b"trait coverage").unwrap());
        assert!(codec.verify_roundtrip(b"something else entirely").unwrap());
    }

    #[test]
    fn test_measure_ratio() {
        let input: Vec<u8> = b"abab".iter().cycle().take(4000).copied().collect();
        let codec = FsstCodec::train(&[&input]);
        let ratio = codec.measure_ratio(&input).unwrap();
        assert!(ratio.is_effective());
    }

    #[test]
    fn test_compress_to_and_back() {
        let codec = FsstCodec::train(&[b"buffer reuse" as &[u8]]);
        let input = b"buffer reuse buffer reuse";

        let mut compressed = vec![0u8; codec.max_compressed_size(input.len())];
        let n = codec.compress_to(input, &mut compressed).unwrap();

        let mut decompressed = vec![0u8; input.len()];
        let m = codec.decompress_to(&compressed[..n], &mut decompressed).unwrap();
        assert_eq!(&decompressed[..m], input);
    }

    #[test]
    fn test_untrained_codec_escapes() {
        let codec = FsstCodec::new();
        let input = b"ab";
        let compressed = codec.compress(input).unwrap();
        assert_eq!(compressed.len(), 2 * input.len());
        assert_eq!(codec.decompress(&compressed).unwrap().as_slice(), input);
    }

    #[test]
    fn test_codec_serialization_preserves_output() {
        let samples: Vec<&[u8]> = vec![b"serialize me", b"serialize you"];
        let codec = FsstCodec::train(&samples);
        let restored = FsstCodec::from_bytes(&codec.to_bytes()).unwrap();

        for sample in &samples {
            assert_eq!(
                codec.compress(sample).unwrap(),
                restored.compress(sample).unwrap()
            );
        }
    }
}
