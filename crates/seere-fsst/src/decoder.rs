//! Flat-table decoding.
//!
//! Decoding is a straight loop over the compressed bytes: a code below 255
//! expands to the symbol stored in the flattened `dec_len`/`dec_symbol`
//! arrays, and the escape code 255 copies the following byte verbatim.
//! Symbols are emitted as full 8-byte little-endian stores with the cursor
//! advanced by the true length; the next store overwrites the surplus. The
//! precise per-length store is only needed when a fixed output buffer has
//! fewer than 8 bytes of room left.
//!
//! The decoder never fails on malformed input: codes the table does not
//! define expand to nothing, and a trailing escape with no literal after
//! it ends the stream.

use seere_core::{Error, Result};

use crate::symbol::ESCAPE_CODE;
use crate::table::Table;

impl Table {
    /// Decode `src`, returning the original bytes. Accepts arbitrary
    /// input; decoding cannot fail.
    pub fn decode(&self, src: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; src.len() * 4 + 8];
        let mut out_pos = 0;
        let mut src_pos = 0;

        while src_pos < src.len() {
            let code = src[src_pos] as usize;
            src_pos += 1;

            if code < ESCAPE_CODE as usize {
                if out_pos + 8 > out.len() {
                    out.resize((out.len() * 2).max(out_pos + 8), 0);
                }
                // Wide speculative store; the cursor only advances by the
                // symbol length.
                out[out_pos..out_pos + 8]
                    .copy_from_slice(&self.dec_symbol[code].to_le_bytes());
                out_pos += self.dec_len[code] as usize;
            } else {
                // Escape: next byte is a literal. A trailing escape with
                // nothing after it is tolerated.
                if src_pos >= src.len() {
                    break;
                }
                if out_pos >= out.len() {
                    out.resize((out.len() * 2).max(out_pos + 1), 0);
                }
                out[out_pos] = src[src_pos];
                out_pos += 1;
                src_pos += 1;
            }
        }

        out.truncate(out_pos);
        out
    }

    /// Decode `src` into a caller-provided buffer, returning the number of
    /// bytes written. Fails with [`Error::BufferTooSmall`] when the buffer
    /// cannot hold the decoded data; nothing is written out of bounds.
    pub fn decode_to(&self, src: &[u8], output: &mut [u8]) -> Result<usize> {
        let mut out_pos = 0;
        let mut src_pos = 0;

        while src_pos < src.len() {
            let code = src[src_pos] as usize;
            src_pos += 1;

            if code < ESCAPE_CODE as usize {
                let length = self.dec_len[code] as usize;
                if out_pos + 8 <= output.len() {
                    output[out_pos..out_pos + 8]
                        .copy_from_slice(&self.dec_symbol[code].to_le_bytes());
                } else {
                    // Within 8 bytes of the end: store exactly the symbol.
                    if out_pos + length > output.len() {
                        return Err(Error::buffer_too_small(out_pos + length, output.len()));
                    }
                    let bytes = self.dec_symbol[code].to_le_bytes();
                    output[out_pos..out_pos + length].copy_from_slice(&bytes[..length]);
                }
                out_pos += length;
            } else {
                if src_pos >= src.len() {
                    break;
                }
                if out_pos >= output.len() {
                    return Err(Error::buffer_too_small(out_pos + 1, output.len()));
                }
                output[out_pos] = src[src_pos];
                out_pos += 1;
                src_pos += 1;
            }
        }

        Ok(out_pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;

    fn table_with(symbols: &[&[u8]]) -> Table {
        let mut table = Table::new();
        for s in symbols {
            assert!(table.add_symbol(Symbol::from_bytes(s)));
        }
        table.finalize();
        table.freeze();
        table
    }

    #[test]
    fn test_decode_empty() {
        let table = table_with(&[]);
        assert!(table.decode(b"").is_empty());
    }

    #[test]
    fn test_decode_escapes() {
        let table = table_with(&[]);
        assert_eq!(table.decode(&[255, b'h', 255, b'i']), b"hi");
    }

    #[test]
    fn test_decode_symbols_all_lengths() {
        let table = table_with(&[
            b"a",
            b"bc",
            b"def",
            b"ghij",
            b"klmno",
            b"pqrstu",
            b"vwxyz01",
            b"23456789",
        ]);
        // Encode each symbol and decode it back; covers every length's
        // store path.
        for s in [
            &b"a"[..], b"bc", b"def", b"ghij", b"klmno", b"pqrstu", b"vwxyz01", b"23456789",
        ] {
            let out = table.encode(s);
            assert_eq!(out.len(), 1, "symbol {s:?} should take one code");
            assert_eq!(table.decode(&out), s);
        }
    }

    #[test]
    fn test_decode_trailing_escape() {
        let table = table_with(&[]);
        assert_eq!(table.decode(&[255, b'x', 255]), b"x");
        assert_eq!(table.decode(&[255]), b"");
    }

    #[test]
    fn test_decode_undefined_codes() {
        // Codes the table does not define decode to nothing rather than
        // failing.
        let table = table_with(&[b"ab"]);
        let out = table.decode(&[0, 200, 0, 254]);
        assert_eq!(out, b"abab");
    }

    #[test]
    fn test_decode_arbitrary_input_no_panic() {
        let table = table_with(&[b"ab", b"cde", b"f"]);
        // All single bytes.
        for b in 0..=255u8 {
            let _ = table.decode(&[b]);
        }
        // A few adversarial patterns.
        let _ = table.decode(&[255; 100]);
        let _ = table.decode(&[254; 100]);
        let _ = table.decode(&(0..=255).collect::<Vec<u8>>());
    }

    #[test]
    fn test_decode_to_exact_buffer() {
        let table = table_with(&[b"abc"]);
        let compressed = table.encode(b"abcabc");

        // Exact-size buffer works via the precise store path.
        let mut buf = [0u8; 6];
        let n = table.decode_to(&compressed, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"abcabc");

        // Roomy buffer takes the wide-store path.
        let mut buf = [0u8; 32];
        let n = table.decode_to(&compressed, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"abcabc");

        // Too small errors without writing out of bounds.
        let mut buf = [0u8; 5];
        assert!(table.decode_to(&compressed, &mut buf).is_err());
    }

    #[test]
    fn test_decode_to_escape_bound() {
        let table = table_with(&[]);
        let mut buf = [0u8; 1];
        assert_eq!(table.decode_to(&[255, b'x'], &mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'x');
        assert!(table.decode_to(&[255, b'x', 255, b'y'], &mut buf).is_err());
    }

    #[test]
    fn test_decode_grows_output() {
        // Every compressed byte expands eightfold, so the initial
        // allocation must grow.
        let table = table_with(&[b"23456789"]);
        let input = b"23456789".repeat(60); // single chunk
        let compressed = table.encode(&input);
        assert_eq!(compressed.len(), 60);
        assert_eq!(table.decode(&compressed), input);
    }
}
