//! Chunked encoding.
//!
//! Input is processed in 511-byte chunks copied into a padded scratch
//! buffer, so every position supports an unaligned 8-byte little-endian
//! load. Each position resolves through the table's tiers; the emitted
//! byte is always a finalized code, with the escape code 255 followed by
//! the literal byte for input the table cannot represent. Chunks carry no
//! framing, so their outputs concatenate into one valid code stream.
//!
//! Per chunk, each position takes one of four emission paths:
//!
//! 1. unique-prefix 2-byte fast path (only when `no_suffix_opt` is set):
//!    a short code below `suffix_lim` cannot be extended by any longer
//!    symbol, so no hash probe is needed
//! 2. hash-table hit: a 3-8 byte match
//! 3. branchless fallback (only when `avoid_branch` is set): write the
//!    short code and the would-be escape literal unconditionally, then
//!    advance the output by 1 or 2 depending on whether the code was an
//!    escape - no data-dependent branch
//! 4. branchy fallback: 2-byte match, 1-byte match, or escape
//!
//! Paths 3 and 4 emit identical bytes; they differ only in branch
//! structure.

use seere_core::{Error, Result};

use crate::symbol::{fsst_hash, read_u64_le, CODE_BASE, HASH_TAB_SIZE, ICL_FREE, LEN_BITS, MASK16, MASK24};
use crate::table::Table;

/// Bytes of input processed per chunk.
pub(crate) const CHUNK_SIZE: usize = 511;

/// Scratch padding past the chunk so an 8-byte load at position 510 stays
/// in bounds.
pub(crate) const CHUNK_PADDING: usize = 9;

/// Extra output headroom past the 2x worst case, covering the encoder's
/// speculative second write.
pub(crate) const OUTPUT_PADDING: usize = 7;

impl Table {
    /// Encode `input`, returning the compressed bytes. Output is at most
    /// `2 * input.len()` bytes (every byte escaping is the worst case).
    pub fn encode(&self, input: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; 2 * input.len() + OUTPUT_PADDING];
        let n = self.encode_into(input, &mut out);
        out.truncate(n);
        out
    }

    /// Encode `input` into a caller-provided buffer, returning the number
    /// of bytes written. The buffer must hold the worst case,
    /// `2 * input.len() + 7` bytes; anything smaller is rejected up front
    /// so no partial output is ever written.
    pub fn encode_to(&self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let required = 2 * input.len() + OUTPUT_PADDING;
        if output.len() < required {
            return Err(Error::buffer_too_small(required, output.len()));
        }
        Ok(self.encode_into(input, output))
    }

    fn encode_into(&self, input: &[u8], out: &mut [u8]) -> usize {
        let mut chunk_buf = [0u8; CHUNK_SIZE + CHUNK_PADDING];
        let byte_lim = (self.n_symbols - self.len_histo[0]) as u8;
        let mut out_pos = 0;
        let mut start = 0;
        while start < input.len() {
            let chunk = (input.len() - start).min(CHUNK_SIZE);
            chunk_buf[..chunk].copy_from_slice(&input[start..start + chunk]);
            // Zero the tail byte so trailing loads are deterministic.
            chunk_buf[chunk] = 0;
            out_pos = self.encode_chunk(out, out_pos, &chunk_buf, chunk, byte_lim);
            start += chunk;
        }
        out_pos
    }

    fn encode_chunk(
        &self,
        dst: &mut [u8],
        mut dst_pos: usize,
        buf: &[u8],
        end: usize,
        byte_lim: u8,
    ) -> usize {
        let mut pos = 0;
        while pos < end {
            let word = read_u64_le(buf, pos);
            let code = self.short_codes[(word & MASK16) as usize];

            // Unique-prefix 2-byte match: no longer symbol can start with
            // these two bytes, so skip the hash probe.
            if self.no_suffix_opt && (code as u8) < self.suffix_lim as u8 {
                dst[dst_pos] = code as u8;
                dst_pos += 1;
                pos += 2;
                continue;
            }

            let idx = (fsst_hash(word & MASK24) & (HASH_TAB_SIZE as u64 - 1)) as usize;
            let entry = self.hash_tab[idx];
            let escape_byte = word as u8;
            let masked_word = word & (u64::MAX >> entry.ignored_bits());

            if entry.icl < ICL_FREE && entry.val == masked_word {
                // 3-8 byte match.
                dst[dst_pos] = entry.code() as u8;
                dst_pos += 1;
                pos += entry.length() as usize;
            } else if self.avoid_branch {
                // Store code and literal unconditionally; keep the literal
                // only when the code is an escape marker (bit 8 set).
                dst[dst_pos] = code as u8;
                dst[dst_pos + 1] = escape_byte;
                dst_pos += 1 + ((code & CODE_BASE) >> 8) as usize;
                pos += (code >> LEN_BITS) as usize;
            } else if (code as u8) < byte_lim {
                // 2-byte match (no longer match was available).
                dst[dst_pos] = code as u8;
                dst_pos += 1;
                pos += 2;
            } else {
                // 1-byte match or escape.
                dst[dst_pos] = code as u8;
                dst_pos += 1;
                if code & CODE_BASE != 0 {
                    dst[dst_pos] = escape_byte;
                    dst_pos += 1;
                }
                pos += 1;
            }
        }
        dst_pos
    }
}
