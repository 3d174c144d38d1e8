//! The FSST symbol table.
//!
//! A [`Table`] maps up to 255 learned symbols (1-8 bytes each) to one-byte
//! codes. Lookups run through three tiers keyed on progressively longer
//! prefixes of the input:
//!
//! - `byte_codes[256]`: first byte -> packed `(length << 12) | code`
//! - `short_codes[65536]`: first two bytes -> packed `(length << 12) | code`
//! - `hash_tab[2048]`: direct-mapped on a 3-byte prefix hash, holding the
//!   full symbol record for 3-8 byte symbols
//!
//! During training, codes live in the extended range `[256, 511)` and the
//! first 256 codes stand for escaped bytes. [`Table::finalize`] renumbers
//! the learned symbols into `[0, n_symbols)`, grouped by length with the
//! unique-prefix 2-byte symbols first, so the encoder can pick its fast
//! paths from a code comparison alone. After finalization (or after
//! deserialization) the derived lookup structures, strategy flags, and
//! decoder arrays are rebuilt eagerly; from then on the table is immutable
//! and safe to share.
//!
//! Serialized layout (all little-endian):
//!
//! - 8-byte header: `(version << 32) | (suffix_lim << 16) | (n_symbols << 8) | 1`
//!   (the low byte is an endian marker, ignored on read)
//! - 8 bytes: length histogram, one byte per length 1..8
//! - the symbol bytes, in code order: 2-byte symbols, then 3..8, then 1-byte

use std::io::{Read, Write};

use seere_core::{Error, Result};

use crate::symbol::{
    pack_code_length, Symbol, CODE_BASE, CODE_MASK, CODE_MAX, HASH_TAB_SIZE, ICL_FREE, MASK8,
    MAX_SYMBOLS, MAX_SYMBOL_LEN,
};

/// FSST table format version (the format's publication date).
pub(crate) const VERSION: u64 = 20190218;

/// A trained symbol table, ready to encode and decode.
#[derive(Clone)]
pub struct Table {
    /// 2-byte prefix -> packed `(length << 12) | code`.
    pub(crate) short_codes: Box<[u16]>,
    /// 1-byte prefix -> packed `(length << 12) | code`.
    pub(crate) byte_codes: [u16; 256],
    /// Code -> symbol. Slots `[256, 512)` hold the learned symbols during
    /// training; after finalization the learned symbols live in `[0, 255)`.
    pub(crate) symbols: Box<[Symbol]>,
    /// Direct-mapped table for 3-8 byte symbols, keyed by 3-byte prefix hash.
    pub(crate) hash_tab: Box<[Symbol]>,

    /// Number of learned symbols (0..=255).
    pub(crate) n_symbols: u16,
    /// Exclusive end of the unique-prefix 2-byte code range.
    pub(crate) suffix_lim: u16,
    /// `len_histo[l - 1]` counts learned symbols of length `l`.
    pub(crate) len_histo: [u16; 8],

    /// Encoder strategy: 2-byte matches need no hash probe.
    pub(crate) no_suffix_opt: bool,
    /// Encoder strategy: branchless emission beats branchy on this table.
    pub(crate) avoid_branch: bool,

    /// Code -> symbol length, for decoding. Code 255 is the escape.
    pub(crate) dec_len: [u8; 255],
    /// Code -> symbol bytes (little-endian), for decoding.
    pub(crate) dec_symbol: [u64; 255],
}

impl Table {
    /// Create an empty table: no learned symbols, all lookups escape.
    pub(crate) fn new() -> Table {
        let mut symbols = vec![Symbol::FREE; CODE_MAX as usize].into_boxed_slice();
        for (i, slot) in symbols.iter_mut().enumerate().take(256) {
            *slot = Symbol::from_byte(i as u8, i as u16);
        }
        let unused = Symbol::from_byte(0, CODE_MASK);
        for slot in symbols.iter_mut().skip(256) {
            *slot = unused;
        }

        let mut byte_codes = [0u16; 256];
        for (i, slot) in byte_codes.iter_mut().enumerate() {
            *slot = pack_code_length(i as u16, 1);
        }
        let mut short_codes = vec![0u16; 65536].into_boxed_slice();
        for (i, slot) in short_codes.iter_mut().enumerate() {
            *slot = pack_code_length((i as u64 & MASK8) as u16, 1);
        }

        Table {
            short_codes,
            byte_codes,
            symbols,
            hash_tab: vec![Symbol::FREE; HASH_TAB_SIZE].into_boxed_slice(),
            n_symbols: 0,
            suffix_lim: 0,
            len_histo: [0; 8],
            no_suffix_opt: false,
            avoid_branch: false,
            dec_len: [0; 255],
            dec_symbol: [0; 255],
        }
    }

    /// Number of learned symbols in the table.
    pub fn n_symbols(&self) -> usize {
        self.n_symbols as usize
    }

    /// Remove all learned symbols, restoring the lookup structures to their
    /// escape defaults. Training calls this between rounds.
    pub(crate) fn clear_symbols(&mut self) {
        self.len_histo = [0; 8];
        for i in CODE_BASE..CODE_BASE + self.n_symbols {
            let sym = self.symbols[i as usize];
            match sym.length() {
                1 => {
                    let first = sym.first();
                    self.byte_codes[first as usize] = pack_code_length(first as u16, 1);
                }
                2 => {
                    let first2 = sym.first2();
                    self.short_codes[first2 as usize] =
                        pack_code_length((first2 as u64 & MASK8) as u16, 1);
                }
                _ => {
                    let idx = (sym.hash() & (HASH_TAB_SIZE as u64 - 1)) as usize;
                    self.hash_tab[idx] = Symbol::FREE;
                }
            }
        }
        self.n_symbols = 0;
    }

    /// Insert a 3+ byte symbol into the direct-mapped hash table. The value
    /// is stored pre-masked so lookups compare against it directly. Returns
    /// false when the slot is taken; there is no probing.
    pub(crate) fn hash_insert(&mut self, sym: Symbol) -> bool {
        let idx = (sym.hash() & (HASH_TAB_SIZE as u64 - 1)) as usize;
        if self.hash_tab[idx].icl < ICL_FREE {
            return false;
        }
        self.hash_tab[idx] = Symbol {
            val: sym.val & (u64::MAX >> sym.ignored_bits()),
            icl: sym.icl,
        };
        true
    }

    /// Assign the next free code to `sym` and install it into the lookup
    /// structure matching its length. Returns false when the table is full
    /// or the hash slot for a 3+ byte symbol is taken.
    pub(crate) fn add_symbol(&mut self, mut sym: Symbol) -> bool {
        if self.n_symbols as usize >= MAX_SYMBOLS {
            return false;
        }
        let code = CODE_BASE + self.n_symbols;
        let length = sym.length();
        sym.set_code_length(code, length);
        match length {
            1 => self.byte_codes[sym.first() as usize] = pack_code_length(code, 1),
            2 => self.short_codes[sym.first2() as usize] = pack_code_length(code, 2),
            _ => {
                if !self.hash_insert(sym) {
                    return false;
                }
            }
        }
        self.symbols[code as usize] = sym;
        self.n_symbols += 1;
        self.len_histo[(length - 1) as usize] += 1;
        true
    }

    /// Find the longest symbol matching the front of `window` (an up-to-8
    /// byte probe built with [`Symbol::from_bytes`]). Prefers 3-8 byte hash
    /// hits, then learned 2-byte short codes, then single-byte codes.
    /// Only meaningful before finalization; the encoder has its own lookup.
    pub(crate) fn find_longest(&self, window: Symbol) -> u16 {
        let idx = (window.hash() & (HASH_TAB_SIZE as u64 - 1)) as usize;
        let entry = self.hash_tab[idx];
        // entry.icl <= window.icl implies the entry is occupied and no
        // longer than the window.
        if entry.icl <= window.icl {
            let mask = u64::MAX >> entry.ignored_bits();
            if entry.val == (window.val & mask) {
                return entry.code() & CODE_MASK;
            }
        }
        if window.length() >= 2 {
            let code = self.short_codes[window.first2() as usize] & CODE_MASK;
            if code >= CODE_BASE {
                return code;
            }
        }
        self.byte_codes[window.first() as usize] & CODE_MASK
    }

    /// Renumber the learned symbols from the extended range `[256, 511)`
    /// down to `[0, n_symbols)`, grouped for encoder fast paths:
    ///
    /// - `[0, suffix_lim)`: 2-byte symbols whose 2-byte prefix no other
    ///   learned symbol shares (matchable without a suffix check)
    /// - `[suffix_lim, byte_lim)`: the remaining 2-byte symbols, then the
    ///   3..8 byte length groups in ascending code order
    /// - `[byte_lim, n_symbols)`: 1-byte symbols
    ///
    /// Only `symbols` and `suffix_lim` are updated; call
    /// [`Table::rebuild_indices`] to refresh the lookup structures.
    pub(crate) fn finalize(&mut self) {
        debug_assert!(self.n_symbols as usize <= MAX_SYMBOLS);
        let mut new_code = [0u8; 256];
        let mut code_start = [0u8; 8];
        let byte_lim = self.n_symbols - self.len_histo[0];

        // 1-byte symbols take the highest codes; lengths 2..8 are laid out
        // from code 0 upward.
        code_start[0] = byte_lim as u8;
        code_start[1] = 0;
        for i in 1..7 {
            code_start[i + 1] = code_start[i] + self.len_histo[i] as u8;
        }

        self.suffix_lim = 0;
        // Conflicting 2-byte symbols fill their partition from the top down.
        let mut conflict_code = code_start[2];

        for i in 0..self.n_symbols as usize {
            let mut sym = self.symbols[CODE_BASE as usize + i];
            let length = sym.length();

            if length == 2 {
                let first2 = sym.first2();
                let mut has_conflict = false;
                for k in 0..self.n_symbols as usize {
                    if k == i {
                        continue;
                    }
                    let other = self.symbols[CODE_BASE as usize + k];
                    if other.length() > 1 && other.first2() == first2 {
                        has_conflict = true;
                        break;
                    }
                }
                new_code[i] = if has_conflict {
                    conflict_code -= 1;
                    conflict_code
                } else {
                    self.suffix_lim += 1;
                    (self.suffix_lim - 1) as u8
                };
            } else {
                let group = (length - 1) as usize;
                new_code[i] = code_start[group];
                code_start[group] += 1;
            }

            sym.set_code_length(new_code[i] as u16, length);
            self.symbols[new_code[i] as usize] = sym;
        }
    }

    /// Reconstruct `byte_codes`, `short_codes`, and `hash_tab` from the
    /// finalized `symbols`. Codes already assigned in `symbols[i]` are
    /// preserved; this only rebuilds the derived lookups.
    pub(crate) fn rebuild_indices(&mut self) {
        // Escape markers by default: code 511 truncates to the escape byte
        // 255, with length 1.
        for slot in self.byte_codes.iter_mut() {
            *slot = pack_code_length(CODE_MASK, 1);
        }
        for slot in self.hash_tab.iter_mut() {
            *slot = Symbol::FREE;
        }

        for i in 0..self.n_symbols as usize {
            let sym = self.symbols[i];
            if sym.length() == 1 {
                self.byte_codes[sym.first() as usize] = pack_code_length(i as u16, 1);
            }
        }

        // A 2-byte miss falls back to whatever the first byte resolves to.
        for i in 0..self.short_codes.len() {
            self.short_codes[i] = self.byte_codes[i & MASK8 as usize];
        }

        for i in 0..self.n_symbols as usize {
            let sym = self.symbols[i];
            if sym.length() == 2 {
                self.short_codes[sym.first2() as usize] = pack_code_length(i as u16, 2);
            }
        }

        for i in 0..self.n_symbols as usize {
            let sym = self.symbols[i];
            if sym.length() >= 3 {
                // Cannot collide: these symbols held distinct slots when
                // they were first admitted.
                self.hash_insert(sym);
            }
        }
    }

    /// Pick the encoder emission strategy from the symbol statistics.
    ///
    /// `no_suffix_opt`: most symbols are 2-byte (>65%) and nearly all of
    /// those (>95%) have a unique prefix, so the 2-byte fast path can skip
    /// the hash probe. `avoid_branch`: the length distribution is balanced
    /// enough that branchless emission wins. The thresholds are empirical;
    /// `no_suffix_opt` short-circuits `avoid_branch`.
    pub(crate) fn choose_strategy(&mut self) {
        self.no_suffix_opt = false;
        self.avoid_branch = false;
        if 100 * self.len_histo[1] as u32 > 65 * self.n_symbols as u32
            && 100 * self.suffix_lim as u32 > 95 * self.len_histo[1] as u32
        {
            self.no_suffix_opt = true;
            return;
        }
        if (self.len_histo[0] > 24 && self.len_histo[0] < 92)
            && (self.len_histo[0] < 43 || self.len_histo[6] + self.len_histo[7] < 29)
            && (self.len_histo[0] < 72 || self.len_histo[2] < 72)
        {
            self.avoid_branch = true;
        }
    }

    /// Flatten the finalized symbols into the decoder arrays.
    pub(crate) fn build_decoder(&mut self) {
        for code in 0..self.n_symbols as usize {
            let sym = self.symbols[code];
            self.dec_len[code] = sym.length() as u8;
            self.dec_symbol[code] = sym.val;
        }
    }

    /// Materialize everything derived from the finalized symbols. After
    /// this the table never changes, so `&Table` is freely shareable.
    pub(crate) fn freeze(&mut self) {
        self.rebuild_indices();
        self.choose_strategy();
        self.build_decoder();
    }

    /// Serialize the table to `w`. The output is byte-identical for tables
    /// trained on identical inputs.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<usize> {
        let header = (VERSION << 32)
            | ((self.suffix_lim as u64) << 16)
            | ((self.n_symbols as u64) << 8)
            | 1;
        w.write_all(&header.to_le_bytes())?;
        let mut written = 8;

        // Derive the histogram from the live symbols rather than trusting
        // stored state.
        let mut histo = [0u8; 8];
        for i in 0..self.n_symbols as usize {
            let length = self.symbols[i].length() as usize;
            if (1..=MAX_SYMBOL_LEN).contains(&length) {
                histo[length - 1] += 1;
            }
        }
        w.write_all(&histo)?;
        written += 8;

        for i in 0..self.n_symbols as usize {
            let sym = self.symbols[i];
            let bytes = sym.val.to_le_bytes();
            let length = sym.length() as usize;
            w.write_all(&bytes[..length])?;
            written += length;
        }
        Ok(written)
    }

    /// Deserialize a table from `r` and make it ready for use. The stored
    /// code assignments are the finalized ones, so no re-finalization
    /// happens here. Fails with [`Error::UnsupportedVersion`] on a version
    /// mismatch; short reads surface as I/O errors.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Table> {
        let mut hdr = [0u8; 8];
        r.read_exact(&mut hdr)?;
        let header = u64::from_le_bytes(hdr);
        if header >> 32 != VERSION {
            return Err(Error::unsupported_version(
                (header >> 32) as u32,
                VERSION as u32,
            ));
        }

        let mut table = Table::new();
        table.suffix_lim = ((header >> 16) & MASK8) as u16;
        table.n_symbols = ((header >> 8) & MASK8) as u16;
        // Low byte is the endian marker; ignored.

        let mut histo = [0u8; 8];
        r.read_exact(&mut histo)?;
        for (i, &count) in histo.iter().enumerate() {
            table.len_histo[i] = count as u16;
        }

        // Rebuild the per-code length schedule from the histogram, in the
        // write order: lengths 2..8, then 1.
        let mut lens = Vec::with_capacity(table.n_symbols as usize);
        for length in 2..=MAX_SYMBOL_LEN {
            for _ in 0..table.len_histo[length - 1] {
                lens.push(length);
            }
        }
        for _ in 0..table.len_histo[0] {
            lens.push(1);
        }
        if lens.len() != table.n_symbols as usize {
            return Err(Error::corrupted(
                "length histogram disagrees with symbol count",
            ));
        }

        for (code, &length) in lens.iter().enumerate() {
            let mut bytes = [0u8; 8];
            r.read_exact(&mut bytes[..length])?;
            let mut sym = Symbol {
                val: u64::from_le_bytes(bytes),
                icl: 0,
            };
            sym.set_code_length(code as u16, length as u32);
            table.symbols[code] = sym;
        }

        table.freeze();
        Ok(table)
    }

    /// Serialize the table to a new byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail.
        self.write_to(&mut buf).expect("vec write");
        buf
    }

    /// Deserialize a table from a byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Table> {
        let mut cursor = data;
        Table::read_from(&mut cursor)
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("n_symbols", &self.n_symbols)
            .field("suffix_lim", &self.suffix_lim)
            .field("len_histo", &self.len_histo)
            .field("no_suffix_opt", &self.no_suffix_opt)
            .field("avoid_branch", &self.avoid_branch)
            .finish()
    }
}
