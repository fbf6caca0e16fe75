//! Byte-addressable, word-growable memory (C3). Memory only ever grows,
//! always to a whole number of 32-byte words (§3's "memory expansion"),
//! and is always zero-initialized past what has been written.
//!
//! Gas accounting is the caller's job: a handler computes the new word
//! count first, charges [`evmcore_primitives::gas::memory_expansion_cost`]
//! against the frame's remaining gas, and only then calls
//! [`Memory::resize_words`]/the `store*`/`load*` helpers below, which
//! themselves never fail on size — growth is assumed already paid for.

use evmcore_primitives::Word;

/// Linear, word-granular memory.
#[derive(Debug, Default, Clone)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    #[must_use]
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Current size in bytes (always a multiple of 32).
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current size in 32-byte words, the quantity `MSIZE` and the gas
    /// formula both reason about.
    #[must_use]
    pub fn num_words(&self) -> u64 {
        (self.data.len() / 32) as u64
    }

    /// Grows memory to at least `words` 32-byte words, zero-filling the
    /// new region. A no-op if memory is already at least that large
    /// (memory never shrinks).
    pub fn resize_words(&mut self, words: u64) {
        let target = words as usize * 32;
        if target > self.data.len() {
            self.data.resize(target, 0);
        }
    }

    /// The number of words required to address up to `offset + size`
    /// (`0` if `size == 0`, per §3: a zero-length access never grows
    /// memory, even past the current end).
    #[must_use]
    pub fn words_for(offset: u64, size: u64) -> u64 {
        if size == 0 {
            return 0;
        }
        (offset.saturating_add(size) + 31) / 32
    }

    /// Reads a 32-byte word at `offset`, zero-padding past the end (which
    /// should not happen if the caller charged expansion first, but a
    /// defensive read is cheap and keeps this infallible).
    #[must_use]
    pub fn load_word(&self, offset: usize) -> Word {
        let mut buf = [0u8; 32];
        let end = (offset + 32).min(self.data.len());
        if offset < end {
            buf[..end - offset].copy_from_slice(&self.data[offset..end]);
        }
        Word::from_be_bytes(buf)
    }

    /// Writes a 32-byte word at `offset`.
    pub fn store_word(&mut self, offset: usize, value: Word) {
        self.ensure_len(offset + 32);
        self.data[offset..offset + 32].copy_from_slice(&value.to_be_bytes::<32>());
    }

    /// Writes a single byte at `offset` (`MSTORE8`).
    pub fn store_byte(&mut self, offset: usize, value: u8) {
        self.ensure_len(offset + 1);
        self.data[offset] = value;
    }

    /// Copies `len` bytes from `src` starting at `src_offset` into memory
    /// at `dst_offset`, zero-filling where `src` is shorter than
    /// requested (`CALLDATACOPY`/`CODECOPY`/`EXTCODECOPY`/
    /// `RETURNDATACOPY`'s shared semantics).
    pub fn store_data(&mut self, dst_offset: usize, src: &[u8], src_offset: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.ensure_len(dst_offset + len);
        for i in 0..len {
            let byte = src_offset
                .checked_add(i)
                .and_then(|idx| src.get(idx))
                .copied()
                .unwrap_or(0);
            self.data[dst_offset + i] = byte;
        }
    }

    /// Copies `len` bytes within memory itself (`MCOPY`), correct under
    /// overlap.
    pub fn copy_within(&mut self, dst_offset: usize, src_offset: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.ensure_len(dst_offset.max(src_offset) + len);
        self.data.copy_within(src_offset..src_offset + len, dst_offset);
    }

    /// A read-only view of `[offset, offset+len)`, used by `KECCAK256`
    /// and by `CALL*`/`CREATE*`/`RETURN`/`REVERT` to stage their input or
    /// output bytes. Panics if the range exceeds current length; callers
    /// must charge expansion (which also grows memory) first.
    #[must_use]
    pub fn slice(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    fn ensure_len(&mut self, min_len: usize) {
        if min_len > self.data.len() {
            let words = (min_len as u64 + 31) / 32;
            self.resize_words(words);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_rounds_up_to_words_and_zero_fills() {
        let mut m = Memory::new();
        m.resize_words(Memory::words_for(0, 1));
        assert_eq!(m.len(), 32);
        assert_eq!(m.load_word(0), Word::ZERO);
    }

    #[test]
    fn store_and_load_word_round_trips() {
        let mut m = Memory::new();
        let value = Word::from(0xDEAD_BEEFu64);
        m.store_word(0, value);
        assert_eq!(m.load_word(0), value);
        assert_eq!(m.num_words(), 1);
    }

    #[test]
    fn store_data_zero_pads_past_source_end() {
        let mut m = Memory::new();
        m.store_data(0, b"ab", 0, 4);
        assert_eq!(m.slice(0, 4), &[b'a', b'b', 0, 0]);
    }

    #[test]
    fn copy_within_handles_overlap() {
        let mut m = Memory::new();
        m.store_data(0, b"abcdef", 0, 6);
        m.copy_within(2, 0, 4); // shift "abcd" right by 2 -> "ab" "abcd" "ef"[overwritten]
        assert_eq!(m.slice(0, 6), b"ababcd");
    }

    #[test]
    fn zero_length_access_does_not_grow_memory() {
        assert_eq!(Memory::words_for(1_000_000, 0), 0);
    }
}
