//! The return-data buffer (C5, EIP-211): the output of the most recently
//! completed sub-call or sub-create, readable by `RETURNDATASIZE`/
//! `RETURNDATACOPY` until the next sub-call overwrites it. A frame starts
//! with an empty buffer; `CREATE`/`CREATE2` never populate it on success
//! (only on a reverted/failed deployment, where the revert reason is the
//! deployer's return data).

use thiserror::Error;

/// `RETURNDATACOPY` addressed past the end of the buffer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("return data out of bounds: offset {offset} + len {len} > size {size}")]
pub struct ReturnDataOutOfBounds {
    pub offset: usize,
    pub len: usize,
    pub size: usize,
}

/// Holds the most recent sub-call/sub-create's output bytes.
#[derive(Debug, Default, Clone)]
pub struct ReturnDataBuffer {
    data: Vec<u8>,
}

impl ReturnDataBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the buffer with a completed sub-call/sub-create's output.
    pub fn set(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    /// Clears the buffer, used when entering a frame that has not yet
    /// made any sub-call.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// The `[offset, offset+len)` slice `RETURNDATACOPY` needs, bounds
    /// checked per EIP-211 (out-of-bounds is an exceptional halt, unlike
    /// memory/calldata copies which zero-pad).
    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8], ReturnDataOutOfBounds> {
        let end = offset.checked_add(len).ok_or(ReturnDataOutOfBounds {
            offset,
            len,
            size: self.data.len(),
        })?;
        if end > self.data.len() {
            return Err(ReturnDataOutOfBounds {
                offset,
                len,
                size: self.data.len(),
            });
        }
        Ok(&self.data[offset..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_read_in_bounds() {
        let mut buf = ReturnDataBuffer::new();
        buf.set(vec![1, 2, 3, 4]);
        assert_eq!(buf.size(), 4);
        assert_eq!(buf.slice(1, 2).unwrap(), &[2, 3]);
    }

    #[test]
    fn out_of_bounds_copy_errors_instead_of_padding() {
        let mut buf = ReturnDataBuffer::new();
        buf.set(vec![1, 2, 3]);
        assert!(buf.slice(2, 5).is_err());
    }

    #[test]
    fn clear_empties_buffer() {
        let mut buf = ReturnDataBuffer::new();
        buf.set(vec![9]);
        buf.clear();
        assert_eq!(buf.size(), 0);
    }
}
