//! Growable byte buffer with independent read and write cursors.
//!
//! A [`Buffer`] owns a zero-filled region of `capacity` bytes and a logical
//! high-water mark (`offset`) that marks the end of valid data. Cursors are
//! plain byte offsets from the start of the region, so a reallocation caused
//! by growth never leaves a cursor pointing at freed storage: the next access
//! simply indexes into the new region.
//!
//! ```
//! use quiver::storage::buffer::Buffer;
//!
//! let mut buf = Buffer::new(4);
//! buf.writer().write(b"posting list");
//! assert!(buf.capacity() >= 12);
//!
//! let mut out = [0u8; 7];
//! let mut reader = buf.reader();
//! assert_eq!(reader.read(&mut out), 7);
//! assert_eq!(&out, b"posting");
//! ```

use std::io;

/// Largest number of bytes a single geometric growth step may add.
pub const MAX_GROWTH_STEP: usize = 1024 * 1024;

/// A growable byte store. See the module docs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    /// The allocated region; `data.len()` is the capacity.
    data: Vec<u8>,
    /// High-water mark: number of valid bytes written so far.
    offset: usize,
}

impl Buffer {
    /// Create an empty buffer with `capacity` bytes allocated.
    pub fn new(capacity: usize) -> Self {
        Buffer {
            data: vec![0; capacity],
            offset: 0,
        }
    }

    /// Current high-water mark.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Currently allocated capacity.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// True when the high-water mark has reached the allocated capacity.
    pub fn at_end(&self) -> bool {
        self.offset >= self.capacity()
    }

    /// The valid bytes, `[0, offset)`.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.offset]
    }

    /// A writer appending at the high-water mark.
    pub fn writer(&mut self) -> BufferWriter<'_> {
        let pos = self.offset;
        BufferWriter { buf: self, pos }
    }

    /// A reader positioned at the start of the buffer.
    pub fn reader(&self) -> BufferReader<'_> {
        self.reader_at(0)
    }

    /// A reader positioned at `pos` (clamped to the capacity).
    pub fn reader_at(&self, pos: usize) -> BufferReader<'_> {
        BufferReader {
            buf: self,
            pos: pos.min(self.capacity()),
            limit: self.offset,
        }
    }

    /// Shrink the allocation to exactly `new_len` bytes, or to the
    /// high-water mark when `new_len` is `None`. Returns the new capacity.
    ///
    /// Truncating below the high-water mark discards the bytes past it.
    pub fn truncate(&mut self, new_len: Option<usize>) -> usize {
        let new_len = new_len.unwrap_or(self.offset);
        self.data.truncate(new_len);
        self.data.shrink_to_fit();
        self.offset = self.offset.min(new_len);
        new_len
    }

    /// Make sure `needed` bytes fit in the allocation.
    ///
    /// Each step adds a quarter of the current capacity plus one byte, never
    /// more than [`MAX_GROWTH_STEP`]; when that is not enough the capacity
    /// jumps straight to `needed`.
    fn grow_to_fit(&mut self, needed: usize) {
        let capacity = self.capacity();
        if needed <= capacity {
            return;
        }

        let step = (capacity / 4 + 1).min(MAX_GROWTH_STEP);
        let new_capacity = (capacity + step).max(needed);
        log::trace!("growing buffer from {capacity} to {new_capacity} bytes");
        self.data.resize(new_capacity, 0);
    }
}

/// Exclusive append cursor into a [`Buffer`].
#[derive(Debug)]
pub struct BufferWriter<'a> {
    buf: &'a mut Buffer,
    pos: usize,
}

impl BufferWriter<'_> {
    /// Append `data`, growing the buffer first when needed.
    ///
    /// Advances both this cursor and the buffer's high-water mark.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let len = data.len();
        self.buf.grow_to_fit(self.buf.offset + len);
        self.buf.data[self.pos..self.pos + len].copy_from_slice(data);
        self.pos += len;
        self.buf.offset += len;
        len
    }

    /// Offset of the cursor from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }
}

/// Read-only cursor into a [`Buffer`].
///
/// Readers never mutate the buffer. The `io::Read` implementation stops at
/// the high-water mark observed when the reader was created (or at a tighter
/// limit set with [`BufferReader::bounded`]); the raw [`BufferReader::read`]
/// only checks against the allocated capacity.
#[derive(Debug, Clone)]
pub struct BufferReader<'a> {
    buf: &'a Buffer,
    pos: usize,
    limit: usize,
}

impl BufferReader<'_> {
    /// Restrict the valid region to `[0, end)`; `end` is clamped to the
    /// buffer's high-water mark.
    pub fn bounded(mut self, end: usize) -> Self {
        self.limit = end.min(self.buf.offset);
        self
    }

    /// Copy `out.len()` bytes into `out`.
    ///
    /// Returns 0 without consuming anything when the read would cross the
    /// allocated capacity.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let len = out.len();
        if self.pos.checked_add(len).is_none_or(|end| end > self.buf.capacity()) {
            return 0;
        }
        out.copy_from_slice(&self.buf.data[self.pos..self.pos + len]);
        self.pos += len;
        len
    }

    /// Consume one byte, or `None` at the allocated capacity.
    pub fn read_byte(&mut self) -> Option<u8> {
        let byte = *self.buf.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    /// Skip forward `bytes`. Skipping past the high-water mark clamps the
    /// cursor to the capacity. Returns the resulting position.
    pub fn skip(&mut self, bytes: usize) -> usize {
        if self.pos.checked_add(bytes).is_none_or(|end| end > self.buf.offset) {
            self.pos = self.buf.capacity();
        } else {
            self.pos += bytes;
        }
        self.pos
    }

    /// Move to an absolute position, clamped to the capacity. Returns the
    /// effective position.
    pub fn seek(&mut self, position: usize) -> usize {
        self.pos = position.min(self.buf.capacity());
        self.pos
    }

    /// Offset of the cursor from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// True once the cursor reached the end of valid data.
    pub fn at_end(&self) -> bool {
        self.pos >= self.limit
    }

    /// Bytes of valid data left in front of the cursor.
    fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.pos)
    }
}

impl io::Read for BufferReader<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let len = out.len().min(self.remaining());
        out[..len].copy_from_slice(&self.buf.data[self.pos..self.pos + len]);
        self.pos += len;
        Ok(len)
    }
}
