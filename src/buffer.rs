// Growable byte buffer and the scratch-buffer pool.
//
// The parser treats input as opaque 8-bit data and hands the renderer byte
// slices, so all intermediate output accumulates in `Buffer` rather than
// `String`. A single growth request is capped at 16 MiB; an append that
// would cross the ceiling is dropped whole, never written partially.

use std::fmt;
use std::ops::{Deref, DerefMut};

/// Hard ceiling on a single growth request: 16 MiB.
pub const MAX_ALLOC: usize = 16 * 1024 * 1024;

/// Errors from buffer growth.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BufferError {
    #[error("requested capacity exceeds the {MAX_ALLOC}-byte ceiling")]
    CapacityExceeded,
}

/// Growable byte buffer with an allocation unit and a growth ceiling.
///
/// The allocation unit is the minimum increment for capacity growth;
/// requests are rounded up to a multiple of it to amortize reallocation.
#[derive(Debug, Clone)]
pub struct Buffer {
    data: Vec<u8>,
    unit: usize,
}

impl Buffer {
    /// Create an empty buffer with the given allocation unit.
    pub fn new(unit: usize) -> Self {
        Self {
            data: Vec::new(),
            unit: unit.max(1),
        }
    }

    /// Ensure capacity for at least `target` bytes, rounded up to the
    /// allocation unit. Fails without touching the buffer when the rounded
    /// request crosses the ceiling.
    pub fn grow(&mut self, target: usize) -> Result<(), BufferError> {
        if target > MAX_ALLOC {
            return Err(BufferError::CapacityExceeded);
        }

        if self.data.capacity() >= target {
            return Ok(());
        }

        let mut rounded = self.data.capacity() + self.unit;
        while rounded < target {
            rounded += self.unit;
        }

        self.data.reserve(rounded - self.data.len());
        Ok(())
    }

    /// Append raw bytes. A growth failure drops the append silently.
    pub fn put(&mut self, bytes: &[u8]) {
        let needed = self.data.len() + bytes.len();
        if needed > self.data.capacity() && self.grow(needed).is_err() {
            return;
        }
        self.data.extend_from_slice(bytes);
    }

    /// Append a string slice.
    pub fn put_str(&mut self, s: &str) {
        self.put(s.as_bytes());
    }

    /// Append a single byte.
    pub fn put_byte(&mut self, b: u8) {
        let needed = self.data.len() + 1;
        if needed > self.data.capacity() && self.grow(needed).is_err() {
            return;
        }
        self.data.push(b);
    }

    /// Shorten the buffer to `len` bytes. No-op when already shorter.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Remove `n` bytes from the head, shifting the remainder down.
    pub fn drop_head(&mut self, n: usize) {
        if n >= self.data.len() {
            self.data.clear();
        } else {
            self.data.drain(..n);
        }
    }

    /// Reset to empty, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the buffer, returning the underlying bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for Buffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl fmt::Write for Buffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // Growth failures follow the append contract: drop, don't error.
        self.put_str(s);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scratch-buffer pool
// ---------------------------------------------------------------------------

/// Per-scope pool of scratch buffers for nested parses.
///
/// Checkout moves a recycled buffer out (or allocates one at the pool's
/// unit); restore moves it back for reuse. The depth counter tracks how many
/// buffers are out at once: the block and span depths together are the
/// nesting budget, and both must be zero when a render returns.
pub(crate) struct WorkPool {
    free: Vec<Buffer>,
    depth: usize,
    unit: usize,
}

impl WorkPool {
    pub(crate) fn new(unit: usize) -> Self {
        Self {
            free: Vec::new(),
            depth: 0,
            unit,
        }
    }

    pub(crate) fn checkout(&mut self) -> Buffer {
        self.depth += 1;
        match self.free.pop() {
            Some(mut buf) => {
                buf.clear();
                buf
            }
            None => Buffer::new(self.unit),
        }
    }

    pub(crate) fn restore(&mut self, buf: Buffer) {
        self.depth -= 1;
        self.free.push(buf);
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }
}
