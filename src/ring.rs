//! Fixed-capacity byte ring used by the stream buffer.
//!
//! One slot always stays unused, so a ring of capacity `N` holds at most
//! `N - 1` bytes: it is full when `(newest + 1) % N == oldest` and empty when
//! `newest == oldest`. Writes never overwrite; the caller decides what to do
//! with a byte that does not fit.

use std::collections::TryReserveError;

/// Slot count of the stream buffer.
pub const STREAM_BUFFER_CAPACITY: usize = 2000;

/// Returned by [`RingBuffer::write`] when no slot is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferFull;

pub struct RingBuffer {
    data: Box<[u8]>,
    newest: usize,
    oldest: usize,
}

impl RingBuffer {
    /// Create a ring with `capacity` slots. Capacity must be at least 2.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "ring buffer needs at least two slots");
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            newest: 0,
            oldest: 0,
        }
    }

    /// Number of slots, one more than the bytes it can hold.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn usable_capacity(&self) -> usize {
        self.data.len() - 1
    }

    pub fn len(&self) -> usize {
        (self.newest + self.data.len() - self.oldest) % self.data.len()
    }

    /// Bytes that can still be written before the ring is full.
    pub fn free(&self) -> usize {
        self.usable_capacity() - self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.newest == self.oldest
    }

    pub fn is_full(&self) -> bool {
        (self.newest + 1) % self.data.len() == self.oldest
    }

    /// Append one byte.
    pub fn write(&mut self, byte: u8) -> Result<(), BufferFull> {
        let next = (self.newest + 1) % self.data.len();
        if next == self.oldest {
            return Err(BufferFull);
        }
        self.data[self.newest] = byte;
        self.newest = next;
        Ok(())
    }

    /// Remove the oldest byte.
    pub fn read(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.data[self.oldest];
        self.oldest = (self.oldest + 1) % self.data.len();
        Some(byte)
    }

    /// Append as many bytes as fit, returning how many were stored.
    pub fn write_slice(&mut self, bytes: &[u8]) -> usize {
        bytes
            .iter()
            .take_while(|&&b| self.write(b).is_ok())
            .count()
    }

    /// Drain up to `max` bytes in FIFO order.
    ///
    /// The output is reserved up front; nothing is drained if that fails.
    pub fn read_up_to(&mut self, max: usize) -> Result<Vec<u8>, TryReserveError> {
        let mut out = Vec::new();
        out.try_reserve_exact(max.min(self.len()))?;
        while out.len() < max {
            match self.read() {
                Some(b) => out.push(b),
                None => break,
            }
        }
        Ok(out)
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new(STREAM_BUFFER_CAPACITY)
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("newest", &self.newest)
            .field("oldest", &self.oldest)
            .finish()
    }
}
