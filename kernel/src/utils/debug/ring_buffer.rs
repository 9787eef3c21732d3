/*
 * Ring Buffer for Logging
 *
 * Fixed-size circular byte buffer backing the kernel log. Callers serialize
 * access (the log buffer keeps it behind a spin::Mutex), so the indices are
 * plain integers.
 *
 * Design:
 * - Capacity fixed at compile time, no heap allocations
 * - Reads drain what they return
 * - Overwrite on overflow (loses the oldest bytes)
 */

/// Ring buffer for log messages
pub struct RingBuffer<const N: usize> {
    /// Circular buffer storage
    buffer: [u8; N],

    /// Next write position
    head: usize,

    /// Bytes currently stored
    len: usize,
}

impl<const N: usize> RingBuffer<N> {
    /// Create a new empty ring buffer
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            head: 0,
            len: 0,
        }
    }

    /// Append `data`, overwriting the oldest bytes when full
    ///
    /// Returns the number of bytes written.
    pub fn write(&mut self, data: &[u8]) -> usize {
        if N == 0 {
            return 0;
        }
        for &byte in data {
            self.buffer[self.head] = byte;
            self.head = (self.head + 1) % N;
            if self.len < N {
                self.len += 1;
            }
        }
        data.len()
    }

    /// Drain up to `dest.len()` of the oldest bytes into `dest`
    ///
    /// Returns the number of bytes read.
    pub fn read(&mut self, dest: &mut [u8]) -> usize {
        let count = self.len.min(dest.len());
        let tail = (self.head + N - self.len) % N.max(1);
        for (i, slot) in dest.iter_mut().take(count).enumerate() {
            *slot = self.buffer[(tail + i) % N];
        }
        self.len -= count;
        count
    }

    /// Check if the ring buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of bytes currently in the buffer
    pub fn len(&self) -> usize {
        self.len
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read() {
        let mut rb = RingBuffer::<32>::new();

        let written = rb.write(b"Hello, World!");
        assert_eq!(written, 13);

        let mut buf = [0u8; 20];
        let read = rb.read(&mut buf);
        assert_eq!(read, 13);
        assert_eq!(&buf[..13], b"Hello, World!");
        assert!(rb.is_empty());
    }

    #[test]
    fn test_wrap_around_keeps_newest_bytes() {
        let mut rb = RingBuffer::<8>::new();
        rb.write(b"abcdef");
        rb.write(b"WRAP");
        assert_eq!(rb.len(), 8);

        let mut buf = [0u8; 8];
        assert_eq!(rb.read(&mut buf), 8);
        assert_eq!(&buf, b"cdefWRAP");
    }

    #[test]
    fn test_partial_reads_drain_in_order() {
        let mut rb = RingBuffer::<16>::new();
        rb.write(b"0123456789");

        let mut buf = [0u8; 4];
        assert_eq!(rb.read(&mut buf), 4);
        assert_eq!(&buf, b"0123");
        assert_eq!(rb.len(), 6);

        rb.write(b"abcdefghij");
        let mut rest = [0u8; 16];
        let n = rb.read(&mut rest);
        assert_eq!(&rest[..n], b"456789abcdefghij");
    }
}
