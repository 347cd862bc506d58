//! Fixed-capacity byte ring for the log transmitter.
//!
//! `head` is the producer index, `tail` the consumer index.  One slot is
//! always left free: the ring is empty when `head == tail` and full when
//! `(head + 1) % N == tail`, so it holds at most `N - 1` bytes.  A full
//! ring rejects new bytes; unread data is never overwritten.

pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    head: usize,
    tail: usize,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    pub const fn new() -> Self {
        assert!(N >= 2, "ring needs at least one usable slot");
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
        }
    }

    /// Usable capacity (`N - 1`).
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    pub fn len(&self) -> usize {
        (self.head + N - self.tail) % N
    }

    pub fn free(&self) -> usize {
        self.capacity() - self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        (self.head + 1) % N == self.tail
    }

    /// Append one byte.  Returns `false` when full.
    pub fn push(&mut self, byte: u8) -> bool {
        let next = (self.head + 1) % N;
        if next == self.tail {
            return false;
        }
        self.buf[self.head] = byte;
        self.head = next;
        true
    }

    /// Append as many bytes of `data` as fit.  Returns the number stored.
    pub fn push_slice(&mut self, data: &[u8]) -> usize {
        let mut stored = 0;
        for &b in data {
            if !self.push(b) {
                break;
            }
            stored += 1;
        }
        stored
    }

    /// Longest run of pending bytes starting at `tail` that does not cross
    /// the end of the backing array, capped at `max`.
    pub fn contiguous(&self, max: usize) -> &[u8] {
        let end = if self.head >= self.tail { self.head } else { N };
        let len = (end - self.tail).min(max);
        &self.buf[self.tail..self.tail + len]
    }

    /// Release `n` bytes from the front.  Never moves past `head`.
    /// Returns the number actually released.
    pub fn advance_tail(&mut self, n: usize) -> usize {
        let n = n.min(self.len());
        self.tail = (self.tail + n) % N;
        n
    }

    /// Remove and return the oldest byte.
    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let b = self.buf[self.tail];
        self.tail = (self.tail + 1) % N;
        Some(b)
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tail(&self) -> usize {
        self.tail
    }
}
