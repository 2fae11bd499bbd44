//! Fixed-capacity sliding window
//!
//! Holds the most recent samples of a stream in a ring. Storage is allocated
//! once in `new`; every other operation works in place. `linearize` rotates the
//! storage so the oldest sample sits at index 0, which is the layout an FFT
//! needs.

/// Ring buffer over the latest `capacity` samples
#[derive(Debug, Clone)]
pub struct SlidingWindow<S> {
    buf: Vec<S>,
    head: usize,
    len: usize,
}

impl<S: Copy + Default> SlidingWindow<S> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![S::default(); capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }

    /// Append a sample; when full the oldest sample is overwritten
    pub fn push(&mut self, x: S) {
        let cap = self.buf.len();
        let tail = (self.head + self.len) % cap;
        self.buf[tail] = x;
        if self.len == cap {
            self.head = (self.head + 1) % cap;
        } else {
            self.len += 1;
        }
    }

    /// Drop the `n` oldest samples
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.len);
        self.head = (self.head + n) % self.buf.len();
        self.len -= n;
    }

    /// Empty the window
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Empty the window then fill it with `n` copies of `value`
    pub fn prime(&mut self, n: usize, value: S) {
        self.clear();
        for _ in 0..n.min(self.buf.len()) {
            self.push(value);
        }
    }

    /// Oldest-first iterator
    pub fn iter(&self) -> impl Iterator<Item = &S> + '_ {
        let cap = self.buf.len();
        (0..self.len).map(move |i| &self.buf[(self.head + i) % cap])
    }

    /// Rotate the storage so the contents are contiguous, oldest first
    pub fn linearize(&mut self) -> &[S] {
        if self.head != 0 {
            self.buf.rotate_left(self.head);
            self.head = 0;
        }
        &self.buf[..self.len]
    }
}
