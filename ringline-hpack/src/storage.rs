//! Circular byte arena holding the name/value bytes of dynamic entries.
//!
//! Bytes are appended at a write cursor that wraps at the physical end of
//! the arena. A [`Span`] written across the end continues at offset 0, so
//! every read goes through [`EntryStorage::materialize`], which performs the
//! two-part copy when needed. The arena never checks for overwrites: the
//! dynamic table's byte accounting guarantees live spans are not reused.

use bytes::{Bytes, BytesMut};

use crate::error::HpackError;

/// Location of a byte string inside the arena. May wrap past the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Span {
    pub offset: usize,
    pub len: usize,
}

pub(crate) struct EntryStorage {
    arena: Vec<u8>,
    capacity: usize,
    cursor: usize,
}

impl EntryStorage {
    /// Create storage for `capacity` bytes. No memory is reserved until
    /// [`allocate`](Self::allocate) is called.
    pub fn new(capacity: usize) -> Self {
        Self {
            arena: Vec::new(),
            capacity,
            cursor: 0,
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.arena.len() == self.capacity
    }

    /// Reserve the full physical arena.
    pub fn allocate(&mut self) -> Result<(), HpackError> {
        if self.is_allocated() {
            return Ok(());
        }
        self.arena.try_reserve_exact(self.capacity)?;
        self.arena.resize(self.capacity, 0);
        self.cursor = 0;
        Ok(())
    }

    /// Physical size of the arena in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy `data` in at the write cursor and return where it landed.
    ///
    /// The caller must have accounted for `data.len()` bytes beforehand.
    pub fn write(&mut self, data: &[u8]) -> Span {
        debug_assert!(data.len() <= self.capacity);
        let span = Span {
            offset: self.cursor,
            len: data.len(),
        };
        if data.is_empty() {
            return span;
        }

        let avail = self.capacity - self.cursor;
        if avail >= data.len() {
            self.arena[self.cursor..self.cursor + data.len()].copy_from_slice(data);
            self.cursor += data.len();
        } else {
            let (head, tail) = data.split_at(avail);
            self.arena[self.cursor..].copy_from_slice(head);
            self.arena[..tail.len()].copy_from_slice(tail);
            self.cursor = tail.len();
        }
        if self.cursor == self.capacity {
            self.cursor = 0;
        }
        span
    }

    /// The one or two contiguous regions a span covers.
    fn parts(&self, span: Span) -> (&[u8], &[u8]) {
        if span.len == 0 {
            return (&[], &[]);
        }
        let rest = self.capacity - span.offset;
        if span.len <= rest {
            (&self.arena[span.offset..span.offset + span.len], &[])
        } else {
            (&self.arena[span.offset..], &self.arena[..span.len - rest])
        }
    }

    /// Copy a span out of the arena into an owned buffer.
    pub fn materialize(&self, span: Span) -> Bytes {
        match self.parts(span) {
            (head, []) => Bytes::copy_from_slice(head),
            (head, tail) => {
                let mut buf = BytesMut::with_capacity(span.len);
                buf.extend_from_slice(head);
                buf.extend_from_slice(tail);
                buf.freeze()
            }
        }
    }

    /// Compare a span against `other` without copying.
    pub fn span_eq(&self, span: Span, other: &[u8]) -> bool {
        if span.len != other.len() {
            return false;
        }
        let (head, tail) = self.parts(span);
        other[..head.len()] == *head && other[head.len()..] == *tail
    }
}
