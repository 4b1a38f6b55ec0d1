//! Circular array of entry descriptors.
//!
//! Slots are addressed by monotonic counters taken modulo the slot count:
//! `deleted..inserted` are the live entries (oldest first), and
//! `reused..deleted` are evicted slots whose descriptors may be recycled.
//! The live length is always derived from the counters, never stored.

use crate::error::HpackError;
use crate::storage::Span;

/// Name and value spans of one dynamic entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct EntryDescriptor {
    pub name: Span,
    pub value: Span,
}

impl EntryDescriptor {
    /// Bytes this entry is charged against the table budget.
    pub fn size(&self) -> usize {
        self.name.len + self.value.len + crate::ENTRY_OVERHEAD
    }
}

pub(crate) struct EntryIndex {
    slots: Vec<EntryDescriptor>,
    inserted: usize,
    deleted: usize,
    reused: usize,
    initial_slots: usize,
    growth: usize,
    grow_events: u64,
}

impl EntryIndex {
    pub fn new(initial_slots: usize, growth: usize) -> Self {
        Self {
            slots: Vec::new(),
            inserted: 0,
            deleted: 0,
            reused: 0,
            initial_slots,
            growth,
            grow_events: 0,
        }
    }

    /// Reserve the initial slot array. No-op once allocated.
    pub fn allocate(&mut self) -> Result<(), HpackError> {
        if !self.slots.is_empty() {
            return Ok(());
        }
        self.slots.try_reserve_exact(self.initial_slots)?;
        self.slots.resize(self.initial_slots, EntryDescriptor::default());
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.inserted - self.deleted
    }

    pub fn grow_events(&self) -> u64 {
        self.grow_events
    }

    #[cfg(test)]
    pub fn counters(&self) -> (usize, usize, usize) {
        (self.inserted, self.deleted, self.reused)
    }

    /// Descriptor at logical position `position`, where 0 is the newest entry.
    pub fn get(&self, position: usize) -> Option<&EntryDescriptor> {
        if position >= self.len() {
            return None;
        }
        let slot = (self.inserted - position - 1) % self.slots.len();
        Some(&self.slots[slot])
    }

    /// Evict the oldest live entry, returning its descriptor.
    pub fn pop_oldest(&mut self) -> Option<EntryDescriptor> {
        if self.len() == 0 {
            return None;
        }
        let entry = self.slots[self.deleted % self.slots.len()];
        self.deleted += 1;
        Some(entry)
    }

    /// Evict every live entry at once.
    pub fn clear(&mut self) {
        self.deleted = self.inserted;
    }

    /// Obtain a descriptor for a new entry, recycling an evicted slot when
    /// one is available.
    pub fn acquire(&mut self) -> EntryDescriptor {
        if self.reused == self.deleted {
            return EntryDescriptor::default();
        }
        let recycled = self.slots[self.reused % self.slots.len()];
        self.reused += 1;
        recycled
    }

    /// Make room for one more live entry, growing the slot array when every
    /// slot is live. On failure the ring is left as it was.
    pub fn reserve(&mut self) -> Result<(), HpackError> {
        if self.slots.len() == self.len() {
            self.grow()?;
        }
        Ok(())
    }

    /// Append `entry` as the newest live entry.
    pub fn push(&mut self, entry: EntryDescriptor) -> Result<(), HpackError> {
        self.reserve()?;
        let slot = self.inserted % self.slots.len();
        self.slots[slot] = entry;
        self.inserted += 1;
        Ok(())
    }

    fn grow(&mut self) -> Result<(), HpackError> {
        let capacity = self.slots.len();
        let new_capacity = capacity
            .checked_add(self.growth)
            .ok_or(HpackError::AllocationFailure)?;
        let mut grown = Vec::new();
        grown.try_reserve_exact(new_capacity)?;

        // Unroll the ring so the oldest live entry lands in slot 0.
        let start = if capacity == 0 {
            0
        } else {
            self.deleted % capacity
        };
        grown.extend_from_slice(&self.slots[start..]);
        grown.extend_from_slice(&self.slots[..start]);
        grown.resize(new_capacity, EntryDescriptor::default());

        self.slots = grown;
        self.inserted = capacity;
        self.deleted = 0;
        self.reused = 0;
        self.grow_events += 1;

        tracing::debug!(
            capacity = self.slots.len(),
            live = capacity,
            "hpack entry index grown"
        );
        Ok(())
    }
}
