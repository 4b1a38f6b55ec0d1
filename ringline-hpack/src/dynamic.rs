//! HPACK dynamic table (RFC 7541 Section 2.3.2).
//!
//! Composes the byte arena and the descriptor ring. Every live entry is
//! charged `name.len() + value.len() + 32` bytes against `limit`; `free`
//! is whatever remains. Eviction always takes the oldest entry, which is
//! what keeps live spans from being overwritten in the arena: the live
//! bytes never exceed `limit`, and `limit` never exceeds the arena.

use bytes::Bytes;
use tracing::{debug, info, trace};

use crate::ENTRY_OVERHEAD;
use crate::config::TableConfig;
use crate::error::HpackError;
use crate::index::EntryIndex;
use crate::storage::EntryStorage;
use crate::table::HeaderField;

/// Point-in-time counters describing a dynamic table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Live dynamic entries.
    pub entries: usize,
    /// Bytes charged by live entries, overhead included.
    pub size: usize,
    /// Current negotiated size limit.
    pub max_size: usize,
    /// Entries ever inserted.
    pub inserted: u64,
    /// Entries ever evicted.
    pub evicted: u64,
    /// Inserts dropped because the entry exceeded the size limit.
    pub declined: u64,
    /// Descriptor slots currently allocated.
    pub slots: usize,
    /// Times the descriptor array has grown.
    pub slot_grow_events: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Account {
    Fits,
    Declined,
}

pub(crate) struct DynamicTable {
    storage: EntryStorage,
    index: EntryIndex,
    limit: usize,
    free: usize,
    inserted: u64,
    evicted: u64,
    declined: u64,
}

impl DynamicTable {
    pub fn new(config: &TableConfig) -> Self {
        Self {
            storage: EntryStorage::new(config.max_table_size),
            index: EntryIndex::new(config.initial_slots, config.slot_growth),
            limit: config.max_table_size,
            free: config.max_table_size,
            inserted: 0,
            evicted: 0,
            declined: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Bytes charged by live entries.
    pub fn size(&self) -> usize {
        self.limit - self.free
    }

    pub fn max_size(&self) -> usize {
        self.limit
    }

    pub fn free(&self) -> usize {
        self.free
    }

    /// Protocol maximum: the physical arena size.
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            entries: self.len(),
            size: self.size(),
            max_size: self.limit,
            inserted: self.inserted,
            evicted: self.evicted,
            declined: self.declined,
            slots: self.index.capacity(),
            slot_grow_events: self.index.grow_events(),
        }
    }

    fn evict_oldest(&mut self) -> bool {
        match self.index.pop_oldest() {
            Some(entry) => {
                self.free += entry.size();
                self.evicted += 1;
                trace!(size = entry.size(), free = self.free, "hpack table evict");
                true
            }
            None => false,
        }
    }

    /// Charge `size` bytes against the budget, evicting oldest entries
    /// until it fits.
    fn account(&mut self, size: usize) -> Account {
        trace!(size, free = self.free, "hpack table account");

        if size <= self.free {
            self.free -= size;
            return Account::Fits;
        }

        if size > self.limit {
            self.evicted += self.index.len() as u64;
            self.index.clear();
            self.free = self.limit;
            return Account::Declined;
        }

        while size > self.free {
            if !self.evict_oldest() {
                break;
            }
        }
        debug_assert!(size <= self.free);
        self.free -= size;
        Account::Fits
    }

    /// Insert a new entry as the newest in the table.
    ///
    /// An entry larger than the current limit empties the table and is not
    /// stored. That is not an error.
    pub fn insert(&mut self, name: &[u8], value: &[u8]) -> Result<(), HpackError> {
        self.storage.allocate()?;
        self.index.allocate()?;

        let size = name.len() + value.len() + ENTRY_OVERHEAD;
        if self.account(size) == Account::Declined {
            self.declined += 1;
            debug!(
                size,
                max_size = self.limit,
                "hpack header exceeds table size, not indexed"
            );
            return Ok(());
        }

        // Grow the slot ring before touching the arena so a failed
        // allocation leaves the budget consistent with the live entries.
        if let Err(err) = self.index.reserve() {
            self.free += size;
            return Err(err);
        }

        let mut entry = self.index.acquire();
        entry.name = self.storage.write(name);
        entry.value = self.storage.write(value);
        self.index.push(entry)?;
        self.inserted += 1;
        Ok(())
    }

    /// Materialize the entry at `position` (0 = newest). The value is left
    /// empty when `name_only` is set.
    pub fn get(&self, position: usize, name_only: bool) -> Option<HeaderField> {
        let entry = self.index.get(position)?;
        let name = self.storage.materialize(entry.name);
        let value = if name_only {
            Bytes::new()
        } else {
            self.storage.materialize(entry.value)
        };
        Some(HeaderField { name, value })
    }

    /// Search newest-first. Returns the position of the first exact match,
    /// or failing that the position of the first entry with the same name.
    pub fn find(&self, name: &[u8], value: &[u8]) -> (Option<usize>, Option<usize>) {
        let mut name_match = None;
        for position in 0..self.len() {
            let Some(entry) = self.index.get(position) else {
                break;
            };
            if !self.storage.span_eq(entry.name, name) {
                continue;
            }
            if self.storage.span_eq(entry.value, value) {
                return (Some(position), name_match.or(Some(position)));
            }
            name_match.get_or_insert(position);
        }
        (None, name_match)
    }

    /// Apply a dynamic table size update.
    pub fn set_max_size(&mut self, size: usize) -> Result<(), HpackError> {
        let max = self.storage.capacity();
        if size > max {
            info!(requested = size, max, "client sent invalid table size update");
            return Err(HpackError::IllegalSizeUpdate {
                requested: size,
                max,
            });
        }

        debug!(size, was = self.limit, "http2 new hpack table size");

        if size < self.limit {
            let needed = self.limit - size;
            while needed > self.free {
                if !self.evict_oldest() {
                    break;
                }
            }
            debug_assert!(needed <= self.free);
            self.free -= needed;
        } else {
            self.free += size - self.limit;
        }
        self.limit = size;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DynamicTable {
        DynamicTable::new(&TableConfig::default())
    }

    fn assert_budget(t: &DynamicTable) {
        let charged: usize = (0..t.len())
            .map(|p| t.index.get(p).unwrap().size())
            .sum();
        assert_eq!(charged + t.free, t.limit);
    }

    fn names(t: &DynamicTable) -> Vec<Bytes> {
        (0..t.len()).map(|p| t.get(p, true).unwrap().name).collect()
    }

    #[test]
    fn account_fits_without_eviction() {
        let mut t = table();
        t.insert(b"custom-key", b"custom-header").unwrap();
        // RFC 7541 C.3.1 style sizing: 10 + 13 + 32.
        assert_eq!(t.size(), 55);
        assert_eq!(t.free(), 4096 - 55);
        assert_eq!(t.len(), 1);
        assert_budget(&t);
    }

    #[test]
    fn eviction_is_oldest_first() {
        let mut t = table();
        t.set_max_size(100).unwrap();
        t.insert(b"a", b"1111111111").unwrap(); // 43
        t.insert(b"b", b"2222222222").unwrap(); // 43
        assert_eq!(t.len(), 2);
        t.insert(b"c", b"3333333333").unwrap(); // evicts "a"
        assert_eq!(names(&t), vec![Bytes::from_static(b"c"), Bytes::from_static(b"b")]);
        assert_eq!(t.stats().evicted, 1);
        assert_budget(&t);
    }

    #[test]
    fn oversized_entry_declined_and_table_emptied() {
        let mut t = table();
        t.set_max_size(64).unwrap();
        t.insert(b"k", b"v").unwrap();
        let big = vec![b'x'; 40];
        t.insert(b"big", &big).unwrap();
        assert_eq!(t.len(), 0);
        assert_eq!(t.free(), 64);
        assert_eq!(t.stats().declined, 1);
        assert_budget(&t);
    }

    #[test]
    fn oversized_entry_on_empty_table_changes_nothing() {
        let mut t = table();
        let big = vec![b'x'; 4096];
        t.insert(b"big", &big).unwrap();
        assert_eq!(t.len(), 0);
        assert_eq!(t.size(), 0);
        assert_eq!(t.free(), 4096);
    }

    #[test]
    fn shrink_to_zero_then_grow() {
        let mut t = table();
        for i in 0..10u8 {
            t.insert(&[b'n', i], b"value").unwrap();
        }
        t.set_max_size(0).unwrap();
        assert_eq!(t.len(), 0);
        assert_eq!(t.free(), 0);
        assert_eq!(t.max_size(), 0);

        t.set_max_size(4096).unwrap();
        assert_eq!(t.len(), 0);
        assert_eq!(t.free(), 4096);
        t.insert(b"fresh", b"entry").unwrap();
        assert_eq!(names(&t), vec![Bytes::from_static(b"fresh")]);
        assert_budget(&t);
    }

    #[test]
    fn shrink_evicts_only_what_is_needed() {
        let mut t = table();
        t.insert(b"a", b"1").unwrap(); // 34
        t.insert(b"b", b"2").unwrap(); // 34
        t.insert(b"c", b"3").unwrap(); // 34
        t.set_max_size(70).unwrap();
        assert_eq!(names(&t), vec![Bytes::from_static(b"c"), Bytes::from_static(b"b")]);
        assert_eq!(t.free(), 2);
        assert_budget(&t);
    }

    #[test]
    fn grow_never_evicts() {
        let mut t = table();
        t.set_max_size(100).unwrap();
        t.insert(b"a", b"1").unwrap();
        t.insert(b"b", b"2").unwrap();
        t.set_max_size(4000).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.free(), 4000 - 68);
        assert_budget(&t);
    }

    #[test]
    fn size_update_above_arena_rejected() {
        let mut t = table();
        assert_eq!(
            t.set_max_size(4097),
            Err(HpackError::IllegalSizeUpdate {
                requested: 4097,
                max: 4096
            })
        );
        assert_eq!(t.max_size(), 4096);
    }

    #[test]
    fn size_update_before_first_insert() {
        let mut t = table();
        t.set_max_size(256).unwrap();
        assert_eq!(t.free(), 256);
        t.insert(b"k", b"v").unwrap();
        assert_eq!(t.max_size(), 256);
        assert_eq!(t.free(), 256 - 34);
    }

    #[test]
    fn failed_slot_growth_keeps_budget() {
        let mut t = DynamicTable::new(&TableConfig {
            initial_slots: 2,
            slot_growth: usize::MAX,
            ..Default::default()
        });
        t.insert(b"k0", b"v").unwrap();
        t.insert(b"k1", b"v").unwrap();

        assert_eq!(t.insert(b"k2", b"v"), Err(HpackError::AllocationFailure));
        assert_eq!(t.len(), 2);
        assert_eq!(t.size(), 2 * 35);
        assert_budget(&t);
        assert_eq!(t.get(0, true).unwrap().name, Bytes::from_static(b"k1"));
        assert_eq!(t.get(1, true).unwrap().name, Bytes::from_static(b"k0"));
    }

    #[test]
    fn name_only_skips_value() {
        let mut t = table();
        t.insert(b"name", b"value").unwrap();
        let field = t.get(0, true).unwrap();
        assert_eq!(field.name, Bytes::from_static(b"name"));
        assert!(field.value.is_empty());
        let field = t.get(0, false).unwrap();
        assert_eq!(field.value, Bytes::from_static(b"value"));
        assert!(t.get(1, false).is_none());
    }

    #[test]
    fn find_prefers_exact_match() {
        let mut t = table();
        t.insert(b"x-id", b"1").unwrap();
        t.insert(b"x-id", b"2").unwrap();
        t.insert(b"x-other", b"1").unwrap();
        assert_eq!(t.find(b"x-id", b"1"), (Some(2), Some(1)));
        assert_eq!(t.find(b"x-id", b"2"), (Some(1), Some(1)));
        assert_eq!(t.find(b"x-id", b"3"), (None, Some(1)));
        assert_eq!(t.find(b"nope", b"1"), (None, None));
    }

    #[test]
    fn wrapped_entries_read_back() {
        let mut t = table();
        let value = |i: u8| {
            let mut v = vec![b'v'; 300];
            v[0] = i;
            v[299] = i;
            v
        };
        // 334 bytes per entry: the cursor laps the 4096-byte arena.
        for i in 0..40u8 {
            t.insert(&[b'k', i], &value(i)).unwrap();
            assert_budget(&t);
        }
        let newest = t.get(0, false).unwrap();
        assert_eq!(newest.name, Bytes::from(vec![b'k', 39]));
        assert_eq!(newest.value, Bytes::from(value(39)));
        for p in 0..t.len() {
            let field = t.get(p, false).unwrap();
            let i = 39 - p as u8;
            assert_eq!(field.name[1], i);
            assert_eq!(field.value.len(), 300);
            assert_eq!(field.value[0], i);
            assert_eq!(field.value[299], i);
        }
    }
}
