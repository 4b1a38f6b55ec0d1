#![allow(dead_code)]
//! Shared integration test helpers.

use std::collections::VecDeque;
use std::sync::Once;

use ringline_hpack::{ENTRY_OVERHEAD, HeaderField, HeaderTable};

static INIT_LOGGING: Once = Once::new();

/// Route table diagnostics to the test writer. The first call wins.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Straightforward dynamic table the real one is checked against.
/// Newest entry at the front.
#[derive(Debug, Default)]
pub struct ModelTable {
    pub entries: VecDeque<(Vec<u8>, Vec<u8>)>,
    pub size: usize,
    pub max_size: usize,
}

impl ModelTable {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            size: 0,
            max_size,
        }
    }

    fn evict_to(&mut self, limit: usize) {
        while self.size > limit {
            let (name, value) = self.entries.pop_back().expect("size accounted");
            self.size -= name.len() + value.len() + ENTRY_OVERHEAD;
        }
    }

    pub fn insert(&mut self, name: &[u8], value: &[u8]) {
        let cost = name.len() + value.len() + ENTRY_OVERHEAD;
        if cost > self.max_size {
            self.entries.clear();
            self.size = 0;
            return;
        }
        self.evict_to(self.max_size - cost);
        self.entries.push_front((name.to_vec(), value.to_vec()));
        self.size += cost;
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        self.evict_to(max_size);
    }
}

/// Assert every dynamic index of `table` matches `model`, plus the byte
/// accounting invariant.
pub fn assert_matches_model(table: &HeaderTable, model: &ModelTable) {
    assert_eq!(table.len(), model.entries.len());
    assert_eq!(table.size(), model.size);
    assert_eq!(table.max_size(), model.max_size);
    assert_eq!(table.size() + table.free(), table.max_size());

    for (position, (name, value)) in model.entries.iter().enumerate() {
        let field = table
            .get_indexed_header(62 + position, false)
            .expect("live index");
        assert_eq!(field, HeaderField::new(name, value), "position {position}");
    }
    assert!(
        table
            .get_indexed_header(62 + model.entries.len(), false)
            .is_err()
    );
}
