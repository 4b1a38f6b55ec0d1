//! Unified HPACK index space over the static and dynamic tables.

use bytes::Bytes;
use tracing::{debug, info};

use crate::config::TableConfig;
use crate::dynamic::{DynamicTable, TableStats};
use crate::error::HpackError;
use crate::static_table::{self, STATIC_TABLE_LEN};

/// A single header name-value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: Bytes,
    pub value: Bytes,
}

impl HeaderField {
    pub fn new(name: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Self {
        Self {
            name: Bytes::copy_from_slice(name.as_ref()),
            value: Bytes::copy_from_slice(value.as_ref()),
        }
    }

    /// Size of this header field for dynamic table accounting (RFC 7541 Section 4.1).
    /// Size = len(name) + len(value) + 32
    pub fn size(&self) -> usize {
        self.name.len() + self.value.len() + crate::ENTRY_OVERHEAD
    }
}

/// Result of searching the header table for a field to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMatch {
    /// Name and value both match the entry at this index.
    Full(usize),
    /// Only the name matches the entry at this index.
    Name(usize),
}

/// HPACK header table for one connection.
///
/// Indices 1..=61 address the static table; 62 and above address the
/// dynamic table, newest entry first.
pub struct HeaderTable {
    dynamic: DynamicTable,
}

impl Default for HeaderTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderTable {
    /// Create a table with the default 4096-byte protocol maximum.
    pub fn new() -> Self {
        Self {
            dynamic: DynamicTable::new(&TableConfig::default()),
        }
    }

    pub fn with_config(config: TableConfig) -> Result<Self, HpackError> {
        config.validate()?;
        Ok(Self {
            dynamic: DynamicTable::new(&config),
        })
    }

    /// Resolve `index` to a header field.
    ///
    /// For dynamic entries the value is left empty when `name_only` is set.
    /// Static entries always carry both fields.
    pub fn get_indexed_header(
        &self,
        index: usize,
        name_only: bool,
    ) -> Result<HeaderField, HpackError> {
        if index == 0 {
            info!("client sent invalid hpack table index 0");
            return Err(HpackError::InvalidIndex);
        }

        debug!(index, name_only, "http2 get indexed header");

        if let Some((name, value)) = static_table::lookup(index) {
            return Ok(HeaderField {
                name: Bytes::from_static(name),
                value: Bytes::from_static(value),
            });
        }

        let position = index - STATIC_TABLE_LEN - 1;
        self.dynamic.get(position, name_only).ok_or_else(|| {
            let live = self.dynamic.len();
            info!(index, live, "client sent out of bound hpack table index");
            HpackError::OutOfBounds { index, live }
        })
    }

    /// Insert a header into the dynamic table.
    ///
    /// A header too large for the current size limit is dropped (and
    /// empties the table) without error.
    pub fn add_header(&mut self, header: &HeaderField) -> Result<(), HpackError> {
        debug!(
            name = %String::from_utf8_lossy(&header.name),
            value = %String::from_utf8_lossy(&header.value),
            "http2 add header to hpack table"
        );
        self.dynamic.insert(&header.name, &header.value)
    }

    /// Apply a dynamic table size update from the peer.
    pub fn set_max_size(&mut self, size: usize) -> Result<(), HpackError> {
        self.dynamic.set_max_size(size)
    }

    /// Find the best index for encoding `name: value`.
    ///
    /// Exact matches win over name matches, and the static table wins over
    /// the dynamic table within each kind.
    pub fn find(&self, name: &[u8], value: &[u8]) -> Option<TableMatch> {
        if let Some(index) = static_table::find_name_value(name, value) {
            return Some(TableMatch::Full(index));
        }
        let (full, by_name) = self.dynamic.find(name, value);
        if let Some(position) = full {
            return Some(TableMatch::Full(position + STATIC_TABLE_LEN + 1));
        }
        static_table::find_name(name)
            .or_else(|| by_name.map(|position| position + STATIC_TABLE_LEN + 1))
            .map(TableMatch::Name)
    }

    /// Live dynamic entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = HeaderField> + '_ {
        (0..self.dynamic.len()).filter_map(move |position| self.dynamic.get(position, false))
    }

    /// Number of live dynamic entries.
    pub fn len(&self) -> usize {
        self.dynamic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dynamic.len() == 0
    }

    /// Bytes charged by live dynamic entries.
    pub fn size(&self) -> usize {
        self.dynamic.size()
    }

    /// Current dynamic table size limit.
    pub fn max_size(&self) -> usize {
        self.dynamic.max_size()
    }

    /// Budget remaining under the current limit.
    pub fn free(&self) -> usize {
        self.dynamic.free()
    }

    /// Largest size a size update may request.
    pub fn protocol_max_size(&self) -> usize {
        self.dynamic.capacity()
    }

    pub fn stats(&self) -> TableStats {
        self.dynamic.stats()
    }
}
