use crate::error::HpackError;

/// Default maximum dynamic table size (SETTINGS_HEADER_TABLE_SIZE default).
pub const DEFAULT_MAX_TABLE_SIZE: usize = 4096;

/// Descriptor slots allocated on first insertion and added on each growth.
pub const DEFAULT_SLOT_STEP: usize = 64;

/// Sizing for a [`HeaderTable`](crate::HeaderTable).
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Protocol maximum for the dynamic table, in bytes. This is also the
    /// physical size of the byte arena; size updates above it are rejected.
    /// Default: 4096.
    pub max_table_size: usize,
    /// Number of entry descriptor slots allocated on first insertion.
    /// Default: 64.
    pub initial_slots: usize,
    /// Number of descriptor slots added when every slot holds a live entry.
    /// Default: 64.
    pub slot_growth: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_table_size: DEFAULT_MAX_TABLE_SIZE,
            initial_slots: DEFAULT_SLOT_STEP,
            slot_growth: DEFAULT_SLOT_STEP,
        }
    }
}

impl TableConfig {
    /// Validate configuration values. Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<(), HpackError> {
        if self.initial_slots == 0 {
            return Err(HpackError::InvalidConfig(
                "initial_slots must be non-zero".into(),
            ));
        }
        if self.slot_growth == 0 {
            return Err(HpackError::InvalidConfig(
                "slot_growth must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
