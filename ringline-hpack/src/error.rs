use thiserror::Error;

/// HTTP/2 `INTERNAL_ERROR` (RFC 7540 Section 7).
pub const INTERNAL_ERROR: u32 = 0x2;
/// HTTP/2 `COMPRESSION_ERROR` (RFC 7540 Section 7).
pub const COMPRESSION_ERROR: u32 = 0x9;

/// Errors produced by the HPACK header table.
///
/// Every variant is fatal to the header block being processed. The frame
/// layer is expected to tear down the connection with [`error_code`].
///
/// [`error_code`]: HpackError::error_code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HpackError {
    /// The peer referenced index 0, which never names an entry.
    #[error("invalid hpack table index 0")]
    InvalidIndex,
    /// The peer referenced a dynamic entry past the live range.
    #[error("out of bound hpack table index: {index} (live dynamic entries: {live})")]
    OutOfBounds { index: usize, live: usize },
    /// A dynamic table size update exceeded the protocol maximum.
    #[error("invalid table size update: {requested} exceeds maximum {max}")]
    IllegalSizeUpdate { requested: usize, max: usize },
    /// Backing memory for the table could not be reserved.
    #[error("hpack table allocation failed")]
    AllocationFailure,
    /// Table configuration rejected by validation.
    #[error("invalid table config: {0}")]
    InvalidConfig(String),
}

impl HpackError {
    /// HTTP/2 error code the connection should be closed with.
    pub fn error_code(&self) -> u32 {
        match self {
            Self::InvalidIndex | Self::OutOfBounds { .. } | Self::IllegalSizeUpdate { .. } => {
                COMPRESSION_ERROR
            }
            Self::AllocationFailure | Self::InvalidConfig(_) => INTERNAL_ERROR,
        }
    }
}

impl From<std::collections::TryReserveError> for HpackError {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::AllocationFailure
    }
}
