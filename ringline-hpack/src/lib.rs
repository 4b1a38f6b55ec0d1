//! HPACK header table for HTTP/2 connections (RFC 7541).
//!
//! This crate owns the indexing side of HPACK: the 61-entry static table and
//! a per-connection dynamic table, exposed through one index space. Wire
//! parsing and Huffman coding live in the codec that drives it; the table
//! only stores, indexes, retrieves and evicts name/value byte pairs.
//!
//! # Architecture
//!
//! ```text
//!   header block bytes
//!        |
//!   +----v----------+
//!   | HPACK codec   |  integers, literals, Huffman
//!   +----+----------+
//!        | index / literal
//!   +----v----------+
//!   | HeaderTable   |  1..=61 static, 62.. dynamic (newest first)
//!   +----+----------+
//!        |
//!   +----v----------+   +---------------+
//!   | EntryIndex    |-->| EntryStorage  |  circular byte arena
//!   +---------------+   +---------------+
//! ```
//!
//! The dynamic table keeps its bytes in a fixed arena sized to the protocol
//! maximum and its descriptors in a ring that grows in steps of 64 slots.
//! Retrieved fields are owned [`Bytes`](bytes::Bytes) copies, independent of
//! later insertions.
//!
//! # Example
//!
//! ```rust
//! use ringline_hpack::{HeaderField, HeaderTable};
//!
//! let mut table = HeaderTable::new();
//!
//! // Literal with incremental indexing.
//! table.add_header(&HeaderField::new(b"x-request-id", b"abc123"))?;
//!
//! // Static and dynamic lookups share one index space.
//! assert_eq!(table.get_indexed_header(2, false)?, HeaderField::new(b":method", b"GET"));
//! assert_eq!(
//!     table.get_indexed_header(62, false)?,
//!     HeaderField::new(b"x-request-id", b"abc123"),
//! );
//!
//! // Dynamic table size update from the peer.
//! table.set_max_size(0)?;
//! assert!(table.is_empty());
//! # Ok::<(), ringline_hpack::HpackError>(())
//! ```

pub mod config;
mod dynamic;
pub mod error;
mod index;
pub mod static_table;
mod storage;
mod table;

/// Bytes charged per dynamic entry on top of its name and value
/// (RFC 7541 Section 4.1).
pub const ENTRY_OVERHEAD: usize = 32;

pub use config::{DEFAULT_MAX_TABLE_SIZE, TableConfig};
pub use dynamic::TableStats;
pub use error::HpackError;
pub use static_table::STATIC_TABLE_LEN;
pub use table::{HeaderField, HeaderTable, TableMatch};
