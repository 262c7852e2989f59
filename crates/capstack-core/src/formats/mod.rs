//! # Formats Module
//!
//! Binary encoding for everything the store persists.
//!
//! This module contains:
//! - The snapshot header (magic, format version, record kind)
//! - postcard encode/decode of typed records
//! - The persisted record types (users, allocation and emergency snapshots)
//!
//! File and database I/O live in [`crate::storage`]; this module only
//! converts between values and bytes.

mod persistence;
mod records;

pub use persistence::*;
pub use records::*;
