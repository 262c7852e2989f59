//! # Storage Module
//!
//! Embedded, transactional persistence using redb.
//!
//! redb provides:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Values are header-framed postcard records from [`crate::formats`].

mod redb_store;

pub use redb_store::{Store, StoreError, StoreStats};
