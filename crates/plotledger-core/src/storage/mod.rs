//! # Persistent Storage
//!
//! Disk-backed ledger storage using the redb embedded database.

pub mod redb_ledger;

pub use redb_ledger::RedbLedger;
