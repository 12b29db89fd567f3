// crates/quill-store/src/lib.rs
//
// quill-store: Storage layer for Quill.
//
// Provides a RocksDB `TransactionDB`-backed store implementing the trust,
// feed, and content traits from quill-core. Every trait operation runs in
// a single pessimistic transaction, which is what makes insert-if-absent
// and upsert race-free without any lock held across requests.

pub mod rocks;

// Re-export key types for ergonomic access from downstream crates.
pub use rocks::RocksStore;
