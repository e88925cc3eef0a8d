//! # kinship: cached membership relations
//!
//! A caching layer for set-valued relations: one owner tracks its membership
//! in a relation to other items, persisted in a durable store but queried far
//! more often than it changes. Each owner instance holds a lazily loaded
//! [`CacheList`] per relation; every mutation writes the store first and the
//! cache second, so reads after a mutation are served in memory without a
//! store round-trip.
//!
//! Relations may be polymorphic (type-tagged items) or self-referential
//! (owner and item types coincide), the latter exposing independent outgoing
//! and incoming projections over the same rows. Caches are private to one
//! owner instance within one process; drift from out-of-band store writes is
//! corrected only by an explicit reset.

pub mod binding;
pub mod cache;
pub mod descriptor;
pub mod error;
pub mod item;
pub mod registry;
pub mod store;

// Re-export core types
pub use binding::*;
pub use cache::*;
pub use descriptor::*;
pub use error::*;
pub use item::*;
pub use registry::*;
pub use store::{MemoryStore, PostgresStore, RelationRow, RelationStore, StoreResult};
