//! hoopline-store: durable per-entity cache for fetched records
//!
//! Every fetched record set is written once to its own file, keyed by
//! (partition, kind, id). The presence of that file is both the
//! idempotence check and the resume checkpoint.

pub mod error;
pub mod key;
pub mod kind;
pub mod record;
pub mod resolve;
pub mod store;

pub use error::{ResolveError, StoreError};
pub use key::{EntityId, InvalidPartition, Partition};
pub use kind::EntityKind;
pub use record::RecordSet;
pub use resolve::derive_ids;
pub use store::{CacheEntry, Entries, EntityStore};
