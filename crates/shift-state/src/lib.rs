//! shift-state: shift-partitioned document store for ControlShift.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for faults, planned works, general notes and shift details, all
//! partitioned by [`shift_core::ShiftKey`].
//!
//! # Architecture
//!
//! Records are JSON-serialized into redb's `&[u8]` value columns and keyed
//! by a server-assigned id. Each partitioned record type also has an index
//! table keyed `{shift}/{created_at:020}/{id}`, so reading a partition
//! newest-first is a reverse range scan.
//!
//! Every committed change is published to the live [`feed`]: subscribers
//! registered for that partition and collection receive the full fresh
//! snapshot. The `StateStore` is `Clone` + `Send` + `Sync` and can be
//! shared across async tasks.

pub mod error;
pub mod feed;
pub mod record;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use feed::{Collection, Subscription};
pub use store::StateStore;
