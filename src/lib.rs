//! # Packet Tags
//!
//! Packed, reference-counted, copy-on-write ledger for the metadata tags a
//! packet simulation attaches to byte ranges of a packet's payload buffer.
//!
//! A [`TagLedger`] stores every tag of one packet as a packed binary record
//! (type id, payload size, start, end, payload bytes) inside a single shared
//! storage block. Cloning a packet clones its ledger in O(1) by sharing the
//! block; any mutation lazily unshares first, so clones never observe each
//! other's writes.
//!
//! ## Components
//! - **Record codec** ([`ledger::codec`]): stable little-endian record
//!   layout, merge-compatible across independent builds
//! - **Tag ledger** ([`TagLedger`]): append, merge, clear and
//!   offset-rebasing over shared storage
//! - **Range iterator** ([`TagIter`]): single-pass cursor over the records
//!   overlapping a query window
//! - **Tag contract** ([`Tag`]): how payload types serialize themselves into
//!   the slice the ledger hands out
//!
//! ## Coordinate Space
//! Tag offsets live in the described buffer's virtual coordinate space,
//! stable across growth at either end of that buffer. The packet container
//! forwards buffer growth events to [`TagLedger::rebase_on_append`] and
//! [`TagLedger::rebase_on_prepend`]; removals are deliberately not tracked
//! (stale offsets are filtered lazily at iteration time).
//!
//! ## Concurrency
//! A ledger is a single-threaded value object: no interior locking, no
//! blocking, `&mut self` on every mutator. Storage sharing uses `Arc`, so
//! clones may safely be read from other threads; concurrent mutation of one
//! handle needs external synchronization by design.

pub mod error;
pub mod ledger;
pub mod tag;

pub use error::{Result, TagError};
pub use ledger::codec::{RecordHeader, HEADER_SIZE};
pub use ledger::iter::{TagIter, TagView};
pub use ledger::{LedgerStats, TagLedger};
pub use tag::Tag;
