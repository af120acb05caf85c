//! # Tag Ledger
//!
//! Copy-on-write ledger of the tags attached to byte ranges of a packet
//! buffer.
//!
//! All records live packed back-to-back in a single reference-counted byte
//! block; cloning a ledger shares that block without copying a byte. Any
//! mutation first establishes exclusive storage, so sibling clones never
//! observe each other's writes.
//!
//! ## Components
//! - **Codec**: fixed little-endian record layout ([`codec`])
//! - **Storage**: shared, growable byte block (internal)
//! - **Ledger**: append / merge / clear / rebase operations ([`TagLedger`])
//! - **Iterator**: window-filtered record cursor ([`iter`])
//!
//! ## Coordinate Space
//! Record offsets address the *described* buffer's virtual coordinate space,
//! which is stable across prepend/append growth of that buffer. When the
//! buffer's origin shifts, its container forwards the growth event to
//! [`TagLedger::rebase_on_append`] / [`TagLedger::rebase_on_prepend`].
//! Offsets are deliberately *not* corrected when bytes are removed from the
//! buffer: stale offsets are tolerated until the next rebase touches them or
//! the iterator's range filter skips them. Repairing them eagerly would force
//! an unshare on every removal and defeat the sharing scheme.

pub mod codec;
pub mod iter;
mod storage;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{Result, TagError};
use crate::tag::Tag;
use self::codec::{RecordHeader, HEADER_SIZE};
use self::iter::TagIter;
use self::storage::{grown_capacity, StorageBlock};

/// Copy-on-write handle over a shared block of packed tag records.
///
/// A ledger is a value object: clone it to share its records, mutate either
/// clone and the other is unaffected. One ledger is owned by exactly one
/// packet container; the storage behind it is shared by however many clones
/// currently exist.
///
/// # Example
/// ```
/// use packet_tags::TagLedger;
///
/// let mut ledger = TagLedger::new();
/// let payload = ledger.append(7, 2, 10, 20)?;
/// payload.copy_from_slice(&[0xAA, 0xBB]);
///
/// let snapshot = ledger.clone(); // shares storage, copies nothing
/// ledger.append(8, 0, 30, 40)?;  // unshares first; snapshot is unaffected
///
/// assert_eq!(ledger.len(), 2);
/// assert_eq!(snapshot.len(), 1);
/// # Ok::<(), packet_tags::TagError>(())
/// ```
#[derive(Clone)]
pub struct TagLedger {
    storage: Arc<StorageBlock>,
    /// Bytes of `storage` holding records valid *for this handle*. Tracked
    /// per handle, not per block: a clone that diverges keeps its own count.
    used: usize,
}

impl TagLedger {
    /// Create an empty ledger, pointing at the shared zero-capacity sentinel
    /// block.
    pub fn new() -> Self {
        Self {
            storage: StorageBlock::empty(),
            used: 0,
        }
    }

    /// Number of records in this ledger.
    pub fn len(&self) -> usize {
        self.headers().count()
    }

    /// Whether this ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Whether this ledger and `other` currently point at the same storage
    /// block. Observable so sharing behavior stays testable.
    pub fn shares_storage_with(&self, other: &TagLedger) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Append a record annotating the closed byte range `[start, end]` and
    /// return a writable view of exactly `payload_size` bytes for the
    /// caller's serialized payload.
    ///
    /// `start == end` is permitted (a zero-length tag); `start > end` fails
    /// with [`TagError::InvalidRange`]. The returned view reads as zeroes
    /// until written. The caller is responsible for filling it before the
    /// ledger is next read.
    pub fn append(
        &mut self,
        type_id: u32,
        payload_size: u32,
        start: u32,
        end: u32,
    ) -> Result<&mut [u8]> {
        if start > end {
            return Err(TagError::InvalidRange { start, end });
        }
        let header = RecordHeader {
            type_id,
            payload_size,
            start,
            end,
        };
        let record_len = header.record_len();
        self.ensure_exclusive(record_len)?;

        let offset = self.used;
        self.used += record_len;
        trace!(type_id, payload_size, start, end, offset, "tag appended");

        let bytes = self.block_mut().bytes_mut();
        header.encode(&mut bytes[offset..offset + HEADER_SIZE]);
        Ok(&mut bytes[offset + HEADER_SIZE..offset + record_len])
    }

    /// Serialize `tag` and append it in one step.
    ///
    /// Convenience wrapper over [`append`](Self::append) for payload types
    /// implementing [`Tag`]; the ledger itself never interprets the bytes.
    pub fn append_tag<T: Tag>(&mut self, tag: &T, start: u32, end: u32) -> Result<()> {
        let payload = self.append(T::TYPE_ID, tag.serialized_size(), start, end)?;
        tag.serialize(payload);
        Ok(())
    }

    /// Append every record of `other`, verbatim and in order, after this
    /// ledger's own records.
    ///
    /// Implemented as a single raw copy of `other`'s used byte range, not a
    /// record-by-record replay: O(total bytes) and byte-exact, which is what
    /// makes merging ledgers from independently built producers sound.
    pub fn merge(&mut self, other: &TagLedger) -> Result<()> {
        if other.used == 0 {
            return Ok(());
        }
        self.ensure_exclusive(other.used)?;

        let offset = self.used;
        self.used += other.used;
        debug!(bytes = other.used, offset, "ledger merged");

        let src = &other.storage.bytes()[..other.used];
        self.block_mut().bytes_mut()[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    /// Remove all records from this ledger.
    ///
    /// Drops this handle's storage reference and rejoins the empty sentinel;
    /// a sibling clone sharing the old block keeps every one of its records.
    pub fn clear(&mut self) {
        trace!(dropped_bytes = self.used, "ledger cleared");
        self.storage = StorageBlock::empty();
        self.used = 0;
    }

    /// Adjust record offsets after bytes were appended to the described
    /// buffer.
    ///
    /// Every record lying entirely at or beyond `boundary`
    /// (`start >= boundary`) has `delta` added to both offsets. When no
    /// record qualifies, or `delta == 0`, the call is a no-op and — by
    /// contract — does **not** unshare storage.
    pub fn rebase_on_append(&mut self, delta: i32, boundary: u32) -> Result<()> {
        if delta == 0 || !self.is_dirty_at_end(boundary) {
            trace!(delta, boundary, "append rebase is a no-op");
            return Ok(());
        }
        self.ensure_exclusive(0)?;
        debug!(delta, boundary, "rebasing tag offsets after append");
        self.shift_records(delta, |header| header.start >= boundary);
        Ok(())
    }

    /// Adjust record offsets after bytes were prepended to the described
    /// buffer.
    ///
    /// Symmetric to [`rebase_on_append`](Self::rebase_on_append): every
    /// record lying entirely at or before `boundary` (`end <= boundary`)
    /// has `delta` added to both offsets.
    pub fn rebase_on_prepend(&mut self, delta: i32, boundary: u32) -> Result<()> {
        if delta == 0 || !self.is_dirty_at_start(boundary) {
            trace!(delta, boundary, "prepend rebase is a no-op");
            return Ok(());
        }
        self.ensure_exclusive(0)?;
        debug!(delta, boundary, "rebasing tag offsets after prepend");
        self.shift_records(delta, |header| header.end <= boundary);
        Ok(())
    }

    /// Iterate the records whose closed range `[start, end]` overlaps the
    /// closed window `[query_start, query_end]`, in insertion order.
    ///
    /// The iterator borrows this ledger immutably for its whole lifetime, so
    /// mutation during iteration is rejected at compile time.
    pub fn begin(&self, query_start: u32, query_end: u32) -> TagIter<'_> {
        TagIter::new(&self.storage.bytes()[..self.used], query_start, query_end)
    }

    /// Snapshot of this ledger's storage accounting.
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            records: self.len(),
            used_bytes: self.used,
            capacity: self.storage.capacity(),
            // The empty sentinel is permanently shared, so an empty ledger
            // reports shared storage; its first append unshares.
            shared: Arc::strong_count(&self.storage) > 1,
        }
    }

    /// Whether any record would be shifted by an append rebase at `boundary`.
    fn is_dirty_at_end(&self, boundary: u32) -> bool {
        self.headers().any(|header| header.start >= boundary)
    }

    /// Whether any record would be shifted by a prepend rebase at `boundary`.
    fn is_dirty_at_start(&self, boundary: u32) -> bool {
        self.headers().any(|header| header.end <= boundary)
    }

    /// Walk the packed record headers of this ledger's used region.
    fn headers(&self) -> Headers<'_> {
        Headers {
            records: &self.storage.bytes()[..self.used],
        }
    }

    /// Add `delta` to the offsets of every record selected by `affected`,
    /// patching headers in place. Storage must already be exclusive.
    fn shift_records(&mut self, delta: i32, affected: impl Fn(&RecordHeader) -> bool) {
        let used = self.used;
        let bytes = self.block_mut().bytes_mut();
        let mut at = 0;
        while at < used {
            let mut header = RecordHeader::decode(&bytes[at..at + HEADER_SIZE]);
            if affected(&header) {
                // Offsets wrap in the 32-bit virtual coordinate space
                header.start = header.start.wrapping_add_signed(delta);
                header.end = header.end.wrapping_add_signed(delta);
                header.encode(&mut bytes[at..at + HEADER_SIZE]);
            }
            at += header.record_len();
        }
    }

    /// Establish exclusive storage with room for `additional` more bytes.
    ///
    /// Unshares if the block is referenced by any other handle; grows (by
    /// fresh allocation and copy of the used prefix) if capacity is short.
    /// A call that needs neither touches nothing, which is what keeps no-op
    /// rebases from breaking sharing.
    fn ensure_exclusive(&mut self, additional: usize) -> Result<()> {
        let needed = self.used + additional;
        let shared = Arc::strong_count(&self.storage) > 1;
        if !shared && needed <= self.storage.capacity() {
            return Ok(());
        }
        let capacity = if needed > self.storage.capacity() {
            grown_capacity(self.storage.capacity(), needed)
        } else {
            self.storage.capacity()
        };
        let mut fresh = StorageBlock::allocate(capacity)?;
        fresh.bytes_mut()[..self.used].copy_from_slice(&self.storage.bytes()[..self.used]);
        debug!(
            live_bytes = self.used,
            capacity,
            was_shared = shared,
            "tag storage unshared"
        );
        self.storage = Arc::new(fresh);
        Ok(())
    }

    /// Mutable access to the storage block.
    ///
    /// Precondition: [`ensure_exclusive`](Self::ensure_exclusive) succeeded
    /// on this mutation path.
    fn block_mut(&mut self) -> &mut StorageBlock {
        match Arc::get_mut(&mut self.storage) {
            Some(block) => block,
            None => unreachable!("tag storage still shared after unshare"),
        }
    }
}

impl Default for TagLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TagLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagLedger")
            .field("records", &self.len())
            .field("used", &self.used)
            .field("capacity", &self.storage.capacity())
            .field("shared", &(Arc::strong_count(&self.storage) > 1))
            .finish()
    }
}

/// Storage accounting for one ledger handle
#[derive(Debug, Clone, Copy)]
pub struct LedgerStats {
    /// Number of records visible through this handle
    pub records: usize,
    /// Bytes of the block holding this handle's records
    pub used_bytes: usize,
    /// Bytes currently allocated in the block
    pub capacity: usize,
    /// Whether the block is referenced by any other handle
    pub shared: bool,
}

/// Internal header walk, one decoded header per packed record.
struct Headers<'a> {
    records: &'a [u8],
}

impl Iterator for Headers<'_> {
    type Item = RecordHeader;

    fn next(&mut self) -> Option<RecordHeader> {
        if self.records.is_empty() {
            return None;
        }
        let header = RecordHeader::decode(&self.records[..HEADER_SIZE]);
        self.records = &self.records[header.record_len()..];
        Some(header)
    }
}
