//! # Range Iterator
//!
//! Single-pass, forward-only walk over the packed records of one ledger,
//! filtered to a queried coordinate window.
//!
//! ## Overlap Convention
//! Record offsets form closed intervals. A record `[start, end]` is yielded
//! iff it overlaps the closed query window `[query_start, query_end]`:
//!
//! ```text
//! start <= query_end && end >= query_start
//! ```
//!
//! Boundary-touching records and zero-length records (`start == end`) sitting
//! on a window edge are therefore included. This filter is also what makes
//! stale offsets harmless: a record whose range drifted outside the caller's
//! current view is silently skipped rather than eagerly rewritten.
//!
//! The iterator borrows the ledger for its whole lifetime, so mutating the
//! ledger while an iterator over it is alive does not compile.

use crate::error::{Result, TagError};
use crate::ledger::codec::{RecordHeader, HEADER_SIZE};
use crate::tag::Tag;

/// One tag record as seen through a query window.
#[derive(Debug, Clone, Copy)]
pub struct TagView<'a> {
    /// Opaque identifier of the tag's registered payload type
    pub type_id: u32,
    /// Byte length of the serialized payload
    pub payload_size: u32,
    /// First tagged byte, inclusive, in buffer coordinates
    pub start: u32,
    /// Last tagged byte, inclusive, in buffer coordinates
    pub end: u32,
    window_start: u32,
    payload: &'a [u8],
}

impl<'a> TagView<'a> {
    /// The record's serialized payload bytes, exactly `payload_size` long.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// The record's start offset clipped into the query window:
    /// `max(start, query_start)`.
    ///
    /// Lets callers map a possibly stale absolute range onto the byte range
    /// actually visible in their current view of the buffer.
    pub fn effective_start(&self) -> u32 {
        self.start.max(self.window_start)
    }

    /// Whether this record carries a payload of tag type `T`.
    pub fn is<T: Tag>(&self) -> bool {
        self.type_id == T::TYPE_ID
    }

    /// Deserialize the payload as tag type `T`.
    ///
    /// Dispatch on [`type_id`](Self::type_id) (or [`is`](Self::is)) first;
    /// decoding a payload under the wrong type is a caller error.
    pub fn decode<T: Tag>(&self) -> Result<T> {
        T::deserialize(self.payload)
    }
}

/// Lazy cursor over the records of one ledger overlapping a query window.
///
/// Produced by [`TagLedger::begin`](crate::TagLedger::begin). Yields records
/// in insertion order restricted to the filter; finite and non-restartable.
pub struct TagIter<'a> {
    records: &'a [u8],
    window_start: u32,
    window_end: u32,
    // Lookahead so has_next() is a cheap flag test
    next: Option<(RecordHeader, &'a [u8])>,
}

impl<'a> TagIter<'a> {
    pub(crate) fn new(records: &'a [u8], window_start: u32, window_end: u32) -> Self {
        let mut iter = Self {
            records,
            window_start,
            window_end,
            next: None,
        };
        iter.advance();
        iter
    }

    /// Skip forward to the next record overlapping the window, if any.
    fn advance(&mut self) {
        self.next = None;
        while !self.records.is_empty() {
            let header = RecordHeader::decode(&self.records[..HEADER_SIZE]);
            let record_len = header.record_len();
            let payload = &self.records[HEADER_SIZE..record_len];
            self.records = &self.records[record_len..];
            if header.start <= self.window_end && header.end >= self.window_start {
                self.next = Some((header, payload));
                return;
            }
        }
    }

    /// Whether another record overlapping the window remains.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Yield the next overlapping record.
    ///
    /// Fails with [`TagError::IteratorExhausted`] when called after
    /// [`has_next`](Self::has_next) turned false.
    pub fn next_tag(&mut self) -> Result<TagView<'a>> {
        let (header, payload) = self.next.take().ok_or(TagError::IteratorExhausted)?;
        self.advance();
        Ok(TagView {
            type_id: header.type_id,
            payload_size: header.payload_size,
            start: header.start,
            end: header.end,
            window_start: self.window_start,
            payload,
        })
    }
}

impl<'a> Iterator for TagIter<'a> {
    type Item = TagView<'a>;

    fn next(&mut self) -> Option<TagView<'a>> {
        self.next_tag().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TagLedger;

    fn ledger_with_ranges(ranges: &[(u32, u32)]) -> TagLedger {
        let mut ledger = TagLedger::new();
        for (i, &(start, end)) in ranges.iter().enumerate() {
            ledger
                .append(i as u32, 0, start, end)
                .expect("append in test");
        }
        ledger
    }

    #[test]
    fn test_window_filter() {
        let ledger = ledger_with_ranges(&[(0, 10), (20, 30), (40, 50)]);
        let yielded: Vec<(u32, u32)> = ledger.begin(15, 45).map(|t| (t.start, t.end)).collect();
        assert_eq!(yielded, vec![(20, 30), (40, 50)]);
    }

    #[test]
    fn test_boundary_touching_record_included() {
        let ledger = ledger_with_ranges(&[(10, 20)]);
        assert_eq!(ledger.begin(20, 30).count(), 1);
        assert_eq!(ledger.begin(0, 10).count(), 1);
        assert_eq!(ledger.begin(21, 30).count(), 0);
    }

    #[test]
    fn test_zero_length_record_on_window_edge() {
        let ledger = ledger_with_ranges(&[(5, 5)]);
        assert_eq!(ledger.begin(5, 10).count(), 1);
        assert_eq!(ledger.begin(0, 5).count(), 1);
        assert_eq!(ledger.begin(6, 10).count(), 0);
    }

    #[test]
    fn test_effective_start_is_clipped() {
        let ledger = ledger_with_ranges(&[(10, 30)]);
        let mut iter = ledger.begin(15, 45);
        let view = iter.next_tag().expect("one record");
        assert_eq!(view.start, 10);
        assert_eq!(view.effective_start(), 15);

        let mut iter = ledger.begin(0, 45);
        let view = iter.next_tag().expect("one record");
        assert_eq!(view.effective_start(), 10);
    }

    #[test]
    fn test_next_past_end_fails() {
        let ledger = ledger_with_ranges(&[(0, 10)]);
        let mut iter = ledger.begin(0, 100);
        assert!(iter.has_next());
        iter.next_tag().expect("first record");
        assert!(!iter.has_next());
        assert!(matches!(iter.next_tag(), Err(TagError::IteratorExhausted)));
    }

    #[test]
    fn test_empty_ledger_yields_nothing() {
        let ledger = TagLedger::new();
        let mut iter = ledger.begin(0, u32::MAX);
        assert!(!iter.has_next());
        assert!(iter.next().is_none());
    }
}
