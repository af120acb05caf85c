//! # Packed Record Codec
//!
//! Fixed binary layout for one tag record and the addressing math to step
//! from one record to the next inside a storage block.
//!
//! ## Wire Format
//! ```text
//! [TypeId(4)] [PayloadSize(4)] [Start(4)] [End(4)] [Payload(N)]
//! ```
//!
//! All header fields are unsigned 32-bit little-endian, written back-to-back
//! with no alignment padding. The layout is deliberately hand-rolled rather
//! than derived from native struct layout: two independently built producers
//! must emit byte-identical records, because ledgers are merged across
//! builds by raw byte concatenation.

/// Size in bytes of an encoded record header (4 x u32, no padding)
pub const HEADER_SIZE: usize = 16;

/// Decoded header of one packed tag record.
///
/// `start` and `end` are offsets into the virtual coordinate space of the
/// byte buffer the tags describe, not offsets into tag storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Opaque identifier of the tag's registered payload type
    pub type_id: u32,
    /// Byte length of the serialized payload following the header
    pub payload_size: u32,
    /// First tagged byte, inclusive
    pub start: u32,
    /// Last tagged byte, inclusive
    pub end: u32,
}

impl RecordHeader {
    /// Encode the four header fields at the front of `buf`.
    ///
    /// `buf` must hold at least [`HEADER_SIZE`] bytes; the `payload_size`
    /// bytes that follow the header are left for the caller to fill.
    pub fn encode(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.type_id.to_le_bytes());
        buf[4..8].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.start.to_le_bytes());
        buf[12..16].copy_from_slice(&self.end.to_le_bytes());
    }

    /// Decode one header from the front of `buf`.
    ///
    /// `buf` must hold at least [`HEADER_SIZE`] bytes.
    pub fn decode(buf: &[u8]) -> Self {
        Self {
            type_id: read_u32(buf, 0),
            payload_size: read_u32(buf, 4),
            start: read_u32(buf, 8),
            end: read_u32(buf, 12),
        }
    }

    /// Total encoded size of this record: header plus payload.
    ///
    /// Adding this to a record's offset yields the offset of the next record.
    pub fn record_len(&self) -> usize {
        HEADER_SIZE + self.payload_size as usize
    }
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(raw)
}
