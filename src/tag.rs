//! # Tag Serialization Contract
//!
//! The boundary between the ledger and the payload types it stores.
//!
//! The ledger never interprets payload bytes; a tag type writes and reads
//! its own payload into the fixed-size slice the ledger hands out. The
//! contract is deliberately slice-based rather than derive-based so a tag's
//! byte layout is fixed by its own code, matching the ledger's stable
//! cross-build record format.
//!
//! ## Usage
//! ```
//! use packet_tags::{Tag, TagError, TagLedger};
//!
//! /// Records which flow a span of payload bytes belongs to.
//! struct FlowIdTag {
//!     flow: u32,
//! }
//!
//! impl Tag for FlowIdTag {
//!     const TYPE_ID: u32 = 0x11;
//!
//!     fn serialized_size(&self) -> u32 {
//!         4
//!     }
//!
//!     fn serialize(&self, buf: &mut [u8]) {
//!         buf.copy_from_slice(&self.flow.to_le_bytes());
//!     }
//!
//!     fn deserialize(buf: &[u8]) -> Result<Self, TagError> {
//!         let raw: [u8; 4] = buf.try_into().map_err(|_| TagError::PayloadSize {
//!             declared: 4,
//!             actual: buf.len(),
//!         })?;
//!         Ok(Self {
//!             flow: u32::from_le_bytes(raw),
//!         })
//!     }
//! }
//!
//! let mut ledger = TagLedger::new();
//! ledger.append_tag(&FlowIdTag { flow: 9 }, 0, 100)?;
//!
//! let mut iter = ledger.begin(0, 100);
//! let view = iter.next_tag()?;
//! assert!(view.is::<FlowIdTag>());
//! assert_eq!(view.decode::<FlowIdTag>()?.flow, 9);
//! # Ok::<(), packet_tags::TagError>(())
//! ```

use crate::error::Result;

/// A typed payload storable in a [`TagLedger`](crate::TagLedger).
///
/// Implementations own their byte layout end to end: `serialize` must fill
/// exactly the `serialized_size` bytes it declared, and `deserialize` must
/// reconstruct the value from exactly those bytes.
pub trait Tag: Sized {
    /// Opaque identifier naming this tag type, used by consumers to dispatch
    /// on [`TagView::type_id`](crate::TagView::type_id). Must be unique
    /// within a deployment.
    const TYPE_ID: u32;

    /// Byte length of this value's serialized payload.
    fn serialized_size(&self) -> u32;

    /// Write the payload into `buf`, which is exactly
    /// [`serialized_size`](Self::serialized_size) bytes long.
    fn serialize(&self, buf: &mut [u8]);

    /// Reconstruct a value from its payload bytes.
    fn deserialize(buf: &[u8]) -> Result<Self>;
}
