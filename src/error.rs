//! # Error Types
//!
//! Error handling for the tag ledger.
//!
//! This module defines all error variants that can occur while recording or
//! reading tags, from storage allocation failures to caller precondition
//! violations.
//!
//! ## Error Categories
//! - **Storage Errors**: tag storage could not be allocated or grown
//! - **Range Errors**: a caller handed the ledger an inverted byte range
//! - **Iteration Errors**: a cursor was advanced past its last record
//! - **Payload Errors**: a tag's serialized bytes disagree with its declared size
//!
//! All errors implement `std::error::Error` for interoperability. No
//! operation retries internally; every failure propagates synchronously to
//! the immediate caller, which decides whether to abort the enclosing
//! operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// TagError is the primary error type for all ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagError {
    #[error("tag storage allocation failed ({0} bytes)")]
    OutOfMemory(usize),

    #[error("invalid tag range: start {start} is past end {end}")]
    InvalidRange { start: u32, end: u32 },

    #[error("tag iterator exhausted")]
    IteratorExhausted,

    #[error("tag payload size mismatch: declared {declared} bytes, got {actual}")]
    PayloadSize { declared: usize, actual: usize },
}

/// Type alias for Results using TagError
pub type Result<T> = std::result::Result<T, TagError>;
