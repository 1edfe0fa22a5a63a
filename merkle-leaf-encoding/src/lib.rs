//! Canonical leaf encoding for standard Merkle trees.
//!
//! A leaf is an ordered sequence of typed field values. Its encoding is the
//! 32-byte-word layout used by ABI tooling: static fields occupy one padded
//! word, dynamic fields use head/tail form (the head word holds the byte
//! offset of the tail, the tail holds a length word followed by right-padded
//! data). Two leaves with the same logical content always encode to the same
//! bytes, and an encoding is parseable only one way.
//!
//! The set of field kinds is closed: `address`, `uintN`, `bytesN`, `bytes`
//! and `string`. Tags parse from their canonical text form and display back
//! to it, so an encoding can be persisted alongside a tree and restored
//! later.

#![warn(missing_docs)]

mod encode;
mod error;
mod types;

pub use error::EncodingError;
pub use types::{FieldType, FieldValue, LeafEncoding};
