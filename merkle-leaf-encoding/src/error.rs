use thiserror::Error;

/// Errors from leaf encoding and type-tag parsing.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// A type tag string is not one of the supported canonical forms.
    #[error("unknown type tag: {0:?}")]
    UnknownTypeTag(String),
    /// An encoding was declared with no fields or with an invalid width.
    #[error("invalid leaf encoding: {0}")]
    InvalidEncoding(String),
    /// The number of values does not match the declared field count.
    #[error("arity mismatch: encoding declares {expected} fields, got {got} values")]
    ArityMismatch {
        /// Declared field count.
        expected: usize,
        /// Supplied value count.
        got: usize,
    },
    /// A value's kind does not match the declared field type at its position.
    #[error("type mismatch at field {index}: declared {expected}, got {got} value")]
    TypeMismatch {
        /// Zero-based field position.
        index: usize,
        /// Canonical tag of the declared type.
        expected: String,
        /// Kind of the supplied value.
        got: &'static str,
    },
    /// An integer value does not fit the declared width.
    #[error("value out of range at field {index}: {detail}")]
    ValueOutOfRange {
        /// Zero-based field position.
        index: usize,
        /// What overflowed and by how much.
        detail: String,
    },
    /// A fixed-width bytes value has the wrong length.
    #[error("length mismatch at field {index}: declared {expected} bytes, got {got}")]
    LengthMismatch {
        /// Zero-based field position.
        index: usize,
        /// Declared byte width.
        expected: usize,
        /// Supplied byte length.
        got: usize,
    },
}
