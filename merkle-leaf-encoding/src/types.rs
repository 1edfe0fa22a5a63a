use std::fmt;

use crate::EncodingError;

/// Supported field kinds for leaf encodings.
///
/// The set is closed: every variant has exactly one canonical tag form and
/// one canonical word encoding. No runtime type dispatch happens beyond this
/// enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// 20-byte account address, encoded left-padded into one word.
    Address,
    /// Unsigned integer of the given bit width (8..=256, multiple of 8),
    /// encoded big-endian left-padded into one word.
    Uint(u16),
    /// Fixed-width byte string of the given length (1..=32), encoded
    /// right-padded into one word.
    FixedBytes(u8),
    /// Variable-length byte string, encoded in head/tail form.
    Bytes,
    /// Variable-length UTF-8 string, encoded like its byte content.
    String,
}

impl FieldType {
    /// Parse a canonical tag such as `"address"`, `"uint256"`, `"bytes32"`,
    /// `"bytes"` or `"string"`.
    pub fn parse(tag: &str) -> Result<Self, EncodingError> {
        let unknown = || EncodingError::UnknownTypeTag(tag.to_string());
        match tag {
            "address" => return Ok(FieldType::Address),
            "bytes" => return Ok(FieldType::Bytes),
            "string" => return Ok(FieldType::String),
            _ => {}
        }
        if let Some(rest) = tag.strip_prefix("uint") {
            let bits: u16 = rest.parse().map_err(|_| unknown())?;
            // str::parse is lenient about leading zeros and a plus sign;
            // only the canonical rendering is a valid tag.
            if !is_valid_uint_width(bits) || format!("uint{}", bits) != tag {
                return Err(unknown());
            }
            return Ok(FieldType::Uint(bits));
        }
        if let Some(rest) = tag.strip_prefix("bytes") {
            let width: u8 = rest.parse().map_err(|_| unknown())?;
            if !is_valid_bytes_width(width) || format!("bytes{}", width) != tag {
                return Err(unknown());
            }
            return Ok(FieldType::FixedBytes(width));
        }
        Err(unknown())
    }

    pub(crate) fn validate(&self) -> Result<(), EncodingError> {
        match *self {
            FieldType::Uint(bits) if !is_valid_uint_width(bits) => Err(
                EncodingError::InvalidEncoding(format!("uint width {} is not supported", bits)),
            ),
            FieldType::FixedBytes(width) if !is_valid_bytes_width(width) => Err(
                EncodingError::InvalidEncoding(format!("bytes width {} is not supported", width)),
            ),
            _ => Ok(()),
        }
    }
}

fn is_valid_uint_width(bits: u16) -> bool {
    (8..=256).contains(&bits) && bits % 8 == 0
}

fn is_valid_bytes_width(width: u8) -> bool {
    (1..=32).contains(&width)
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FieldType::Address => write!(f, "address"),
            FieldType::Uint(bits) => write!(f, "uint{}", bits),
            FieldType::FixedBytes(width) => write!(f, "bytes{}", width),
            FieldType::Bytes => write!(f, "bytes"),
            FieldType::String => write!(f, "string"),
        }
    }
}

/// A runtime field value supplied by the caller.
///
/// Integer values are bounded by `u128`; a value needing the full 256-bit
/// range is supplied as `bytes32` content instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    /// 20-byte account address.
    Address([u8; 20]),
    /// Unsigned integer value.
    Uint(u128),
    /// Byte string, for both `bytes` and `bytesN` fields.
    Bytes(Vec<u8>),
    /// UTF-8 string.
    String(String),
}

impl FieldValue {
    /// Parse an address value from hex, with or without a `0x` prefix.
    pub fn address_from_hex(s: &str) -> Result<Self, EncodingError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)
            .map_err(|e| EncodingError::InvalidEncoding(format!("bad address hex: {}", e)))?;
        let arr: [u8; 20] = bytes.try_into().map_err(|v: Vec<u8>| {
            EncodingError::InvalidEncoding(format!("address must be 20 bytes, got {}", v.len()))
        })?;
        Ok(FieldValue::Address(arr))
    }

    /// Name of this value's kind, used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Address(_) => "address",
            FieldValue::Uint(_) => "uint",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::String(_) => "string",
        }
    }
}

/// An ordered sequence of field types describing how every leaf of one tree
/// is encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafEncoding {
    fields: Vec<FieldType>,
}

impl LeafEncoding {
    /// Build an encoding from field types. At least one field is required
    /// and every declared width must be valid.
    pub fn new(fields: Vec<FieldType>) -> Result<Self, EncodingError> {
        if fields.is_empty() {
            return Err(EncodingError::InvalidEncoding(
                "at least one field is required".to_string(),
            ));
        }
        for field in &fields {
            field.validate()?;
        }
        Ok(LeafEncoding { fields })
    }

    /// Parse an encoding from canonical tag strings, e.g.
    /// `["address", "uint256"]`.
    pub fn parse<S: AsRef<str>>(tags: &[S]) -> Result<Self, EncodingError> {
        let fields = tags
            .iter()
            .map(|tag| FieldType::parse(tag.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(fields)
    }

    /// The declared field types, in order.
    pub fn field_types(&self) -> &[FieldType] {
        &self.fields
    }

    /// Canonical tag strings, in order. Round-trips through
    /// [`parse`](Self::parse).
    pub fn type_tags(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.to_string()).collect()
    }
}
