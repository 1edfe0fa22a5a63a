//! Canonical word encoding of a leaf's field values.
//!
//! Layout is the 32-byte-word tuple encoding used by ABI tooling: one head
//! word per field, in declaration order, followed by the tails of dynamic
//! fields in the same order. A static field's head word is its padded value;
//! a dynamic field's head word is the byte offset of its tail from the start
//! of the encoding, and the tail is a length word followed by the data,
//! right-padded to a word boundary.

use crate::{EncodingError, FieldType, FieldValue, LeafEncoding};

const WORD: usize = 32;

impl LeafEncoding {
    /// Encode one leaf's values into the canonical byte string.
    ///
    /// The value count must match the declared field count, every value's
    /// kind must match its declared type, and integer and fixed-bytes values
    /// must fit their declared widths.
    pub fn encode(&self, values: &[FieldValue]) -> Result<Vec<u8>, EncodingError> {
        let fields = self.field_types();
        if values.len() != fields.len() {
            return Err(EncodingError::ArityMismatch {
                expected: fields.len(),
                got: values.len(),
            });
        }
        let head_len = WORD * fields.len();
        let mut head = Vec::with_capacity(head_len);
        let mut tail = Vec::new();
        for (index, (field, value)) in fields.iter().zip(values).enumerate() {
            match (field, value) {
                (FieldType::Address, FieldValue::Address(bytes)) => {
                    head.extend_from_slice(&[0u8; 12]);
                    head.extend_from_slice(bytes);
                }
                (FieldType::Uint(bits), FieldValue::Uint(v)) => {
                    if *bits < 128 && v >> bits != 0 {
                        return Err(EncodingError::ValueOutOfRange {
                            index,
                            detail: format!("{} does not fit uint{}", v, bits),
                        });
                    }
                    push_uint_word(&mut head, *v);
                }
                (FieldType::FixedBytes(width), FieldValue::Bytes(bytes)) => {
                    if bytes.len() != usize::from(*width) {
                        return Err(EncodingError::LengthMismatch {
                            index,
                            expected: usize::from(*width),
                            got: bytes.len(),
                        });
                    }
                    push_padded_right(&mut head, bytes);
                }
                (FieldType::Bytes, FieldValue::Bytes(bytes)) => {
                    push_uint_word(&mut head, (head_len + tail.len()) as u128);
                    push_dynamic_tail(&mut tail, bytes);
                }
                (FieldType::String, FieldValue::String(s)) => {
                    push_uint_word(&mut head, (head_len + tail.len()) as u128);
                    push_dynamic_tail(&mut tail, s.as_bytes());
                }
                (field, value) => {
                    return Err(EncodingError::TypeMismatch {
                        index,
                        expected: field.to_string(),
                        got: value.kind(),
                    });
                }
            }
        }
        head.extend_from_slice(&tail);
        Ok(head)
    }
}

/// Append a 32-byte big-endian word holding `v` left-padded with zeros.
fn push_uint_word(out: &mut Vec<u8>, v: u128) {
    out.extend_from_slice(&[0u8; 16]);
    out.extend_from_slice(&v.to_be_bytes());
}

/// Append `data` right-padded with zeros to a word boundary.
fn push_padded_right(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(data);
    let rem = data.len() % WORD;
    if rem != 0 {
        out.extend_from_slice(&vec![0u8; WORD - rem]);
    }
}

/// Append a dynamic tail: length word, then right-padded data.
fn push_dynamic_tail(out: &mut Vec<u8>, data: &[u8]) {
    push_uint_word(out, data.len() as u128);
    push_padded_right(out, data);
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn encoding(tags: &[&str]) -> LeafEncoding {
        LeafEncoding::parse(tags).unwrap()
    }

    #[test]
    fn address_uint_pair_matches_reference_layout() {
        let enc = encoding(&["address", "uint256"]);
        let bytes = enc
            .encode(&[FieldValue::Address([0x11; 20]), FieldValue::Uint(100)])
            .unwrap();
        assert_eq!(
            hex::encode(&bytes),
            "0000000000000000000000001111111111111111111111111111111111111111\
             0000000000000000000000000000000000000000000000000000000000000064"
        );
    }

    #[test]
    fn dynamic_bytes_use_head_tail_form() {
        let enc = encoding(&["bytes"]);
        let bytes = enc.encode(&[FieldValue::Bytes(b"a".to_vec())]).unwrap();
        assert_eq!(
            hex::encode(&bytes),
            "0000000000000000000000000000000000000000000000000000000000000020\
             0000000000000000000000000000000000000000000000000000000000000001\
             6100000000000000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn empty_dynamic_bytes_have_no_data_words() {
        let enc = encoding(&["bytes"]);
        let bytes = enc.encode(&[FieldValue::Bytes(Vec::new())]).unwrap();
        assert_eq!(bytes.len(), 2 * WORD);
        assert_eq!(
            hex::encode(&bytes),
            "0000000000000000000000000000000000000000000000000000000000000020\
             0000000000000000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn two_dynamic_fields_get_consecutive_tails() {
        let enc = encoding(&["bytes", "bytes"]);
        let bytes = enc
            .encode(&[
                FieldValue::Bytes(b"a".to_vec()),
                FieldValue::Bytes(b"bc".to_vec()),
            ])
            .unwrap();
        assert_eq!(
            hex::encode(&bytes),
            "0000000000000000000000000000000000000000000000000000000000000040\
             0000000000000000000000000000000000000000000000000000000000000080\
             0000000000000000000000000000000000000000000000000000000000000001\
             6100000000000000000000000000000000000000000000000000000000000000\
             0000000000000000000000000000000000000000000000000000000000000002\
             6263000000000000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn string_content_encodes_like_its_bytes() {
        let as_string = encoding(&["string"])
            .encode(&[FieldValue::String("abc".to_string())])
            .unwrap();
        let as_bytes = encoding(&["bytes"])
            .encode(&[FieldValue::Bytes(b"abc".to_vec())])
            .unwrap();
        assert_eq!(as_string, as_bytes);
    }

    #[test]
    fn fixed_bytes_pad_on_the_right() {
        let enc = encoding(&["bytes4"]);
        let bytes = enc
            .encode(&[FieldValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef])])
            .unwrap();
        assert_eq!(
            hex::encode(&bytes),
            "deadbeef00000000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn mixed_static_and_dynamic_offsets() {
        // Offsets count from the start of the whole encoding, so the single
        // dynamic tail starts after three head words.
        let enc = encoding(&["uint8", "bytes", "address"]);
        let bytes = enc
            .encode(&[
                FieldValue::Uint(7),
                FieldValue::Bytes(b"xy".to_vec()),
                FieldValue::Address([0x22; 20]),
            ])
            .unwrap();
        assert_eq!(
            hex::encode(&bytes),
            "0000000000000000000000000000000000000000000000000000000000000007\
             0000000000000000000000000000000000000000000000000000000000000060\
             0000000000000000000000002222222222222222222222222222222222222222\
             0000000000000000000000000000000000000000000000000000000000000002\
             7879000000000000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn encoding_is_deterministic() {
        let enc = encoding(&["address", "uint256", "bytes"]);
        let values = [
            FieldValue::Address([0xab; 20]),
            FieldValue::Uint(123_456_789),
            FieldValue::Bytes(vec![1, 2, 3, 4, 5]),
        ];
        assert_eq!(enc.encode(&values).unwrap(), enc.encode(&values).unwrap());
    }

    #[test]
    fn arity_mismatch_rejected() {
        let enc = encoding(&["address", "uint256"]);
        assert_matches!(
            enc.encode(&[FieldValue::Uint(1)]),
            Err(EncodingError::ArityMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn type_mismatch_rejected() {
        let enc = encoding(&["address"]);
        assert_matches!(
            enc.encode(&[FieldValue::Uint(1)]),
            Err(EncodingError::TypeMismatch { index: 0, .. })
        );
        let enc = encoding(&["string"]);
        assert_matches!(
            enc.encode(&[FieldValue::Bytes(b"abc".to_vec())]),
            Err(EncodingError::TypeMismatch { index: 0, .. })
        );
    }

    #[test]
    fn uint_width_enforced() {
        let enc = encoding(&["uint8"]);
        assert!(enc.encode(&[FieldValue::Uint(255)]).is_ok());
        assert_matches!(
            enc.encode(&[FieldValue::Uint(256)]),
            Err(EncodingError::ValueOutOfRange { index: 0, .. })
        );
        let enc = encoding(&["uint128"]);
        assert!(enc.encode(&[FieldValue::Uint(u128::MAX)]).is_ok());
    }

    #[test]
    fn fixed_bytes_length_enforced() {
        let enc = encoding(&["bytes4"]);
        assert_matches!(
            enc.encode(&[FieldValue::Bytes(vec![1, 2, 3])]),
            Err(EncodingError::LengthMismatch {
                index: 0,
                expected: 4,
                got: 3
            })
        );
    }
}
