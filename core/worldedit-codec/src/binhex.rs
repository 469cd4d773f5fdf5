//! BinHex encoding and lenient decoding.

use tracing::warn;

use crate::field::{FieldType, FieldValue};

/// Encodes a value to its uppercase BinHex mirror.
///
/// Strings gain a single NUL terminator. A string that already ends in NUL
/// is not terminated twice.
pub fn encode(value: &FieldValue) -> String {
    let bytes: Vec<u8> = match value {
        FieldValue::String(s) => {
            let mut b = s.as_bytes().to_vec();
            if b.last() != Some(&0) {
                b.push(0);
            }
            b
        }
        FieldValue::Int32(v) | FieldValue::Hash32(v) => v.to_le_bytes().to_vec(),
        FieldValue::Int64(v) | FieldValue::Id64(v) => v.to_le_bytes().to_vec(),
        FieldValue::Float32(v) => v.to_le_bytes().to_vec(),
        FieldValue::Vector3(v) => v.iter().flat_map(|c| c.to_le_bytes()).collect(),
        FieldValue::Boolean(v) => vec![u8::from(*v)],
    };
    hex::encode_upper(bytes)
}

/// Encodes a vector given as a component slice, padded or truncated to three.
pub fn encode_vector3(components: &[f32]) -> String {
    encode(&FieldValue::vector(components))
}

/// Decodes a BinHex mirror as the given type.
///
/// Never fails: empty or malformed input yields [`FieldType::zero`].
pub fn decode(ty: FieldType, text: &str) -> FieldValue {
    let text = text.trim();
    let bytes = match hex::decode(text) {
        Ok(b) => b,
        Err(e) => {
            warn!(field_type = %ty, error = %e, "malformed BinHex, using zero value");
            return ty.zero();
        }
    };

    if let Some(len) = ty.byte_len()
        && bytes.len() != len
    {
        if !text.is_empty() {
            warn!(
                field_type = %ty,
                expected = len,
                actual = bytes.len(),
                "BinHex length mismatch, using zero value"
            );
        }
        return ty.zero();
    }

    match ty {
        FieldType::Boolean => FieldValue::Boolean(bytes[0] != 0),
        FieldType::Int32 => FieldValue::Int32(u32::from_le_bytes(word(&bytes[0..4]))),
        FieldType::Hash32 => FieldValue::Hash32(u32::from_le_bytes(word(&bytes[0..4]))),
        FieldType::Float32 => FieldValue::Float32(f32::from_le_bytes(word(&bytes[0..4]))),
        FieldType::Int64 => FieldValue::Int64(u64::from_le_bytes(dword(&bytes))),
        FieldType::Id64 => FieldValue::Id64(u64::from_le_bytes(dword(&bytes))),
        FieldType::Vector3 => FieldValue::Vector3([
            f32::from_le_bytes(word(&bytes[0..4])),
            f32::from_le_bytes(word(&bytes[4..8])),
            f32::from_le_bytes(word(&bytes[8..12])),
        ]),
        FieldType::String => {
            let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
            FieldValue::String(String::from_utf8_lossy(&bytes[..end]).into_owned())
        }
    }
}

fn word(b: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&b[..4]);
    out
}

fn dword(b: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&b[..8]);
    out
}
